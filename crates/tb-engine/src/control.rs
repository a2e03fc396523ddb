//! Bounded single-producer/single-consumer control channel.
//!
//! Wraps a `ringbuf` heap ring buffer. The producer and consumer halves
//! are separate types that cannot be cloned, so exactly one thread can
//! push and exactly one can pop. Slot writes are published with release
//! ordering on the tail index and observed with acquire ordering by the
//! consumer (and vice versa for freeing slots).

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tb_ir::Command;

/// Default queue capacity (usable slots are `capacity - 1`).
pub const DEFAULT_CAPACITY: usize = 1024;

/// Producer half, owned by the control context.
pub struct ControlSender {
    producer: HeapProd<Command>,
}

/// Consumer half, owned by the audio context.
pub struct ControlReceiver {
    consumer: HeapCons<Command>,
}

/// Create a control channel with `capacity` slots, one of which is kept
/// free to distinguish full from empty.
pub fn control_channel(capacity: usize) -> (ControlSender, ControlReceiver) {
    let usable = capacity.max(2) - 1;
    let (producer, consumer) = HeapRb::<Command>::new(usable).split();
    (ControlSender { producer }, ControlReceiver { consumer })
}

impl ControlSender {
    /// Enqueue a command. Returns `false` (dropping the command) when full.
    pub fn push(&mut self, command: Command) -> bool {
        self.producer.try_push(command).is_ok()
    }

    /// Number of commands waiting to be consumed.
    pub fn pending(&self) -> usize {
        self.producer.occupied_len()
    }

    /// Whether another push would fail.
    pub fn is_full(&self) -> bool {
        self.producer.is_full()
    }
}

impl ControlReceiver {
    /// Dequeue the oldest command, or `None` when empty.
    pub fn pop(&mut self) -> Option<Command> {
        self.consumer.try_pop()
    }

    /// Discard everything currently queued, returning how many were dropped.
    pub fn discard_all(&mut self) -> usize {
        let mut dropped = 0;
        while self.consumer.try_pop().is_some() {
            dropped += 1;
        }
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}

//! Audio output backends for tonebox.

mod cpal_backend;
mod traits;

pub use cpal_backend::{render_interleaved, CpalOutput};
pub use traits::{AudioError, AudioOutput};

//! Camera → JPEG → multipart pipeline.
//!
//! Data Flow:
//! ```text
//!                      ┌─► [viewer 1: pace → next_frame → resize → encode → --frame part] ─► conn 1
//!                      │
//! FrameSource (mutex) ─┼─► [viewer 2: ...] ─► conn 2
//!                      │
//!                      └─► [viewer N: ...] ─► conn N
//! ```
//!
//! Every viewer pulls its own frames from the shared source; there is no fan-out
//! buffer, so N viewers mean N device reads per emitted frame interval.

pub mod capture;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod stream;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

//! Line transport to a CGT engine
//!
//! This crate provides:
//! - `Transport` trait: one newline-framed request/response channel
//! - `LineChannel`: framing over any async reader/writer pair
//! - `ProcessTransport`: the engine as a child process on stdio

pub mod process;
pub mod transport;

pub use process::ProcessTransport;
pub use transport::{LineChannel, Transport};

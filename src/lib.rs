//! Expose a structured logger as a plain byte sink.
//!
//! Components that only know how to write text (an `io::Write`, an
//! `AsyncWrite`, a child process pipe) can be handed an
//! [`EntryWriter`](writer::EntryWriter). Everything written to it is split
//! into lines and every line becomes one log entry.

mod error;
pub mod logging;
pub mod writer;

pub use error::{Error, Result};
pub use writer::EntryWriter;

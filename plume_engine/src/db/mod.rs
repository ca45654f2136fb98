//! # User persistence
//!
//! The user table lives in memory inside [`crate::UserStore`]; a [`UserSink`] is where it is read from at startup and
//! written back to after every change.
//!
//! * [`JsonFileSink`] keeps the table in a single JSON file, `{username: record, ...}`.
//! * [`MemorySink`] keeps it nowhere but in memory. Handy for tests, or for embedders that do not want users to
//!   outlive the process.
mod json_file;
mod memory;
pub mod traits;

pub use json_file::JsonFileSink;
pub use memory::MemorySink;
pub use traits::UserSink;

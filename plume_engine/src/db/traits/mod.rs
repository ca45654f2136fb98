//! Interface contracts for user persistence backends.
mod user_sink;

pub use user_sink::UserSink;

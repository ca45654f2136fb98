//! Helpers for driving a live Plume server over a real socket.
pub mod client;
pub mod helpers;

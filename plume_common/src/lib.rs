//! Leaf types shared by the Plume engine and server crates.
mod secret;

pub use secret::Secret;

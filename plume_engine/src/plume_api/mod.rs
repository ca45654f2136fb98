//! # Plume engine public API
//!
//! * [`auth_api`] hosts the two built-in RPCs, `signup` and `login`, which are the only way tokens get issued.
//! * [`errors`] collects the error types of the storage, registry and password layers.
pub mod auth_api;
pub mod errors;

//! # Plume server
//! This crate hosts the HTTP side of Plume. It is responsible for:
//! * Accepting `POST` requests on any path and reading the body under a size cap.
//! * Parsing the body as JSON and handing it to the [`plume_engine::Dispatcher`].
//! * Writing the dispatcher's reply back out as `application/json`.
//! * Sweeping expired session tokens in the background.
//!
//! ## Embedding
//! ```rust,ignore
//! let mut server = RpcServer::new();
//! server.add_rpc("echo", |args, _user| async move { Ok(RpcReply::ok(json!({ "result": args }))) })?;
//! let running = server.start(ServerConfig::default()).await?;
//! running.wait().await?;
//! ```
//!
//! ## Configuration
//! The binary is configured via environment variables. See [config](config/index.html) for more information.

pub mod cli;
pub mod config;
pub mod errors;
pub mod expiry_worker;
pub mod routes;
pub mod server;

pub use config::ServerConfig;
pub use errors::ServerError;
pub use server::{RpcServer, RunningServer};

#[cfg(test)]
mod endpoint_tests;

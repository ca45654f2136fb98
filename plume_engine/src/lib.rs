//! Plume Engine
//!
//! The transport-agnostic core of the Plume RPC server: everything between "here is a parsed JSON request body" and
//! "here is the status and JSON body to send back". The HTTP side lives in `plume_server`.
//!
//! The library is divided into a handful of pieces:
//! 1. User persistence ([`mod@db`]). The [`UserStore`] holds the authoritative user table in memory and writes it
//!    through to a pluggable [`UserSink`] (a JSON file by default).
//! 2. Sessions ([`TokenTable`]). Random tokens bound to a username and an issue time. Volatile by design: a restart
//!    logs everybody out.
//! 3. RPC plumbing ([`mod@rpc`]). The [`RpcRegistry`] of named handlers and the [`Dispatcher`] that validates a
//!    request, enforces the token gate and runs the handler.
//! 4. The built-in `signup` and `login` RPCs ([`AuthApi`]), backed by a pluggable [`CredentialVerifier`] (Argon2id by
//!    default).
pub mod db;
pub mod db_types;
pub mod helpers;
mod plume_api;
pub mod rpc;
mod tokens;
mod users;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use db::{JsonFileSink, MemorySink, UserSink};
pub use helpers::{Argon2Verifier, CredentialVerifier};
pub use plume_api::{
    auth_api::{AuthApi, Credentials, INVALID_CREDENTIALS, USERNAME_TAKEN, USERNAME_UNKNOWN},
    errors::{PasswordError, RpcRegistryError, UserStoreError},
};
pub use rpc::{Dispatcher, DispatchError, RpcArgs, RpcError, RpcHandler, RpcRegistry, RpcReply};
pub use tokens::TokenTable;
pub use users::UserStore;

//! # RPC plumbing
//!
//! A request names an RPC; the [`RpcRegistry`] maps that name to an [`RpcHandler`]; the [`Dispatcher`] sits in
//! between, turning a parsed request body into exactly one [`RpcReply`].
//!
//! Handlers receive the request's `args` object and, for every RPC except `signup` and `login`, the record of the
//! user the request's token was issued to. Whatever they return is the reply. A handler that wants a particular error
//! status can either return an error reply (`RpcReply::error`) or fail with an [`RpcError`] carrying a status; the
//! latter is reported as `rpc failed: <message>`.
mod dispatcher;
mod errors;
mod handler;
mod registry;
mod reply;

pub use dispatcher::{Dispatcher, PreparedCall};
pub use errors::{DispatchError, RpcError};
pub use handler::{HandlerFuture, RpcArgs, RpcHandler};
pub use registry::{canonical_rpc_name, is_auth_rpc, RpcRegistry, LOGIN, SIGNUP};
pub use reply::RpcReply;

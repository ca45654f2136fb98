use std::future::Future;

use futures::future::{FutureExt, LocalBoxFuture};
use serde_json::{Map, Value};

use crate::{
    db_types::User,
    rpc::{RpcError, RpcReply},
};

/// The `args` object of a request. Absent `args` arrive as an empty map.
pub type RpcArgs = Map<String, Value>;

/// Handler futures are polled on the HTTP worker that received the request, so they need not be `Send`.
pub type HandlerFuture = LocalBoxFuture<'static, Result<RpcReply, RpcError>>;

/// The contract every RPC implements, built-in or not.
///
/// `user` is the record of the authenticated caller, or `None` for `signup` and `login`. Returning `Ok` sends that
/// reply; returning `Err` sends `rpc failed: <message>`. Either way exactly one response goes out.
pub trait RpcHandler: Send + Sync + 'static {
    fn call(&self, args: RpcArgs, user: Option<User>) -> HandlerFuture;
}

/// Adapts a plain `Fn(args, user) -> Future` into an [`RpcHandler`].
pub(crate) struct FnHandler<F>(pub F);

impl<F, Fut> RpcHandler for FnHandler<F>
where
    F: Fn(RpcArgs, Option<User>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RpcReply, RpcError>> + 'static,
{
    fn call(&self, args: RpcArgs, user: Option<User>) -> HandlerFuture {
        (self.0)(args, user).boxed_local()
    }
}

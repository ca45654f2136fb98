use std::{any::Any, fmt::Debug, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use log::*;
use serde_json::Value;

use crate::{
    db_types::User,
    rpc::{canonical_rpc_name, is_auth_rpc, DispatchError, RpcArgs, RpcHandler, RpcRegistry, RpcReply},
    TokenTable,
    UserSink,
    UserStore,
};

/// A request that made it through the gate: the handler to run and what to run it with.
pub struct PreparedCall {
    pub rpc: String,
    pub handler: Arc<dyn RpcHandler>,
    pub args: RpcArgs,
    pub user: Option<User>,
}

impl Debug for PreparedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let user = self.user.as_ref().map(|u| u.username.as_str());
        write!(f, "PreparedCall (rpc: {}, user: {user:?})", self.rpc)
    }
}

/// Turns one parsed request body into one reply.
///
/// The gate ([`Dispatcher::prepare`]) is synchronous: the token lookup and the user lookup happen back to back with
/// no await point in between. Only the handler itself runs asynchronously.
pub struct Dispatcher<S> {
    registry: Arc<RpcRegistry>,
    users: Arc<UserStore<S>>,
    tokens: Arc<TokenTable>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self { registry: self.registry.clone(), users: self.users.clone(), tokens: self.tokens.clone() }
    }
}

impl<S: Debug> Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dispatcher ({:?}, {:?}, {} tokens)", self.registry, self.users, self.tokens.len())
    }
}

impl<S> Dispatcher<S>
where S: UserSink
{
    pub fn new(registry: Arc<RpcRegistry>, users: Arc<UserStore<S>>, tokens: Arc<TokenTable>) -> Self {
        Self { registry, users, tokens }
    }

    pub fn registry(&self) -> &RpcRegistry {
        &self.registry
    }

    pub fn users(&self) -> &Arc<UserStore<S>> {
        &self.users
    }

    pub fn tokens(&self) -> &Arc<TokenTable> {
        &self.tokens
    }

    /// Runs the full pipeline for one request. Never fails: every outcome is a reply.
    pub async fn dispatch(&self, request: Value) -> RpcReply {
        match self.prepare(request) {
            Ok(call) => invoke(call).await,
            Err(e) => {
                debug!("📨️ Request rejected: {e}");
                e.into()
            },
        }
    }

    /// Validates the request envelope, enforces the token gate and resolves the handler.
    pub fn prepare(&self, request: Value) -> Result<PreparedCall, DispatchError> {
        // A body that is valid JSON but not an object has no `rpc` field either
        let Value::Object(mut body) = request else {
            return Err(DispatchError::RpcRequired);
        };
        let rpc = match body.get("rpc") {
            Some(Value::String(s)) => canonical_rpc_name(s),
            _ => return Err(DispatchError::RpcRequired),
        };
        if rpc.is_empty() {
            return Err(DispatchError::NoRpcSpecified);
        }
        let handler = self.registry.get(&rpc).ok_or(DispatchError::RpcUnknown)?;
        let user = if is_auth_rpc(&rpc) { None } else { Some(self.authenticate(body.get("token"))?) };
        let args = match body.remove("args") {
            None => RpcArgs::new(),
            Some(Value::Object(args)) => args,
            Some(_) => return Err(DispatchError::InvalidArgs),
        };
        trace!("📨️ Dispatching '{rpc}'");
        Ok(PreparedCall { rpc, handler, args, user })
    }

    fn authenticate(&self, token: Option<&Value>) -> Result<User, DispatchError> {
        let token = token.and_then(Value::as_str).map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Err(DispatchError::TokenRequired);
        }
        let info = self.tokens.resolve(token).ok_or(DispatchError::TokenExpiredOrUnknown)?;
        self.users.lookup(&info.username).ok_or_else(|| {
            warn!("📨️ Token for '{}' outlived its user", info.username);
            DispatchError::ZombieToken
        })
    }
}

/// Runs the handler. Failures, panics included, become `rpc failed: ...` replies.
async fn invoke(call: PreparedCall) -> RpcReply {
    let PreparedCall { rpc, handler, args, user } = call;
    let outcome = AssertUnwindSafe(async move { handler.call(args, user).await }).catch_unwind().await;
    let failure = match outcome {
        Ok(Ok(reply)) => return reply,
        Ok(Err(e)) => {
            warn!("📨️ RPC '{rpc}' failed: {e}");
            DispatchError::HandlerFailed { status: e.status_code(), message: e.message }
        },
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!("📨️ RPC '{rpc}' panicked: {message}");
            DispatchError::HandlerFailed { message, status: 500 }
        },
    };
    failure.into()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

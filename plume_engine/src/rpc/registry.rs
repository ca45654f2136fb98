use std::{
    collections::{BTreeSet, HashMap},
    fmt::Debug,
    future::Future,
    sync::Arc,
};

use log::*;

use crate::{
    db_types::User,
    plume_api::errors::RpcRegistryError,
    rpc::{handler::FnHandler, RpcArgs, RpcError, RpcHandler, RpcReply},
};

pub const SIGNUP: &str = "signup";
pub const LOGIN: &str = "login";

/// RPC names are matched case-insensitively and without surrounding whitespace.
pub fn canonical_rpc_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// True only for the exact (canonical) names `signup` and `login`.
pub fn is_auth_rpc(canonical_name: &str) -> bool {
    canonical_name == SIGNUP || canonical_name == LOGIN
}

/// Name → handler table. Filled in before the server starts and read-only afterwards.
#[derive(Clone, Default)]
pub struct RpcRegistry {
    handlers: HashMap<String, Arc<dyn RpcHandler>>,
}

impl Debug for RpcRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RpcRegistry ({:?})", self.names())
    }
}

impl RpcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function or closure as a user RPC.
    ///
    /// ```rust,ignore
    /// async fn echo(args: RpcArgs, _user: Option<User>) -> Result<RpcReply, RpcError> {
    ///     Ok(RpcReply::ok(json!({ "result": args })))
    /// }
    /// registry.register("echo", echo)?;
    /// ```
    pub fn register<F, Fut>(&mut self, name: &str, handler: F) -> Result<(), RpcRegistryError>
    where
        F: Fn(RpcArgs, Option<User>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RpcReply, RpcError>> + 'static,
    {
        self.register_handler(name, Arc::new(FnHandler(handler)))
    }

    /// Registers a user RPC. Empty names and the reserved names `signup` / `login` are rejected. Registering a name
    /// twice replaces the earlier handler.
    pub fn register_handler(&mut self, name: &str, handler: Arc<dyn RpcHandler>) -> Result<(), RpcRegistryError> {
        let name = canonical_rpc_name(name);
        if name.is_empty() {
            return Err(RpcRegistryError::InvalidName);
        }
        if is_auth_rpc(&name) {
            return Err(RpcRegistryError::ReservedName(name));
        }
        if self.handlers.insert(name.clone(), handler).is_some() {
            warn!("📇️ RPC '{name}' was registered twice. The later handler wins.");
        } else {
            debug!("📇️ Registered RPC '{name}'");
        }
        Ok(())
    }

    /// Installs one of the built-in auth RPCs, bypassing the reserved-name check.
    pub(crate) fn install_builtin(&mut self, name: &'static str, handler: Arc<dyn RpcHandler>) {
        debug_assert!(is_auth_rpc(name));
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(&canonical_rpc_name(name))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RpcHandler>> {
        self.handlers.get(&canonical_rpc_name(name)).cloned()
    }

    pub fn names(&self) -> BTreeSet<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The number of RPCs other than the built-in `signup` and `login`.
    pub fn user_rpc_count(&self) -> usize {
        self.handlers.keys().filter(|name| !is_auth_rpc(name)).count()
    }
}

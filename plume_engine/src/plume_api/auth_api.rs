//! The built-in `signup` and `login` RPCs.
//!
//! These are the only RPCs reachable without a token, and the only places tokens are issued. Both reply with
//! `{"token": "<t>"}` on success (201 for signup, 200 for login).

use std::{fmt::Debug, sync::Arc};

use log::*;
use plume_common::Secret;
use serde_json::{json, Value};

use crate::{
    db_types::{CredentialPolicy, User},
    helpers::CredentialVerifier,
    plume_api::errors::{PasswordError, UserStoreError},
    rpc::{RpcArgs, RpcError, RpcHandler, RpcRegistry, RpcReply, LOGIN, SIGNUP},
    TokenTable,
    UserSink,
    UserStore,
};

pub const INVALID_CREDENTIALS: &str = "invalid credentials";
pub const USERNAME_TAKEN: &str = "username taken";
pub const USERNAME_UNKNOWN: &str = "username unknown";

/// A username/password pair pulled out of a request's `args`, both trimmed. Values that are missing or not strings
/// come through as empty.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

impl Credentials {
    pub fn from_args(args: &RpcArgs) -> Self {
        let field = |name: &str| args.get(name).and_then(Value::as_str).map(str::trim).unwrap_or_default().to_string();
        Self { username: field("username"), password: Secret::new(field("password")) }
    }
}

pub struct AuthApi<S> {
    users: Arc<UserStore<S>>,
    tokens: Arc<TokenTable>,
    verifier: Arc<dyn CredentialVerifier>,
    policy: CredentialPolicy,
}

impl<S: Debug> Debug for AuthApi<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?}, {:?})", self.users, self.policy)
    }
}

impl<S> AuthApi<S>
where S: UserSink + Send + Sync + 'static
{
    pub fn new(
        users: Arc<UserStore<S>>,
        tokens: Arc<TokenTable>,
        verifier: Arc<dyn CredentialVerifier>,
        policy: CredentialPolicy,
    ) -> Self {
        Self { users, tokens, verifier, policy }
    }

    /// Puts `signup` and `login` into `registry`.
    pub fn install(self: Arc<Self>, registry: &mut RpcRegistry) {
        registry.install_builtin(SIGNUP, Arc::new(AuthRpc { api: self.clone(), kind: AuthRpcKind::Signup }));
        registry.install_builtin(LOGIN, Arc::new(AuthRpc { api: self, kind: AuthRpcKind::Login }));
    }

    /// Creates a user from `args` and issues a token for it.
    ///
    /// Every field of `args` other than `username` and `password` is kept on the user record as-is. The password is
    /// replaced by its hash before anything is stored.
    pub async fn signup(&self, mut args: RpcArgs) -> Result<RpcReply, RpcError> {
        let Credentials { username, password } = Credentials::from_args(&args);
        if username.is_empty()
            || !self.policy.username_is_valid(&username)
            || !self.policy.password_is_valid(password.reveal())
        {
            debug!("🔐️ Signup rejected: credentials outside the configured bounds");
            return Ok(RpcReply::error(INVALID_CREDENTIALS, 401));
        }
        if self.users.exists(&username) {
            debug!("🔐️ Signup rejected: {username} already exists");
            return Ok(RpcReply::error(USERNAME_TAKEN, 409));
        }
        let hash = self.hash_password(password).await?;
        args.remove("username");
        args.remove("password");
        let user = User { username: username.clone(), password: hash, profile: args };
        match self.users.insert(user).await {
            Ok(()) => {},
            // Lost a race with a concurrent signup for the same name while hashing
            Err(UserStoreError::UsernameTaken(_)) => return Ok(RpcReply::error(USERNAME_TAKEN, 409)),
            Err(e) => return Err(e.into()),
        }
        let token = self.tokens.issue(&username);
        info!("🔐️ New user {username} signed up");
        Ok(RpcReply::json(json!({ "token": token }), 201))
    }

    /// Checks the credentials in `args` against the stored hash and issues a fresh token.
    pub async fn login(&self, args: RpcArgs) -> Result<RpcReply, RpcError> {
        let Credentials { username, password } = Credentials::from_args(&args);
        if username.is_empty() || password.reveal().is_empty() {
            return Ok(RpcReply::error(INVALID_CREDENTIALS, 401));
        }
        let Some(user) = self.users.lookup(&username) else {
            debug!("🔐️ Login for unknown user {username}");
            return Ok(RpcReply::error(USERNAME_UNKNOWN, 404));
        };
        if !self.verify_password(password, user.password).await? {
            debug!("🔐️ Login for {username} failed: wrong password");
            return Ok(RpcReply::error(INVALID_CREDENTIALS, 401));
        }
        let token = self.tokens.issue(&username);
        info!("🔐️ {username} logged in");
        Ok(RpcReply::ok(json!({ "token": token })))
    }

    async fn hash_password(&self, password: Secret<String>) -> Result<String, PasswordError> {
        let verifier = self.verifier.clone();
        tokio::task::spawn_blocking(move || verifier.hash(password.reveal()))
            .await
            .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
    }

    async fn verify_password(&self, password: Secret<String>, hash: String) -> Result<bool, PasswordError> {
        let verifier = self.verifier.clone();
        tokio::task::spawn_blocking(move || verifier.verify(password.reveal(), &hash))
            .await
            .map_err(|e| PasswordError::TaskFailed(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
enum AuthRpcKind {
    Signup,
    Login,
}

struct AuthRpc<S> {
    api: Arc<AuthApi<S>>,
    kind: AuthRpcKind,
}

impl<S> RpcHandler for AuthRpc<S>
where S: UserSink + Send + Sync + 'static
{
    fn call(&self, args: RpcArgs, _user: Option<User>) -> crate::rpc::HandlerFuture {
        let api = self.api.clone();
        let kind = self.kind;
        Box::pin(async move {
            match kind {
                AuthRpcKind::Signup => api.signup(args).await,
                AuthRpcKind::Login => api.login(args).await,
            }
        })
    }
}

use std::sync::Arc;

use argon2::Params;
use log::*;

use crate::{
    db_types::{CredentialPolicy, User, UserTable},
    Argon2Verifier,
    AuthApi,
    CredentialVerifier,
    Dispatcher,
    MemorySink,
    RpcRegistry,
    TokenTable,
    UserStore,
};

pub fn prepare_test_env() {
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}

/// Argon2id with the smallest parameters the crate accepts. Fast enough for tests; useless for anything else.
pub fn fast_verifier() -> Argon2Verifier {
    match Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None) {
        Ok(params) => Argon2Verifier::with_params(params),
        Err(e) => panic!("Minimal Argon2 parameters were rejected: {e}"),
    }
}

/// A user table holding one user per `(username, password)` pair, hashed with [`fast_verifier`].
pub fn seed_users(credentials: &[(&str, &str)]) -> UserTable {
    let verifier = fast_verifier();
    credentials
        .iter()
        .map(|(username, password)| {
            let hash = verifier.hash(password).expect("Failed to hash seed password");
            (username.to_string(), User::new(username.to_string(), hash))
        })
        .collect()
}

/// Everything a dispatcher test needs, wired together over a [`MemorySink`].
pub struct TestEngine {
    pub dispatcher: Dispatcher<MemorySink>,
    pub users: Arc<UserStore<MemorySink>>,
    pub tokens: Arc<TokenTable>,
    pub sink: MemorySink,
}

/// Builds a dispatcher with the built-in auth RPCs plus whatever `register` adds, over a store seeded with `seed`.
pub async fn test_engine<F>(seed: UserTable, register: F) -> TestEngine
where F: FnOnce(&mut RpcRegistry) {
    prepare_test_env();
    let sink = MemorySink::with_users(seed);
    let users = Arc::new(UserStore::load(sink.clone()).await.expect("Failed to load test users"));
    let tokens = Arc::new(TokenTable::new());
    let mut registry = RpcRegistry::new();
    register(&mut registry);
    let auth = AuthApi::new(users.clone(), tokens.clone(), Arc::new(fast_verifier()), CredentialPolicy::default());
    Arc::new(auth).install(&mut registry);
    let dispatcher = Dispatcher::new(Arc::new(registry), users.clone(), tokens.clone());
    TestEngine { dispatcher, users, tokens, sink }
}

use std::{future::Future, net::SocketAddr, sync::Arc};

use actix_web::{
    dev::{Server, ServerHandle},
    middleware::Logger,
    App,
    HttpServer,
};
use log::*;
use plume_engine::{
    db_types::User,
    Argon2Verifier,
    AuthApi,
    CredentialVerifier,
    Dispatcher,
    JsonFileSink,
    RpcArgs,
    RpcError,
    RpcHandler,
    RpcRegistry,
    RpcRegistryError,
    RpcReply,
    TokenTable,
    UserSink,
    UserStore,
};
use tokio::task::JoinHandle;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    routes::{configure_rpc_service, BodyLimit},
};

type SinkFactory<S> = Box<dyn FnOnce(&ServerConfig) -> S>;

/// Collects RPC handlers and the storage and hashing back ends, then starts the server.
///
/// By default users are kept in a JSON file at [`ServerConfig::users_path`] and passwords are hashed with Argon2id.
pub struct RpcServer<S = JsonFileSink> {
    registry: RpcRegistry,
    sink: SinkFactory<S>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl Default for RpcServer<JsonFileSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcServer<JsonFileSink> {
    pub fn new() -> Self {
        Self {
            registry: RpcRegistry::new(),
            sink: Box::new(|config: &ServerConfig| JsonFileSink::new(config.users_path.clone())),
            verifier: Arc::new(Argon2Verifier::default()),
        }
    }
}

impl<S> RpcServer<S>
where S: UserSink + Send + Sync + 'static
{
    /// Registers `handler` under `name`. `signup`, `login` and empty names are rejected.
    pub fn add_rpc<F, Fut>(&mut self, name: &str, handler: F) -> Result<(), RpcRegistryError>
    where
        F: Fn(RpcArgs, Option<User>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RpcReply, RpcError>> + 'static,
    {
        self.registry.register(name, handler)
    }

    pub fn add_rpc_handler(&mut self, name: &str, handler: Arc<dyn RpcHandler>) -> Result<(), RpcRegistryError> {
        self.registry.register_handler(name, handler)
    }

    /// Stores users in `sink` instead of the JSON file named in the configuration.
    pub fn with_sink<T>(self, sink: T) -> RpcServer<T>
    where T: UserSink + Send + Sync + 'static {
        RpcServer { registry: self.registry, sink: Box::new(move |_: &ServerConfig| sink), verifier: self.verifier }
    }

    pub fn with_verifier<V: CredentialVerifier>(mut self, verifier: V) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }

    /// Validates `config`, loads the user table, binds the listener and starts the token expiry worker.
    ///
    /// Must be called from within an actix runtime (e.g. `#[actix_web::main]`).
    pub async fn start(self, config: ServerConfig) -> Result<RunningServer, ServerError> {
        config.check()?;
        if self.registry.user_rpc_count() == 0 {
            return Err(ServerError::NoRpcsRegistered);
        }
        let sink = (self.sink)(&config);
        let users = Arc::new(UserStore::load(sink).await?);
        let tokens = Arc::new(TokenTable::new());
        let mut registry = self.registry;
        let auth_api = AuthApi::new(users.clone(), tokens.clone(), self.verifier, config.credential_policy());
        Arc::new(auth_api).install(&mut registry);
        info!("🚀️ Serving RPCs: {:?}", registry.names());
        let dispatcher = Dispatcher::new(Arc::new(registry), users, tokens.clone());

        let (srv, addrs) = create_server_instance(&config, dispatcher)?;
        let handle = srv.handle();
        let server = actix_web::rt::spawn(srv);
        let sweeper = start_expiry_worker(tokens, config.token_timeout, config.sweep_interval);
        info!("🚀️ Listening on {}", addr_list(&addrs));
        Ok(RunningServer { handle, server, sweeper, addrs })
    }
}

pub fn create_server_instance<S>(
    config: &ServerConfig,
    dispatcher: Dispatcher<S>,
) -> Result<(Server, Vec<SocketAddr>), ServerError>
where
    S: UserSink + Send + Sync + 'static,
{
    let limit = BodyLimit(config.max_request_body_size);
    let http = HttpServer::new(move || {
        let dispatcher = dispatcher.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("plume::access_log"))
            .configure(|cfg| configure_rpc_service(cfg, dispatcher, limit))
    })
    .bind((config.host.as_str(), config.port))?;
    let addrs = http.addrs();
    Ok((http.run(), addrs))
}

/// A started server. Dropping this does not stop it; call [`RunningServer::stop`].
pub struct RunningServer {
    handle: ServerHandle,
    server: JoinHandle<std::io::Result<()>>,
    sweeper: JoinHandle<()>,
    addrs: Vec<SocketAddr>,
}

impl RunningServer {
    /// The addresses the listener is bound to.
    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Stops accepting connections, lets in-flight requests finish and stops the expiry worker.
    pub async fn stop(self) -> Result<(), ServerError> {
        info!("🚀️ Stopping server");
        self.sweeper.abort();
        self.handle.stop(true).await;
        finish(self.server.await)
    }

    /// Runs until the server exits on its own, e.g. after a SIGINT.
    pub async fn wait(self) -> Result<(), ServerError> {
        let result = self.server.await;
        self.sweeper.abort();
        finish(result)
    }
}

fn finish(result: Result<std::io::Result<()>, tokio::task::JoinError>) -> Result<(), ServerError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ServerError::IOError(e)),
        Err(e) => Err(ServerError::Unspecified(e.to_string())),
    }
}

fn addr_list(addrs: &[SocketAddr]) -> String {
    addrs.iter().map(|a| a.to_string()).collect::<Vec<String>>().join(", ")
}

use std::{net::SocketAddr, path::Path};

use log::*;
use plume_engine::{db_types::User, test_utils::fast_verifier, RpcArgs, RpcError, RpcReply};
use plume_server::{RpcServer, RunningServer, ServerConfig, ServerError};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub async fn echo(args: RpcArgs, _user: Option<User>) -> Result<RpcReply, RpcError> {
    Ok(RpcReply::ok(json!({ "result": args })))
}

pub async fn whoami(_args: RpcArgs, user: Option<User>) -> Result<RpcReply, RpcError> {
    let user = user.ok_or_else(|| RpcError::new("no user"))?;
    Ok(RpcReply::ok(json!({ "username": user.username, "profile": user.profile })))
}

/// Starts a server on a random local port that keeps its users in `users_path`, with `echo` and `whoami` registered.
pub async fn launch_server(users_path: &Path, max_request_body_size: usize) -> Result<RunningServer, ServerError> {
    let mut server = RpcServer::new().with_verifier(fast_verifier());
    server.add_rpc("echo", echo)?;
    server.add_rpc("whoami", whoami)?;
    let config = ServerConfig {
        port: 0,
        users_path: users_path.to_path_buf(),
        max_request_body_size,
        ..Default::default()
    };
    let running = server.start(config).await?;
    info!("🧪️ Test server up on {:?}", running.addrs());
    Ok(running)
}

#[derive(Debug, Clone)]
pub struct PlumeClient {
    url: String,
    http: reqwest::Client,
}

impl PlumeClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { url: format!("http://{addr}"), http: reqwest::Client::new() }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Posts `body` to `path` and returns the status and the parsed JSON reply.
    pub async fn post(&self, path: &str, body: &Value) -> Result<(StatusCode, Value), reqwest::Error> {
        let res = self.http.post(self.url(path)).json(body).send().await?;
        let status = res.status();
        let value = res.json::<Value>().await?;
        debug!("🧪️ {path} -> {status} {value}");
        Ok((status, value))
    }

    pub async fn call(
        &self,
        rpc: &str,
        token: Option<&str>,
        args: Value,
    ) -> Result<(StatusCode, Value), reqwest::Error> {
        let mut body = json!({ "rpc": rpc, "args": args });
        if let Some(token) = token {
            body["token"] = json!(token);
        }
        self.post("/", &body).await
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<(StatusCode, Value), reqwest::Error> {
        self.call("signup", None, json!({ "username": username, "password": password })).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(StatusCode, Value), reqwest::Error> {
        self.call("login", None, json!({ "username": username, "password": password })).await
    }
}

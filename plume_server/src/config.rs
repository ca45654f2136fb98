use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use chrono::Duration;
use log::*;
use plume_engine::db_types::{
    CredentialPolicy,
    DEFAULT_MAX_PASSWORD_LENGTH,
    DEFAULT_MAX_USERNAME_LENGTH,
    DEFAULT_MIN_PASSWORD_LENGTH,
    DEFAULT_MIN_USERNAME_LENGTH,
};

use crate::errors::ServerError;

const DEFAULT_PLUME_HOST: &str = "127.0.0.1";
const DEFAULT_PLUME_PORT: u16 = 8080;
const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::minutes(15);
const DEFAULT_USERS_PATH: &str = "data/users.json";
const DEFAULT_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    /// Use port 0 to have the OS pick a free port. [`crate::RunningServer::addrs`] reports the one that was bound.
    pub port: u16,
    /// Requests with bodies larger than this are rejected with a 413 as soon as the limit is crossed.
    pub max_request_body_size: usize,
    pub min_username_length: usize,
    pub max_username_length: usize,
    pub min_password_length: usize,
    pub max_password_length: usize,
    /// How long a token stays valid after it was issued. Using a token does not extend its life.
    pub token_timeout: Duration,
    /// The JSON file holding the user table. Created (along with its parent directory) on the first signup.
    pub users_path: PathBuf,
    /// How often the expiry worker looks for expired tokens.
    pub sweep_interval: std::time::Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PLUME_HOST.to_string(),
            port: DEFAULT_PLUME_PORT,
            max_request_body_size: DEFAULT_MAX_REQUEST_BODY_SIZE,
            min_username_length: DEFAULT_MIN_USERNAME_LENGTH,
            max_username_length: DEFAULT_MAX_USERNAME_LENGTH,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            max_password_length: DEFAULT_MAX_PASSWORD_LENGTH,
            token_timeout: DEFAULT_TOKEN_TIMEOUT,
            users_path: PathBuf::from(DEFAULT_USERS_PATH),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let host = env::var("PLUME_HOST").ok().unwrap_or_else(|| DEFAULT_PLUME_HOST.into());
        let port = env_or_default("PLUME_PORT", defaults.port);
        let max_request_body_size = env_or_default("PLUME_MAX_REQUEST_BODY_SIZE", defaults.max_request_body_size);
        let min_username_length = env_or_default("PLUME_MIN_USERNAME_LENGTH", defaults.min_username_length);
        let max_username_length = env_or_default("PLUME_MAX_USERNAME_LENGTH", defaults.max_username_length);
        let min_password_length = env_or_default("PLUME_MIN_PASSWORD_LENGTH", defaults.min_password_length);
        let max_password_length = env_or_default("PLUME_MAX_PASSWORD_LENGTH", defaults.max_password_length);
        let token_timeout =
            token_timeout_from_minutes(env_or_default("PLUME_TOKEN_TIMEOUT", DEFAULT_TOKEN_TIMEOUT.num_minutes()));
        let users_path = env::var("PLUME_USERS_PATH").map(PathBuf::from).unwrap_or_else(|_| {
            info!("🪛️ PLUME_USERS_PATH is not set. Users will be stored in {DEFAULT_USERS_PATH}.");
            defaults.users_path.clone()
        });
        Self {
            host,
            port,
            max_request_body_size,
            min_username_length,
            max_username_length,
            min_password_length,
            max_password_length,
            token_timeout,
            users_path,
            ..defaults
        }
    }

    pub fn credential_policy(&self) -> CredentialPolicy {
        CredentialPolicy {
            min_username_length: self.min_username_length,
            max_username_length: self.max_username_length,
            min_password_length: self.min_password_length,
            max_password_length: self.max_password_length,
        }
    }

    /// Rejects configurations the server cannot run with.
    pub fn check(&self) -> Result<(), ServerError> {
        self.credential_policy().check().map_err(ServerError::ConfigurationError)?;
        if self.token_timeout <= Duration::zero() {
            return Err(ServerError::ConfigurationError("The token timeout must be positive".into()));
        }
        if self.sweep_interval.is_zero() {
            return Err(ServerError::ConfigurationError("The token sweep interval must be positive".into()));
        }
        if self.max_request_body_size == 0 {
            return Err(ServerError::ConfigurationError("The maximum request body size must be positive".into()));
        }
        Ok(())
    }
}

fn token_timeout_from_minutes(minutes: i64) -> Duration {
    Duration::try_minutes(minutes).unwrap_or_else(|| {
        warn!(
            "🪛️ {minutes} minutes is out of range for PLUME_TOKEN_TIMEOUT. Using the default, {}, instead.",
            DEFAULT_TOKEN_TIMEOUT.num_minutes()
        );
        DEFAULT_TOKEN_TIMEOUT
    })
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

//--------------------------------------        User         ---------------------------------------------------------
/// A user record as it is held in memory and persisted to the user file.
///
/// `password` is always the verifier's opaque hash, never plaintext. Any extra fields supplied with the signup
/// request are kept in `profile` and written back out verbatim, next to `username` and `password`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl User {
    pub fn new<S: Into<String>>(username: S, password_hash: S) -> Self {
        Self { username: username.into(), password: password_hash.into(), profile: Map::new() }
    }

    pub fn with_profile(mut self, profile: Map<String, Value>) -> Self {
        self.profile = profile;
        self
    }
}

/// The full user table, keyed by username. A `BTreeMap` keeps the persisted file stable between writes.
pub type UserTable = BTreeMap<String, User>;

//--------------------------------------      TokenInfo      ---------------------------------------------------------
/// What the token table remembers about an issued token. Never modified after issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub username: String,
    pub issued_at: DateTime<Utc>,
}

impl TokenInfo {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.issued_at >= ttl
    }
}

//--------------------------------------   CredentialPolicy  ---------------------------------------------------------
pub const DEFAULT_MIN_USERNAME_LENGTH: usize = 3;
pub const DEFAULT_MAX_USERNAME_LENGTH: usize = 32;
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 3;
pub const DEFAULT_MAX_PASSWORD_LENGTH: usize = 128;

/// Length bounds applied to trimmed usernames and passwords at signup. Lengths are counted in characters. An empty
/// username is never valid, whatever the bounds say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPolicy {
    pub min_username_length: usize,
    pub max_username_length: usize,
    pub min_password_length: usize,
    pub max_password_length: usize,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            min_username_length: DEFAULT_MIN_USERNAME_LENGTH,
            max_username_length: DEFAULT_MAX_USERNAME_LENGTH,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            max_password_length: DEFAULT_MAX_PASSWORD_LENGTH,
        }
    }
}

impl CredentialPolicy {
    pub fn username_is_valid(&self, username: &str) -> bool {
        let len = username.chars().count();
        len > 0 && len >= self.min_username_length && len <= self.max_username_length
    }

    pub fn password_is_valid(&self, password: &str) -> bool {
        let len = password.chars().count();
        len >= self.min_password_length && len <= self.max_password_length
    }

    /// Returns a description of the first inconsistency in the bounds, if any.
    pub fn check(&self) -> Result<(), String> {
        if self.min_username_length == 0 {
            return Err("the minimum username length must be at least 1".to_string());
        }
        if self.min_username_length > self.max_username_length {
            return Err(format!(
                "minimum username length ({}) exceeds the maximum ({})",
                self.min_username_length, self.max_username_length
            ));
        }
        if self.min_password_length > self.max_password_length {
            return Err(format!(
                "minimum password length ({}) exceeds the maximum ({})",
                self.min_password_length, self.max_password_length
            ));
        }
        Ok(())
    }
}

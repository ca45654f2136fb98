use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("username taken")]
    UsernameTaken(String),
    #[error("Expected the users path to be a file: {0}")]
    NotAFile(PathBuf),
    #[error("Could not access the user file. {0}")]
    Io(#[from] io::Error),
    #[error("The user file is not a valid JSON object of user records. {0}")]
    Deserialization(String),
    #[error("Could not serialize the user table. {0}")]
    Serialization(String),
    #[error("Invalid user record for '{0}'. {1}")]
    InvalidRecord(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcRegistryError {
    #[error("invalid rpc name")]
    InvalidName,
    #[error("invalid rpc name: '{0}' is reserved")]
    ReservedName(String),
}

#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Could not hash password. {0}")]
    HashingFailed(String),
    #[error("The password hashing task did not complete. {0}")]
    TaskFailed(String),
}

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use plume_engine::{RpcRegistryError, UserStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("POST only")]
    PostOnly,
    #[error("request too large")]
    RequestTooLarge,
    /// The body could not be read, was not UTF-8, or was not JSON. Carries the underlying message as-is.
    #[error("{0}")]
    InvalidRequestBody(String),
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("No RPCs have been registered. Add at least one with `add_rpc` before starting the server.")]
    NoRpcsRegistered,
    #[error("Could not load the user table. {0}")]
    UserStoreError(#[from] UserStoreError),
    #[error("Could not register RPC. {0}")]
    RegistryError(#[from] RpcRegistryError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::PostOnly => StatusCode::METHOD_NOT_ALLOWED,
            Self::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRpcsRegistered => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UserStoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RegistryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

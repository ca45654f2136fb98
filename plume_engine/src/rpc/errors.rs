use thiserror::Error;

use crate::{
    plume_api::errors::{PasswordError, UserStoreError},
    rpc::RpcReply,
};

/// The failure a handler raises when it cannot produce a reply, sent as `rpc failed: <message>`.
///
/// `status` lets the handler pick the HTTP status, but only error statuses are honoured: a status outside 400..=599,
/// or no status at all, is sent as 500. Handlers that want a non-error status should return an [`RpcReply`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RpcError {
    pub message: String,
    pub status: Option<u16>,
}

impl RpcError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into(), status: None }
    }

    pub fn with_status<S: Into<String>>(message: S, status: u16) -> Self {
        Self { message: message.into(), status: Some(status) }
    }

    pub fn status_code(&self) -> u16 {
        match self.status {
            Some(s) if (400..=599).contains(&s) => s,
            _ => 500,
        }
    }
}

impl From<UserStoreError> for RpcError {
    fn from(e: UserStoreError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<PasswordError> for RpcError {
    fn from(e: PasswordError) -> Self {
        Self::new(e.to_string())
    }
}

/// Every way the dispatcher can turn a request away, plus the wrapper for failed handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("rpc required")]
    RpcRequired,
    #[error("no rpc specified")]
    NoRpcSpecified,
    #[error("rpc unknown")]
    RpcUnknown,
    #[error("token required")]
    TokenRequired,
    #[error("token expired or unknown")]
    TokenExpiredOrUnknown,
    #[error("invalid token: zombie")]
    ZombieToken,
    #[error("invalid \"args\" -- object required")]
    InvalidArgs,
    #[error("rpc failed: {message}")]
    HandlerFailed { message: String, status: u16 },
}

impl DispatchError {
    /// `rpc required` and `no rpc specified` map to 401, not 400.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RpcRequired | Self::NoRpcSpecified => 401,
            Self::RpcUnknown => 404,
            Self::TokenRequired | Self::TokenExpiredOrUnknown | Self::ZombieToken => 401,
            Self::InvalidArgs => 400,
            Self::HandlerFailed { status, .. } => *status,
        }
    }
}

impl From<DispatchError> for RpcReply {
    fn from(e: DispatchError) -> Self {
        RpcReply::error(&e, e.status_code())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn handler_status_is_clamped() {
        assert_eq!(RpcError::new("boom").status_code(), 500);
        assert_eq!(RpcError::with_status("teapot", 418).status_code(), 418);
        assert_eq!(RpcError::with_status("weird", 42).status_code(), 500);
        assert_eq!(RpcError::with_status("redirect", 302).status_code(), 500);
    }

    #[test]
    fn dispatch_errors_render_as_error_replies() {
        let reply = RpcReply::from(DispatchError::InvalidArgs);
        assert_eq!(reply.status, 400);
        assert_eq!(reply.error_message(), Some(r#"invalid "args" -- object required"#));
        let reply = RpcReply::from(DispatchError::HandlerFailed { message: "boom".into(), status: 503 });
        assert_eq!(reply.status, 503);
        assert_eq!(reply.error_message(), Some("rpc failed: boom"));
    }
}

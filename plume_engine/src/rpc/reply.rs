use std::fmt::Display;

use serde_json::{json, Map, Value};

/// What a handler (or the dispatcher itself) sends back: a status code and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    pub status: u16,
    pub body: Value,
}

impl RpcReply {
    /// A `null` body is sent as `{}`.
    pub fn json(body: Value, status: u16) -> Self {
        let body = if body.is_null() { Value::Object(Map::new()) } else { body };
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::json(body, 200)
    }

    pub fn error<S: Display>(message: S, status: u16) -> Self {
        Self { status, body: json!({ "error": message.to_string() }) }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

impl Default for RpcReply {
    fn default() -> Self {
        Self::ok(Value::Null)
    }
}

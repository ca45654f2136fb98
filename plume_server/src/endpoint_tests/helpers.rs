use actix_web::{
    body::{BodySize, MessageBody},
    http::{header, StatusCode},
    test,
    test::TestRequest,
    App,
};
use log::debug;
use plume_engine::{db_types::User, Dispatcher, MemorySink, RpcArgs, RpcError, RpcReply};
use serde_json::{json, Value};

use crate::routes::{configure_rpc_service, BodyLimit};

pub const TEST_BODY_LIMIT: usize = 1024;

pub async fn echo(args: RpcArgs, _user: Option<User>) -> Result<RpcReply, RpcError> {
    Ok(RpcReply::ok(json!({ "result": args })))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body_size: BodySize,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {}", self.body))
    }
}

pub async fn send(dispatcher: &Dispatcher<MemorySink>, limit: usize, req: TestRequest) -> TestResponse {
    let dispatcher = dispatcher.clone();
    let app = App::new().configure(|cfg| configure_rpc_service(cfg, dispatcher, BodyLimit(limit)));
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let content_type = res.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(String::from);
    let body = res.into_body();
    let body_size = body.size();
    let body = String::from_utf8_lossy(&body.try_into_bytes().unwrap()).into_owned();
    TestResponse { status, content_type, body_size, body }
}

pub async fn post_json(dispatcher: &Dispatcher<MemorySink>, path: &str, body: Value) -> TestResponse {
    let req = TestRequest::post().uri(path).insert_header(header::ContentType::json()).set_payload(body.to_string());
    send(dispatcher, TEST_BODY_LIMIT, req).await
}

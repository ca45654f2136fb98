use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use actix_web::{body::BodySize, http::StatusCode, test::TestRequest};
use plume_engine::{
    test_utils::{seed_users, test_engine, TestEngine},
    RpcError,
    RpcReply,
};
use serde_json::json;

use super::helpers::*;

async fn engine_with_counter() -> (TestEngine, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let engine = test_engine(seed_users(&[("bob", "hunter2")]), move |registry| {
        registry.register("echo", echo).unwrap();
        registry
            .register("count", move |_, _| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, RpcError>(RpcReply::ok(json!({})))
                }
            })
            .unwrap();
    })
    .await;
    (engine, hits)
}

#[actix_web::test]
async fn signup_and_echo_on_any_path() {
    let (engine, _) = engine_with_counter().await;
    let res = post_json(
        &engine.dispatcher,
        "/",
        json!({"rpc": "signup", "args": {"username": "alice", "password": "s3cret"}}),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let token = res.json()["token"].as_str().unwrap().to_string();

    let body = json!({"rpc": "echo", "token": token, "args": {"x": 1}});
    let res = post_json(&engine.dispatcher, "/any/path/at/all", body).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"result": {"x": 1}}));
}

#[actix_web::test]
async fn replies_are_json_with_a_known_length() {
    let (engine, _) = engine_with_counter().await;
    let res = post_json(&engine.dispatcher, "/", json!({"rpc": "login", "args": {"username": "bob", "password": "x"}}))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.content_type.as_deref(), Some("application/json"));
    assert_eq!(res.body_size, BodySize::Sized(res.body.len() as u64));
    assert_eq!(res.json(), json!({"error": "invalid credentials"}));
}

#[actix_web::test]
async fn only_post_is_accepted() {
    let (engine, hits) = engine_with_counter().await;
    for req in [TestRequest::get(), TestRequest::put(), TestRequest::delete()] {
        let res = send(&engine.dispatcher, TEST_BODY_LIMIT, req.uri("/").set_payload(r#"{"rpc":"count"}"#)).await;
        assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.json(), json!({"error": "POST only"}));
        assert_eq!(res.content_type.as_deref(), Some("application/json"));
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn oversized_bodies_are_rejected() {
    let (engine, hits) = engine_with_counter().await;
    let token = engine.tokens.issue("bob");
    let body = json!({"rpc": "count", "token": token}).to_string();

    let req = TestRequest::post().uri("/").set_payload(body.clone());
    let res = send(&engine.dispatcher, body.len() - 1, req).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json(), json!({"error": "request too large"}));
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    // Exactly at the limit is fine
    let req = TestRequest::post().uri("/").set_payload(body.clone());
    let res = send(&engine.dispatcher, body.len(), req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn malformed_bodies() {
    let (engine, hits) = engine_with_counter().await;
    let res = send(&engine.dispatcher, TEST_BODY_LIMIT, TestRequest::post().set_payload("{not json")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let message = res.json()["error"].as_str().unwrap().to_string();
    assert!(message.contains("line 1"), "was: {message}");

    let res = send(&engine.dispatcher, TEST_BODY_LIMIT, TestRequest::post().set_payload(vec![b'"', 0xff, b'"'])).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["error"].as_str().unwrap().contains("utf-8"), "was: {}", res.body);

    let res = send(&engine.dispatcher, TEST_BODY_LIMIT, TestRequest::post()).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn gate_errors_over_http() {
    let (engine, hits) = engine_with_counter().await;
    let res = post_json(&engine.dispatcher, "/", json!({"args": {}})).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json(), json!({"error": "rpc required"}));

    let res = post_json(&engine.dispatcher, "/", json!({"rpc": "count"})).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json(), json!({"error": "token required"}));

    let res = post_json(&engine.dispatcher, "/", json!({"rpc": "count", "token": "made up nonsense"})).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json(), json!({"error": "token expired or unknown"}));

    let res = post_json(&engine.dispatcher, "/", json!({"rpc": "nope"})).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

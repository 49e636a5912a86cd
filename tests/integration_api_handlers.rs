// Integration tests for API handlers - real HTTP tests through the router

#[path = "common/mod.rs"]
mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use whisper_inbox::api::create_router;
use whisper_inbox::auth::audit_logger::AuditLogger;
use whisper_inbox::auth::auth_middleware::AuthState;
use whisper_inbox::config::Config;
use whisper_inbox::core::models::UserId;
use whisper_inbox::state::UserDirectory;

use common::*;

fn router_for(h: &TestHarness) -> Router {
    let auth_state = Arc::new(AuthState {
        gateway_key_hash: h.app_state.config.gateway_key_hash.clone(),
        audit_logger: Arc::new(AuditLogger::new(None)),
    });
    create_router(&h.app_state, auth_state).with_state(h.app_state.clone())
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn owner_request(method: &str, uri: &str, user_id: UserId, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-User-Id", user_id.to_string());
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint_returns_200() {
    let h = harness();
    let response = router_for(&h)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["store"], "connected");
}

#[tokio::test]
async fn test_sign_up_returns_201_with_user_id() {
    let h = harness();
    let response = router_for(&h)
        .oneshot(json_request(
            "POST",
            "/api/sign-up",
            serde_json::json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let user_id: UserId = body["userId"].as_str().unwrap().parse().unwrap();
    assert!(h.store.find_by_id(user_id).await.unwrap().is_some());
    assert!(h.mailer.last_code_for("alice").is_some());
}

#[tokio::test]
async fn test_sign_up_conflict_returns_409() {
    let h = harness();
    register_verified(&h, "alice").await;

    let response = router_for(&h)
        .oneshot(json_request(
            "POST",
            "/api/sign-up",
            serde_json::json!({
                "username": "alice",
                "email": "new@example.com",
                "password": TEST_PASSWORD,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Username is already taken");
    assert!(body.get("requestId").is_some());
}

#[tokio::test]
async fn test_verify_code_error_statuses() {
    let h = harness();
    insert_pending_user(&h.store, "fresh", "123456", in_an_hour()).await;
    insert_pending_user(&h.store, "stale", "123456", an_hour_ago()).await;
    let app = router_for(&h);

    let cases = [
        ("fresh", "000000", StatusCode::BAD_REQUEST),
        ("stale", "123456", StatusCode::BAD_REQUEST),
        ("ghost", "123456", StatusCode::NOT_FOUND),
        ("fresh", "123456", StatusCode::OK),
        ("fresh", "000000", StatusCode::OK),
    ];
    for (username, code, expected) in cases {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/verify-code",
                serde_json::json!({ "username": username, "code": code }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "{} / {}", username, code);
    }
}

#[tokio::test]
async fn test_expired_code_message_tells_user_to_sign_up_again() {
    let h = harness();
    insert_pending_user(&h.store, "stale", "123456", an_hour_ago()).await;

    let response = router_for(&h)
        .oneshot(json_request(
            "POST",
            "/api/verify-code",
            serde_json::json!({ "username": "stale", "code": "123456" }),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("sign up again"));
}

#[tokio::test]
async fn test_owner_routes_require_user_id() {
    let h = harness();
    let app = router_for(&h);

    for (method, uri) in [
        ("GET", "/api/accept-messages"),
        ("GET", "/api/get-messages"),
        ("DELETE", "/api/delete-message/3f1c2a9e-8d7b-4c6a-9e5f-0a1b2c3d4e5f"),
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_malformed_user_id_is_unauthorized() {
    let h = harness();
    let response = router_for(&h)
        .oneshot(
            Request::builder()
                .uri("/api/get-messages")
                .header("X-User-Id", "not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gateway_key_enforced_when_configured() {
    let mut config = Config::test_config();
    config.gateway_key_hash = Some(Config::hash_key("gateway-secret"));
    let h = harness_with_config(config);
    let alice = register_verified(&h, "alice").await;
    let app = router_for(&h);

    let without_key = app
        .clone()
        .oneshot(owner_request("GET", "/api/accept-messages", alice, None))
        .await
        .unwrap();
    assert_eq!(without_key.status(), StatusCode::UNAUTHORIZED);

    let mut wrong_key = owner_request("GET", "/api/accept-messages", alice, None);
    wrong_key
        .headers_mut()
        .insert("X-Gateway-Key", "guess".parse().unwrap());
    let response = app.clone().oneshot(wrong_key).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut right_key = owner_request("GET", "/api/accept-messages", alice, None);
    right_key
        .headers_mut()
        .insert("X-Gateway-Key", "gateway-secret".parse().unwrap());
    let response = app.oneshot(right_key).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_accept_messages_toggle_over_http() {
    let h = harness();
    let alice = register_verified(&h, "alice").await;
    let app = router_for(&h);

    let response = app
        .clone()
        .oneshot(owner_request(
            "POST",
            "/api/accept-messages",
            alice,
            Some(serde_json::json!({ "acceptMessages": false })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["isAcceptingMessage"], false);

    let response = app
        .clone()
        .oneshot(owner_request("GET", "/api/accept-messages", alice, None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["isAcceptingMessage"], false);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/send-message",
            serde_json::json!({ "username": "alice", "content": "hi" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_accept_flag_for_unknown_owner_is_404() {
    let h = harness();
    let response = router_for(&h)
        .oneshot(owner_request("GET", "/api/accept-messages", UserId::generate(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_send_message_statuses() {
    let h = harness();
    register_verified(&h, "alice").await;
    insert_pending_user(&h.store, "pending", "123456", in_an_hour()).await;
    let app = router_for(&h);

    let cases = [
        ("alice", "hello", StatusCode::CREATED),
        ("pending", "hello", StatusCode::FORBIDDEN),
        ("ghost", "hello", StatusCode::NOT_FOUND),
        ("alice", "   ", StatusCode::BAD_REQUEST),
    ];
    for (username, content, expected) in cases {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/send-message",
                serde_json::json!({ "username": username, "content": content }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "{}", username);
    }
}

#[tokio::test]
async fn test_get_and_delete_messages_over_http() {
    let h = harness();
    let alice = register_verified(&h, "alice").await;
    let bob = register_verified(&h, "bob").await;
    let message_id = h.app_state.inbox_gate.submit("alice", "secret").await.unwrap();
    let app = router_for(&h);

    let response = app
        .clone()
        .oneshot(owner_request("GET", "/api/get-messages", alice, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["messages"][0]["content"], "secret");
    assert_eq!(body["messages"][0]["id"], message_id.to_string());
    assert!(body["messages"][0].get("createdAt").is_some());

    let delete_uri = format!("/api/delete-message/{}", message_id);

    let response = app
        .clone()
        .oneshot(owner_request("DELETE", &delete_uri, bob, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(owner_request("DELETE", &delete_uri, alice, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(owner_request("DELETE", "/api/delete-message/nope", alice, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_in_over_http() {
    let h = harness();
    let alice = register_verified(&h, "alice").await;
    let app = router_for(&h);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/sign-in",
            serde_json::json!({ "identifier": "alice@example.com", "password": TEST_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["userId"], alice.to_string());
    assert_eq!(body["isVerified"], true);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/sign-in",
            serde_json::json!({ "identifier": "alice", "password": "wrong password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_check_username_unique() {
    let h = harness();
    register_verified(&h, "alice").await;
    let app = router_for(&h);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/check-username-unique?username=alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["available"], false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/check-username-unique?username=carol")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["available"], true);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let h = harness();
    let response = router_for(&h)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/send-message")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_wrongly_typed_field_uses_error_body() {
    let h = harness();
    let alice = register_verified(&h, "alice").await;
    let response = router_for(&h)
        .oneshot(owner_request(
            "POST",
            "/api/accept-messages",
            alice,
            Some(serde_json::json!({ "acceptMessages": "yes" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn test_missing_body_field_uses_error_body() {
    let h = harness();
    let response = router_for(&h)
        .oneshot(json_request(
            "POST",
            "/api/send-message",
            serde_json::json!({ "username": "alice" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_missing_query_parameter_uses_error_body() {
    let h = harness();
    let response = router_for(&h)
        .oneshot(
            Request::builder()
                .uri("/api/check-username-unique")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let h = harness();
    let response = router_for(&h)
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_count_operations() {
    let h = harness();
    let app = router_for(&h);

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/send-message",
            serde_json::json!({ "username": "ghost", "content": "hi" }),
        ))
        .await
        .unwrap();

    assert_eq!(h.app_state.metrics.count("submit_message", "user_not_found"), 1);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("inbox_operations_total"));
}

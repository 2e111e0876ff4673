//! Integration tests for authentication and the global unauthorized path.
//!
//! These run the real HTTP client against the fake backend so bearer
//! headers, persistence and 401 handling are observed on the wire.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use scuffmart_client::{ApiError, App, ClientConfig, Route};
use scuffmart_core::{Email, ProductId, User};
use scuffmart_integration_tests::{
    FakeBackend, line_json, product_json, temp_storage, user_json,
};
use secrecy::SecretString;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn login(backend: &FakeBackend, app: &App) {
    backend.ok(
        Method::POST,
        "auth/login",
        &json!({ "user": user_json(1, "Ana", "client"), "token": "tok-1" }),
    );
    app.auth
        .login(
            &Email::parse("ana@example.com").unwrap(),
            &SecretString::from("hunter2"),
        )
        .await
        .unwrap();
}

// =============================================================================
// Bearer Token Tests
// =============================================================================

#[tokio::test]
async fn test_anonymous_requests_carry_no_token() {
    let backend = FakeBackend::start().await.unwrap();
    backend.ok(Method::GET, "products", &json!([product_json(1, "Lamp", "10.00", 3)]));
    let app = backend.app("anon").unwrap();

    let products = app.api.products().await.unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(
        products[0].image_path().as_deref(),
        Some("/1.jpg"),
        "uploads prefix is rewritten"
    );
    assert_eq!(backend.requests()[0].authorization, None);
}

#[tokio::test]
async fn test_login_sends_credentials_and_token_follows() {
    let backend = FakeBackend::start().await.unwrap();
    let app = backend.app("bearer").unwrap();
    login(&backend, &app).await;
    backend.ok(Method::GET, "cart", &json!([]));

    app.cart.refresh_cart().await.unwrap();

    let requests = backend.requests();
    assert_eq!(
        requests[0].json(),
        json!({ "email": "ana@example.com", "password": "hunter2" })
    );
    assert_eq!(requests[1].path, "cart");
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer tok-1"));
}

#[tokio::test]
async fn test_session_survives_restart() {
    let backend = FakeBackend::start().await.unwrap();
    let storage = temp_storage("restart");
    let first = App::new(backend.config(&storage).unwrap()).unwrap();
    login(&backend, &first).await;

    let second = App::new(backend.config(&storage).unwrap()).unwrap();

    assert!(second.session.is_authenticated());
    assert_eq!(second.session.user().unwrap().name, "Ana");
}

#[tokio::test]
async fn test_rejected_login_keeps_server_message() {
    let backend = FakeBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "auth/register",
        StatusCode::BAD_REQUEST,
        &json!({ "message": "Email already registered" }),
    );
    let app = backend.app("register-dup").unwrap();

    let err = app
        .auth
        .register(
            "Ana",
            &Email::parse("ana@example.com").unwrap(),
            &SecretString::from("pw"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.user_message("Registration failed"), "Email already registered");
    assert!(!app.session.is_authenticated());
}

// =============================================================================
// Unauthorized Handling Tests
// =============================================================================

#[tokio::test]
async fn test_unauthorized_clears_session_and_redirects() {
    let backend = FakeBackend::start().await.unwrap();
    let storage = temp_storage("expired");
    let app = App::new(backend.config(&storage).unwrap()).unwrap();
    login(&backend, &app).await;
    backend.ok(Method::GET, "cart", &json!([line_json(3, 2, "4.00", "C")]));
    app.cart.refresh_cart().await.unwrap();
    assert_eq!(app.cart.cart_count(), 2);
    backend.respond(
        Method::POST,
        "cart/add",
        StatusCode::UNAUTHORIZED,
        &json!({ "message": "Token expired" }),
    );

    let err = app.cart.add_to_cart(ProductId::new(7), 1).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!app.session.is_authenticated());
    assert_eq!(app.navigator.current(), Route::Login);
    assert_eq!(backend.request_lines().last().unwrap(), "POST cart/add");
    assert!(app.cart.items().is_empty(), "cart emptied with the session");
    assert_eq!(app.cart.cart_count(), 0);

    let reopened = App::new(backend.config(&storage).unwrap()).unwrap();
    assert!(!reopened.session.is_authenticated(), "storage was cleared");
}

#[tokio::test]
async fn test_unauthorized_with_truncated_body_still_clears_session() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0_u8; 4096];
        let _ = socket.read(&mut request).await;
        // Promise a longer body than is sent, then hang up.
        let _ = socket
            .write_all(
                b"HTTP/1.1 401 Unauthorized\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"mess",
            )
            .await;
        let _ = socket.shutdown().await;
    });
    let storage = temp_storage("truncated-401");
    let config = ClientConfig::for_api(&format!("http://{addr}/api"), &storage).unwrap();
    let app = App::new(config).unwrap();
    let user: User = serde_json::from_value(user_json(1, "Ana", "client")).unwrap();
    app.session.establish(user, SecretString::from("tok-1"));

    let err = app.cart.refresh_cart().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!app.session.is_authenticated());
    assert_eq!(app.navigator.current(), Route::Login);
}

#[tokio::test]
async fn test_refresh_profile_uses_me_endpoint() {
    let backend = FakeBackend::start().await.unwrap();
    let app = backend.app("me").unwrap();
    login(&backend, &app).await;
    backend.ok(
        Method::GET,
        "auth/me",
        &json!({ "user": user_json(1, "Ana", "admin") }),
    );

    app.auth.refresh_profile().await.unwrap();

    assert!(app.session.is_admin());
    assert_eq!(
        backend.requests()[1].authorization.as_deref(),
        Some("Bearer tok-1")
    );
}

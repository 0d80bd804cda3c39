#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use stratus::config::Config;
use stratus::router::{StratusState, stratus_router};
use tower::ServiceExt;
use url::Url;

/// Router over a fresh in-memory database. `provider` points the weather client at a
/// fake upstream.
pub async fn app(provider: Option<&str>) -> Router {
    let mut cfg = Config::default();
    cfg.jwt.secret = "integration-secret".to_string();
    cfg.openweather.api_key = "test-key".to_string();
    cfg.openweather.requests_per_minute = 0;
    if let Some(uri) = provider {
        cfg.openweather.base_url = Url::parse(uri).expect("mock server uri");
    }

    let pool = stratus::db::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    let state = StratusState::new(pool, &cfg).expect("state");
    stratus_router(state)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let resp = app.clone().oneshot(request).await.expect("response");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

/// Register a user and return a bearer token for it.
pub async fn register_and_login(app: &Router, username: &str, role: Option<&str>) -> String {
    let mut body = serde_json::json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "hunter22",
    });
    if let Some(role) = role {
        body["role"] = Value::String(role.to_string());
    }
    let (status, _) = send(app, "POST", "/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, login) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({"usernameOrEmail": username, "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    login["token"].as_str().expect("token").to_string()
}

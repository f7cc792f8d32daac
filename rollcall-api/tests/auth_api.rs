// Copyright 2026 S4Core Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Authentication API Integration Tests
//!
//! Drives the router in-process and verifies:
//! - Registration, JSON login and the OAuth2 form login
//! - 401 responses carry `WWW-Authenticate: Bearer`
//! - Admin-only user management
//! - Deactivated accounts lose access

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rollcall_api::{create_router, AppState};
use rollcall_core::SqliteRepository;
use rollcall_features::JwtManager;
use serde_json::{json, Value};
use tower::ServiceExt;

const PASSWORD: &str = "Corr3ct!Horse";

fn create_test_state() -> AppState {
    let repo = SqliteRepository::open_in_memory().expect("Failed to open repository");
    AppState::new(
        Arc::new(repo),
        JwtManager::new("auth-api-test-secret", chrono::Duration::minutes(30)),
    )
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, json)
}

async fn register_teacher(app: &Router, username: &str) -> Value {
    let (status, _, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": format!("{}@school.test", username),
            "username": username,
            "password": PASSWORD,
            "first_name": "Tess",
            "last_name": "Teacher",
            "role": "teacher",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    body
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    (status, body)
}

async fn token_for(app: &Router, username: &str) -> String {
    let (status, body) = login(app, username, PASSWORD).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["access_token"].as_str().unwrap().to_string()
}

async fn admin_token(state: &AppState, app: &Router) -> String {
    state
        .auth_service
        .ensure_admin("admin", "admin@school.test", PASSWORD)
        .await
        .expect("Failed to bootstrap admin");
    token_for(app, "admin").await
}

#[tokio::test]
async fn test_public_banner_and_health() {
    let app = create_router(create_test_state());

    let (status, _, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "School Attendance API");

    let (status, _, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_unavailable_without_recorder() {
    let app = create_router(create_test_state());
    let (status, _, _) = send(&app, Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = create_router(create_test_state());

    let user = register_teacher(&app, "tess").await;
    assert_eq!(user["role"], "teacher");
    assert!(user.get("password_hash").is_none());

    let (status, body) = login(&app, "tess", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["username"], "tess");

    let token = body["access_token"].as_str().unwrap();
    let (status, _, me) = send(&app, Method::GET, "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "tess@school.test");
}

#[tokio::test]
async fn test_token_endpoint_accepts_form_body() {
    let app = create_router(create_test_state());
    register_teacher(&app, "tess").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username=tess&password={}", "Corr3ct%21Horse")))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["access_token"].as_str().is_some());
}

#[tokio::test]
async fn test_update_profile() {
    let app = create_router(create_test_state());
    register_teacher(&app, "tess").await;
    let token = token_for(&app, "tess").await;

    let (status, _, body) = send(
        &app,
        Method::PUT,
        "/api/auth/me",
        Some(&token),
        Some(json!({ "first_name": "Theresa" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Theresa");
    assert_eq!(body["last_name"], "Teacher");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized_with_challenge() {
    let app = create_router(create_test_state());

    let (status, headers, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(body["detail"], "Not authenticated");
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = create_router(create_test_state());

    let (status, headers, body) =
        send(&app, Method::GET, "/api/classes", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(body["detail"], "Could not validate credentials");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = create_router(create_test_state());
    register_teacher(&app, "tess").await;

    let (status, body) = login(&app, "tess", "Wr0ng!Password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect username or password");

    let (status, body) = login(&app, "nobody", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect username or password");
}

#[tokio::test]
async fn test_weak_password_reports_strength_header() {
    let app = create_router(create_test_state());

    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "weak@school.test",
            "username": "weak",
            "password": "abcdefgh",
            "first_name": "Weak",
            "last_name": "Password",
            "role": "teacher",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(headers.contains_key("x-password-strength"));
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn test_student_registration_requires_class() {
    let app = create_router(create_test_state());

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "sam@school.test",
            "username": "sam",
            "password": PASSWORD,
            "first_name": "Sam",
            "last_name": "Student",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let app = create_router(create_test_state());
    register_teacher(&app, "tess").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "other@school.test",
            "username": "tess",
            "password": PASSWORD,
            "first_name": "Other",
            "last_name": "Teacher",
            "role": "teacher",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn test_list_users_requires_admin() {
    let state = create_test_state();
    let app = create_router(state.clone());
    register_teacher(&app, "tess").await;
    let teacher = token_for(&app, "tess").await;
    let admin = admin_token(&state, &app).await;

    let (status, _, body) = send(&app, Method::GET, "/api/auth/users", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Requires admin role");

    let (status, _, body) = send(&app, Method::GET, "/api/auth/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_deactivated_account_loses_access() {
    let state = create_test_state();
    let app = create_router(state.clone());
    let tess = register_teacher(&app, "tess").await;
    let teacher = token_for(&app, "tess").await;
    let admin = admin_token(&state, &app).await;

    let uri = format!("/api/auth/users/{}/deactivate", tess["id"]);
    let (status, _, body) = send(&app, Method::PUT, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deactivated successfully");

    // Previously issued tokens stop working
    let (status, _, body) = send(&app, Method::GET, "/api/auth/me", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Inactive user");

    let (status, body) = login(&app, "tess", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Inactive user");
}

#[tokio::test]
async fn test_deactivate_unknown_user_not_found() {
    let state = create_test_state();
    let app = create_router(state.clone());
    let admin = admin_token(&state, &app).await;

    let (status, _, _) =
        send(&app, Method::PUT, "/api/auth/users/999/deactivate", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

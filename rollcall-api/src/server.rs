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

//! Axum HTTP server setup and routing.
//!
//! Public routes (banner, health, metrics, registration and login) are
//! merged with bearer-protected routers nested under `/api`.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{HeaderName, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rollcall_core::Repository;
use rollcall_features::{AttendanceService, AuthService, ClassService, JwtManager, StudentService};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::PASSWORD_STRENGTH_HEADER;
use crate::handlers;
use crate::middleware::{
    allowed_hosts_middleware, bearer_auth_middleware, logging_middleware, metrics_middleware,
    AllowedHosts, REQUEST_ID_HEADER,
};

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and token verification.
    pub auth_service: Arc<AuthService>,
    pub class_service: Arc<ClassService>,
    pub student_service: Arc<StudentService>,
    /// Recording, corrections and reports.
    pub attendance_service: Arc<AttendanceService>,
    /// Accepted `Host` header values.
    pub allowed_hosts: Arc<AllowedHosts>,
    /// Prometheus metrics handle for rendering `/metrics` endpoint.
    pub prometheus_handle: Option<PrometheusHandle>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates the state with every service sharing `repo`.
    ///
    /// Any `Host` header is accepted until [`AppState::with_allowed_hosts`]
    /// narrows it.
    pub fn new(repo: Arc<dyn Repository>, jwt_manager: JwtManager) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(repo.clone(), jwt_manager)),
            class_service: Arc::new(ClassService::new(repo.clone())),
            student_service: Arc::new(StudentService::new(repo.clone())),
            attendance_service: Arc::new(AttendanceService::new(repo)),
            allowed_hosts: Arc::new(AllowedHosts::Any),
            prometheus_handle: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_allowed_hosts(mut self, allowed_hosts: AllowedHosts) -> Self {
        self.allowed_hosts = Arc::new(allowed_hosts);
        self
    }

    /// Sets the Prometheus handle for rendering metrics.
    pub fn with_prometheus_handle(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus_handle = Some(handle);
        self
    }
}

fn class_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::classes::list_classes).post(handlers::classes::create_class),
        )
        .route(
            "/:id",
            get(handlers::classes::get_class)
                .put(handlers::classes::update_class)
                .delete(handlers::classes::delete_class),
        )
}

fn student_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::students::list_students).post(handlers::students::create_student),
        )
        .route(
            "/without-account",
            get(handlers::students::students_without_account),
        )
        .route(
            "/:id",
            get(handlers::students::get_student)
                .put(handlers::students::update_student)
                .delete(handlers::students::delete_student),
        )
        .route(
            "/:id/link/:user_id",
            put(handlers::students::link_student_user),
        )
}

fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::attendance::list_attendance)
                .post(handlers::attendance::create_attendance),
        )
        .route("/bulk", post(handlers::attendance::create_bulk_attendance))
        .route("/:id", put(handlers::attendance::update_attendance))
        .route(
            "/class/:class_id/date/:date",
            get(handlers::attendance::class_sheet),
        )
        .route(
            "/class/:class_id/date/:date/stats",
            get(handlers::attendance::daily_stats),
        )
        .route(
            "/student/:id/history",
            get(handlers::attendance::student_history),
        )
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/monthly", get(handlers::reports::monthly_report))
        .route(
            "/student/:id/summary",
            get(handlers::reports::student_summary),
        )
}

/// Creates the Axum router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS for the browser frontend
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any)
        .expose_headers([
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(PASSWORD_STRENGTH_HEADER),
        ]);

    let auth_public_router = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/token", post(handlers::auth::token));

    let auth_protected_router = Router::new()
        .route(
            "/me",
            get(handlers::auth::me).put(handlers::auth::update_me),
        )
        .route("/users", get(handlers::auth::list_users))
        .route(
            "/users/:id/deactivate",
            put(handlers::auth::deactivate_user),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_middleware,
        ));

    // Everything below requires a valid bearer token
    let protected_router = Router::new()
        .nest("/students", student_routes())
        .nest("/classes", class_routes())
        .nest("/stages", class_routes())
        .nest("/attendance", attendance_routes())
        .nest("/reports", report_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_middleware,
        ));

    let api_router = Router::new()
        .nest(
            "/auth",
            Router::new()
                .merge(auth_public_router)
                .merge(auth_protected_router),
        )
        .merge(protected_router);

    Router::new()
        .route("/", get(handlers::stats::root))
        .route("/health", get(handlers::stats::health))
        .route("/metrics", get(handlers::stats::prometheus_metrics))
        .nest("/api", api_router)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            allowed_hosts_middleware,
        ))
        // Record request count and latency
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        // Outermost so preflight requests are answered before host checks
        .layer(cors)
        .with_state(state)
}

//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every request, including the fallback, passes through the access gate
//! before a handler runs. Pages live at `/login` and `/dashboard`; the board
//! JSON endpoints sit under `/dashboard` so the gate protects them too.
//! Sign-in endpoints are unclassified paths and always reachable.

pub mod auth;
pub mod board;
pub mod gate;
pub mod pages;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/login", get(pages::login_page))
        .route("/dashboard", get(pages::dashboard_page))
        .route("/dashboard/views/{view_id}", get(board::get_view))
        .route("/dashboard/views/{view_id}/columns/{column_id}/tasks", post(board::add_task))
        .route("/api/auth/session", post(auth::create_session))
        .route("/api/auth/email", post(auth::email_sign_in))
        .route("/api/auth/anonymous", post(auth::anonymous_sign_in))
        .route("/api/auth/passkey", post(auth::passkey_sign_in))
        .route("/api/auth/phone/send-code", post(auth::send_phone_code))
        .route("/api/auth/phone/verify", post(auth::verify_phone_code))
        .route("/api/auth/logout", post(auth::logout))
        .route("/auth/{provider}", get(auth::redirect_start))
        .route("/auth/{provider}/callback", get(auth::redirect_callback))
        .route("/healthz", get(healthz))
        .fallback(not_found)
        .layer(middleware::from_fn(gate::access_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> impl IntoResponse {
    ApiError::new(StatusCode::NOT_FOUND, "E_NOT_FOUND", "no such route")
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

//! Access gate middleware.
//!
//! Runs before routing decisions reach a handler: reads the session cookie,
//! asks [`access::decide`], and either forwards the request or answers with a
//! temporary redirect.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::services::access::{self, Decision};
use crate::services::session;

pub async fn access_gate(jar: CookieJar, request: Request, next: Next) -> Response {
    let has_session = session::has_session(&jar);
    let path = request.uri().path();

    match access::decide(has_session, path) {
        Decision::Pass => next.run(request).await,
        Decision::RedirectTo(target) => {
            debug!(path, target, has_session, "access gate redirect");
            Redirect::temporary(target).into_response()
        }
    }
}

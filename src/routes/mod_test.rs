use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::*;
use crate::routes::auth::{SendCodeResponse, SignInResponse};
use crate::services::identity::ProviderError;
use crate::state::test_helpers::{MockIdentity, seed_view, test_app_state, test_app_state_with};

const SESSION: &str = "firebase-session=test-id-token";

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, cookie: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn location<B>(response: &Response<B>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn set_cookies<B>(response: &Response<B>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_owned)
        .collect()
}

async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// ACCESS GATE
// =============================================================================

#[tokio::test]
async fn root_redirects_by_session() {
    let response = app(test_app_state()).oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");

    let response = app(test_app_state()).oneshot(get("/", Some(SESSION))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn login_with_session_redirects_to_dashboard() {
    let response = app(test_app_state()).oneshot(get("/login", Some(SESSION))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn login_without_session_renders_page() {
    let response = app(test_app_state()).oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response.into_body()).await;
    assert!(html.contains("/auth/google"));
}

#[tokio::test]
async fn protected_paths_require_session() {
    for path in ["/dashboard", "/dashboard/42", "/dashboardx"] {
        let response = app(test_app_state()).oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response), "/login", "{path}");
    }
}

#[tokio::test]
async fn empty_session_cookie_counts_as_signed_out() {
    let response = app(test_app_state())
        .oneshot(get("/dashboard", Some("firebase-session=")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn unclassified_paths_pass_through() {
    let response = app(test_app_state()).oneshot(get("/healthz", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(test_app_state()).oneshot(get("/nope", Some(SESSION))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(response.into_body()).await;
    assert_eq!(body["code"], "E_NOT_FOUND");
}

// =============================================================================
// SESSION
// =============================================================================

#[tokio::test]
async fn create_session_sets_cookie() {
    let request = post_json("/api/auth/session", None, &serde_json::json!({ "id_token": "abc" }));
    let response = app(test_app_state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    let cookie = &cookies[0];
    assert!(cookie.starts_with("firebase-session=abc"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=432000"));
}

#[tokio::test]
async fn create_session_rejects_blank_token() {
    let request = post_json("/api/auth/session", None, &serde_json::json!({ "id_token": "  " }));
    let response = app(test_app_state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn logout_clears_cookie_and_navigates_to_login() {
    for cookie in [Some(SESSION), None] {
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .header(header::COOKIE, cookie.unwrap_or("other=1"))
            .body(Body::empty())
            .unwrap();
        let response = app(test_app_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("firebase-session="));
        assert!(cookies[0].contains("Max-Age=0"));
    }
}

// =============================================================================
// SIGN-IN METHODS
// =============================================================================

#[tokio::test]
async fn email_sign_in_sets_session_and_returns_redirect() {
    let mock = Arc::new(MockIdentity::ok("email-token"));
    let request = post_json(
        "/api/auth/email",
        None,
        &serde_json::json!({ "email": "a@b.co", "password": "secret1" }),
    );
    let response = app(test_app_state_with(mock.clone())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response)[0].starts_with("firebase-session=email-token"));

    let body: SignInResponse = body_json(response.into_body()).await;
    assert_eq!(body.redirect, "/dashboard");
    assert_eq!(mock.calls(), vec!["email"]);
}

#[tokio::test]
async fn email_validation_fails_before_provider_call() {
    let mock = Arc::new(MockIdentity::ok("unused"));
    let request = post_json(
        "/api/auth/email",
        None,
        &serde_json::json!({ "email": "not-an-email", "password": "secret1" }),
    );
    let response = app(test_app_state_with(mock.clone())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(response.into_body()).await;
    assert_eq!(body["code"], "E_VALIDATION");
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn provider_failure_sets_no_cookie() {
    let mock = Arc::new(MockIdentity::failing(ProviderError::InvalidCredential));
    let request = post_json(
        "/api/auth/email",
        None,
        &serde_json::json!({ "email": "a@b.co", "password": "wrong-pass" }),
    );
    let response = app(test_app_state_with(mock)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());

    let body: serde_json::Value = body_json(response.into_body()).await;
    assert_eq!(body["code"], "E_INVALID_CREDENTIAL");
    assert_eq!(body["message"], "Invalid credentials. Please check your email and password.");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn anonymous_sign_in_succeeds() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/anonymous")
        .body(Body::empty())
        .unwrap();
    let response = app(test_app_state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response)[0].starts_with(SESSION));
}

#[tokio::test]
async fn passkey_unconfigured_is_service_unavailable() {
    let mock = Arc::new(MockIdentity::failing(ProviderError::Unconfigured("passkey")));
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/passkey")
        .body(Body::empty())
        .unwrap();
    let response = app(test_app_state_with(mock)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn phone_flow_sends_code_then_verifies() {
    let state = test_app_state();

    let request = post_json(
        "/api/auth/phone/send-code",
        None,
        &serde_json::json!({ "phone": "+15555550100", "recaptcha_token": "rc" }),
    );
    let response = app(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sent: SendCodeResponse = body_json(response.into_body()).await;
    assert_eq!(sent.verification_id, "verification-1");

    let request = post_json(
        "/api/auth/phone/verify",
        None,
        &serde_json::json!({ "verification_id": sent.verification_id, "code": "123456" }),
    );
    let response = app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response)[0].starts_with(SESSION));
}

#[tokio::test]
async fn short_phone_number_is_rejected() {
    let request = post_json(
        "/api/auth/phone/send-code",
        None,
        &serde_json::json!({ "phone": "12345", "recaptcha_token": "rc" }),
    );
    let response = app(test_app_state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// REDIRECT SIGN-IN
// =============================================================================

#[tokio::test]
async fn redirect_start_sets_auth_session_cookie() {
    let response = app(test_app_state()).oneshot(get("/auth/google", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(location(&response).starts_with("https://idp.example.com/authorize"));
    assert!(location(&response).ends_with("/auth/google/callback"));

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("auth_session=idp-session-1"));
}

#[tokio::test]
async fn redirect_start_unknown_provider_is_not_found() {
    let response = app(test_app_state()).oneshot(get("/auth/myspace", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(response.into_body()).await;
    assert_eq!(body["code"], "E_UNKNOWN_PROVIDER");
}

#[tokio::test]
async fn callback_with_provider_error_returns_to_login() {
    let response = app(test_app_state())
        .oneshot(get("/auth/google/callback?error=access_denied", Some("auth_session=idp-session-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?error=popup-closed-by-user");

    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("auth_session=") && c.contains("Max-Age=0")));
    assert!(!cookies.iter().any(|c| c.starts_with("firebase-session=")));
}

#[tokio::test]
async fn callback_error_codes_cannot_shape_the_login_redirect() {
    for query in ["error=x%26y%3Dz", "error=a%0Ab", "error=%3Cscript%3E"] {
        let response = app(test_app_state())
            .oneshot(get(&format!("/auth/google/callback?{query}"), Some("auth_session=idp-session-1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{query}");
        assert_eq!(location(&response), "/login?error=internal-error", "{query}");
    }
}

#[tokio::test]
async fn callback_without_auth_session_fails() {
    let response = app(test_app_state())
        .oneshot(get("/auth/fusionauth/callback?code=x", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?error=missing-or-invalid-nonce");
}

#[tokio::test]
async fn callback_success_establishes_session() {
    let mock = Arc::new(MockIdentity::ok("idp-token"));
    let response = app(test_app_state_with(mock.clone()))
        .oneshot(get("/auth/fusionauth/callback?code=x&state=y", Some("auth_session=idp-session-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");

    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("firebase-session=idp-token")));
    assert!(cookies.iter().any(|c| c.starts_with("auth_session=") && c.contains("Max-Age=0")));
    assert_eq!(mock.calls(), vec!["fusionauth"]);
}

// =============================================================================
// BOARD
// =============================================================================

#[tokio::test]
async fn dashboard_opens_a_fresh_view_per_render() {
    let state = test_app_state();
    for _ in 0..2 {
        let response = app(state.clone()).oneshot(get("/dashboard", Some(SESSION))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response.into_body()).await;
        assert!(html.contains("Setup Firebase Auth"));
    }
    assert_eq!(state.views.read().await.len(), 2);
}

#[tokio::test]
async fn board_endpoints_add_and_read_tasks() {
    let state = test_app_state();
    let view_id = seed_view(&state).await;

    let request = post_json(
        &format!("/dashboard/views/{view_id}/columns/backlog/tasks"),
        Some(SESSION),
        &serde_json::json!({ "title": "  Write docs ", "description": "" }),
    );
    let response = app(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let task: serde_json::Value = body_json(response.into_body()).await;
    assert_eq!(task["title"], "Write docs");
    assert!(task["description"].is_null());

    let response = app(state)
        .oneshot(get(&format!("/dashboard/views/{view_id}"), Some(SESSION)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let board: serde_json::Value = body_json(response.into_body()).await;
    let backlog = &board["columns"][0];
    assert_eq!(backlog["id"], "backlog");
    assert_eq!(backlog["tasks"].as_array().unwrap().last().unwrap()["id"], task["id"]);
}

#[tokio::test]
async fn board_errors_map_to_statuses() {
    let state = test_app_state();
    let view_id = seed_view(&state).await;

    let cases = [
        (format!("/dashboard/views/{view_id}/columns/archive/tasks"), "x", StatusCode::NOT_FOUND),
        (format!("/dashboard/views/{view_id}/columns/backlog/tasks"), "   ", StatusCode::UNPROCESSABLE_ENTITY),
        (format!("/dashboard/views/{}/columns/backlog/tasks", uuid::Uuid::new_v4()), "x", StatusCode::NOT_FOUND),
    ];
    for (uri, title, status) in cases {
        let request = post_json(&uri, Some(SESSION), &serde_json::json!({ "title": title }));
        let response = app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), status, "{uri}");
    }

    let long_title = "x".repeat(crate::services::board::MAX_TITLE_CHARS + 1);
    let request = post_json(
        &format!("/dashboard/views/{view_id}/columns/backlog/tasks"),
        Some(SESSION),
        &serde_json::json!({ "title": long_title }),
    );
    let response = app(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(response.into_body()).await;
    assert_eq!(body["code"], "E_TOO_LONG");

    let board = crate::services::views::snapshot(&state, view_id).await.unwrap();
    assert_eq!(board.column("backlog").unwrap().tasks.len(), 2);
}

#[tokio::test]
async fn board_endpoints_redirect_without_session() {
    let state = test_app_state();
    let view_id = seed_view(&state).await;

    let request = post_json(
        &format!("/dashboard/views/{view_id}/columns/backlog/tasks"),
        None,
        &serde_json::json!({ "title": "sneaky" }),
    );
    let response = app(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");

    let board = crate::services::views::snapshot(&state, view_id).await.unwrap();
    assert_eq!(board.column("backlog").unwrap().tasks.len(), 2);
}

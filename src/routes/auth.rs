//! Auth routes — sign-in methods, redirect flow, session cookie, logout.

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::{error, info, warn};

use crate::error::{ApiError, ErrorCode};
use crate::services::access::{DASHBOARD_PATH, LOGIN_PATH};
use crate::services::identity::{Credentials, OAuthProvider, ProviderError};
use crate::services::session::{self, IdentityToken, ResponseCookies, StorageError};
use crate::state::AppState;

/// Holds the provider `sessionId` between redirect start and callback.
const AUTH_SESSION_COOKIE: &str = "auth_session";

const MIN_PASSWORD_LEN: usize = 6;
const MIN_PHONE_LEN: usize = 10;

// =============================================================================
// BODIES
// =============================================================================

#[derive(Deserialize)]
pub struct SessionBody {
    id_token: String,
}

#[derive(Deserialize)]
pub struct EmailBody {
    email: String,
    password: String,
    #[serde(default)]
    sign_up: bool,
}

#[derive(Deserialize)]
pub struct PhoneBody {
    phone: String,
    recaptcha_token: String,
}

#[derive(Deserialize)]
pub struct VerifyBody {
    verification_id: String,
    code: String,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignInResponse {
    pub redirect: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendCodeResponse {
    pub verification_id: String,
}

// =============================================================================
// VALIDATION
// =============================================================================

fn validation_error(message: &str) -> ApiError {
    ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "E_VALIDATION", message)
}

/// `local@domain`, both parts non-empty, exactly one `@`.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let mut parts = email.split('@');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    )
}

fn validate_email_body(body: &EmailBody) -> Result<(), ApiError> {
    if !is_valid_email(&body.email) {
        return Err(validation_error("Invalid email address."));
    }
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(validation_error("Password must be at least 6 characters."));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ApiError> {
    if phone.trim().chars().count() < MIN_PHONE_LEN {
        return Err(validation_error("Please enter a valid phone number with country code."));
    }
    Ok(())
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

pub(crate) fn provider_error_status(err: &ProviderError) -> StatusCode {
    match err {
        ProviderError::InvalidCredential
        | ProviderError::PopupClosed
        | ProviderError::InvalidVerificationCode
        | ProviderError::Other(_) => StatusCode::UNAUTHORIZED,
        ProviderError::EmailAlreadyInUse => StatusCode::CONFLICT,
        ProviderError::Unconfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        ProviderError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        ProviderError::Network(_) => StatusCode::BAD_GATEWAY,
    }
}

fn provider_error_response(err: &ProviderError) -> Response {
    ApiError::from_err(provider_error_status(err), err)
        .with_message(err.user_message())
        .into_response()
}

fn storage_error_response(err: &StorageError) -> Response {
    ApiError::from_err(StatusCode::INTERNAL_SERVER_ERROR, err)
        .with_message("Could not create session.")
        .into_response()
}

fn login_with_error(err: &ProviderError) -> Redirect {
    Redirect::to(&format!("{LOGIN_PATH}?error={}", err.slug()))
}

// =============================================================================
// SESSION HELPERS
// =============================================================================

/// Establish the session on `jar` and hand it back for the response.
fn start_session(state: &AppState, jar: CookieJar, token: &IdentityToken) -> Result<CookieJar, StorageError> {
    let secure = state.config.cookie_secure;
    let mut cookies = ResponseCookies::new(jar, secure);
    session::establish(&mut cookies, token, secure)?;
    cookies.finish()
}

fn auth_session_cookie(session_id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::minutes(10))
        .build()
}

/// Authenticate with `credentials`, then set the session cookie.
///
/// The cookie write must succeed before the client is told to continue to
/// the dashboard.
async fn complete_sign_in(state: &AppState, jar: CookieJar, credentials: Credentials) -> Response {
    let method = credentials.method();
    let token = match state.identity.authenticate(credentials).await {
        Ok(token) => token,
        Err(e) => {
            warn!(method, error = %e, code = e.error_code(), "sign-in failed");
            return provider_error_response(&e);
        }
    };

    match start_session(state, jar, &token) {
        Ok(jar) => {
            info!(method, "signed in");
            (jar, Json(SignInResponse { redirect: DASHBOARD_PATH.to_owned() })).into_response()
        }
        Err(e) => {
            error!(method, error = %e, "session creation failed");
            storage_error_response(&e)
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/session`: store a token obtained by a client-side sign-in.
pub async fn create_session(State(state): State<AppState>, jar: CookieJar, Json(body): Json<SessionBody>) -> Response {
    let Some(token) = IdentityToken::new(body.id_token) else {
        return validation_error("id_token must not be empty.").into_response();
    };

    match start_session(&state, jar, &token) {
        Ok(jar) => (jar, StatusCode::NO_CONTENT).into_response(),
        Err(e) => {
            error!(error = %e, "session creation failed");
            storage_error_response(&e)
        }
    }
}

/// `POST /api/auth/email`: email/password sign-in or sign-up.
pub async fn email_sign_in(State(state): State<AppState>, jar: CookieJar, Json(body): Json<EmailBody>) -> Response {
    if let Err(e) = validate_email_body(&body) {
        return e.into_response();
    }
    let credentials = Credentials::EmailPassword {
        email: body.email.trim().to_owned(),
        password: body.password,
        sign_up: body.sign_up,
    };
    complete_sign_in(&state, jar, credentials).await
}

/// `POST /api/auth/anonymous`
pub async fn anonymous_sign_in(State(state): State<AppState>, jar: CookieJar) -> Response {
    complete_sign_in(&state, jar, Credentials::Anonymous).await
}

/// `POST /api/auth/passkey`
pub async fn passkey_sign_in(State(state): State<AppState>, jar: CookieJar) -> Response {
    complete_sign_in(&state, jar, Credentials::Passkey).await
}

/// `POST /api/auth/phone/send-code`: first phone step; returns the
/// verification id the client sends back with the code.
pub async fn send_phone_code(State(state): State<AppState>, Json(body): Json<PhoneBody>) -> Response {
    if let Err(e) = validate_phone(&body.phone) {
        return e.into_response();
    }
    match state
        .identity
        .send_phone_code(body.phone.trim(), &body.recaptcha_token)
        .await
    {
        Ok(id) => Json(SendCodeResponse { verification_id: id.0 }).into_response(),
        Err(e) => {
            warn!(error = %e, "phone code request failed");
            provider_error_response(&e)
        }
    }
}

/// `POST /api/auth/phone/verify`: second phone step.
pub async fn verify_phone_code(State(state): State<AppState>, jar: CookieJar, Json(body): Json<VerifyBody>) -> Response {
    let code = body.code.trim();
    if body.verification_id.trim().is_empty() || code.is_empty() {
        return validation_error("Please enter verification code.").into_response();
    }
    let credentials = Credentials::PhoneCode { verification_id: body.verification_id, code: code.to_owned() };
    complete_sign_in(&state, jar, credentials).await
}

/// `GET /auth/{provider}`: send the browser to the provider.
pub async fn redirect_start(State(state): State<AppState>, Path(provider): Path<String>) -> Response {
    let Some(provider) = OAuthProvider::from_slug(&provider) else {
        return ApiError::new(StatusCode::NOT_FOUND, "E_UNKNOWN_PROVIDER", "unknown sign-in provider").into_response();
    };
    let continue_uri = format!("{}/auth/{}/callback", state.config.public_base_url, provider.slug());

    match state.identity.start_redirect(provider, &continue_uri).await {
        Ok(start) => {
            let jar = CookieJar::new().add(auth_session_cookie(start.session_id, state.config.cookie_secure));
            (jar, Redirect::temporary(&start.auth_uri)).into_response()
        }
        Err(e) => {
            warn!(provider = provider.slug(), error = %e, "redirect sign-in could not start");
            login_with_error(&e).into_response()
        }
    }
}

/// `GET /auth/{provider}/callback`: finish the redirect, set the session,
/// continue to the dashboard. Failures land back on the sign-in page.
pub async fn redirect_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(provider): Path<String>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let Some(provider) = OAuthProvider::from_slug(&provider) else {
        return ApiError::new(StatusCode::NOT_FOUND, "E_UNKNOWN_PROVIDER", "unknown sign-in provider").into_response();
    };
    let secure = state.config.cookie_secure;
    let session_id = jar
        .get(AUTH_SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .unwrap_or_default();
    let jar = jar.add(session::expired_cookie(AUTH_SESSION_COOKIE, secure));

    let outcome = if let Some(code) = params.error.as_deref() {
        Err(ProviderError::from_code(code))
    } else if session_id.is_empty() {
        Err(ProviderError::Other("auth/missing-or-invalid-nonce".into()))
    } else {
        let path_and_query = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
        let credentials = Credentials::RedirectResult {
            provider,
            request_uri: format!("{}{path_and_query}", state.config.public_base_url),
            session_id,
        };
        state.identity.authenticate(credentials).await
    };

    let token = match outcome {
        Ok(token) => token,
        Err(e) => {
            warn!(provider = provider.slug(), error = %e, "redirect sign-in failed");
            return (jar, login_with_error(&e)).into_response();
        }
    };

    match start_session(&state, jar, &token) {
        Ok(jar) => {
            info!(method = provider.slug(), "signed in");
            (jar, Redirect::to(DASHBOARD_PATH)).into_response()
        }
        Err(e) => {
            error!(error = %e, "session creation failed");
            storage_error_response(&e)
        }
    }
}

/// `POST /api/auth/logout`: clear the session and go to the sign-in page.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut cookies = ResponseCookies::new(jar, state.config.cookie_secure);
    let result = session::terminate(&mut cookies).and_then(|nav| cookies.finish().map(|jar| (jar, nav)));

    match result {
        Ok((jar, nav)) => (jar, nav).into_response(),
        Err(e) => {
            error!(error = %e, "session termination failed");
            ApiError::from_err(StatusCode::INTERNAL_SERVER_ERROR, &e)
                .with_message("Could not clear session.")
                .into_response()
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

//! Session lifecycle — issue and clear the session cookie.
//!
//! ARCHITECTURE
//! ============
//! The session indicator is a single cookie holding the provider's opaque
//! identity token. Its presence is the whole session: nothing here decodes or
//! validates the token. Writes go through [`CookieStorage`] so a handler can
//! only touch the cookie while it still owns the outgoing response.
//!
//! ```text
//! Anonymous --establish--> Authenticated --terminate--> Anonymous
//!                          Authenticated --expiry-----> Anonymous
//! ```

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::info;

use crate::error::ErrorCode;
use crate::services::access::LOGIN_PATH;

pub const SESSION_COOKIE: &str = "firebase-session";

/// Fixed validity window of a session cookie.
pub const SESSION_MAX_AGE: Duration = Duration::days(5);

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("response already finalized")]
    Finalized,
    #[error("cookie storage unavailable: {0}")]
    Unavailable(String),
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        "E_SESSION_STORAGE"
    }
}

/// Opaque identity token issued by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityToken(String);

impl IdentityToken {
    /// Wrap a raw token. Blank tokens are rejected: an empty cookie value
    /// reads as "no session".
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdentityToken(..)")
    }
}

/// Where the client must go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub to: &'static str,
}

impl IntoResponse for Navigation {
    fn into_response(self) -> Response {
        Redirect::to(self.to).into_response()
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Cookie persistence for one response.
pub trait CookieStorage {
    /// Write (or overwrite) a cookie.
    fn write(&mut self, cookie: Cookie<'static>) -> Result<(), StorageError>;

    /// Delete a cookie. Returns whether the request carried it.
    fn delete(&mut self, name: &'static str) -> Result<bool, StorageError>;
}

/// Outgoing cookie jar of a single response.
///
/// Once [`ResponseCookies::finish`] hands the jar over, further writes fail
/// with [`StorageError::Finalized`].
pub struct ResponseCookies {
    jar: Option<CookieJar>,
    secure: bool,
}

impl ResponseCookies {
    #[must_use]
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar: Some(jar), secure }
    }

    /// Hand the jar to the response.
    ///
    /// # Errors
    ///
    /// Returns `Finalized` if the jar was already taken.
    pub fn finish(&mut self) -> Result<CookieJar, StorageError> {
        self.jar.take().ok_or(StorageError::Finalized)
    }

    fn update(&mut self, f: impl FnOnce(CookieJar) -> CookieJar) -> Result<(), StorageError> {
        let jar = self.jar.take().ok_or(StorageError::Finalized)?;
        self.jar = Some(f(jar));
        Ok(())
    }
}

impl CookieStorage for ResponseCookies {
    fn write(&mut self, cookie: Cookie<'static>) -> Result<(), StorageError> {
        self.update(|jar| jar.add(cookie))
    }

    fn delete(&mut self, name: &'static str) -> Result<bool, StorageError> {
        let existed = self
            .jar
            .as_ref()
            .ok_or(StorageError::Finalized)?
            .get(name)
            .is_some();
        let removal = expired_cookie(name, self.secure);
        self.update(|jar| jar.add(removal))?;
        Ok(existed)
    }
}

// =============================================================================
// COOKIES
// =============================================================================

/// Session cookie carrying `token`, valid for [`SESSION_MAX_AGE`].
#[must_use]
pub fn session_cookie(token: &IdentityToken, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.as_str().to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(SESSION_MAX_AGE)
        .build()
}

/// Empty, already-expired cookie that makes the browser drop `name`.
#[must_use]
pub(crate) fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Whether the request carries a non-empty session cookie.
#[must_use]
pub fn has_session(jar: &CookieJar) -> bool {
    jar.get(SESSION_COOKIE)
        .is_some_and(|cookie| !cookie.value().is_empty())
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Store `token` as the session cookie, replacing any previous one.
///
/// # Errors
///
/// Returns `StorageError` if the cookie could not be written. The caller must
/// not treat the user as signed in.
pub fn establish(storage: &mut impl CookieStorage, token: &IdentityToken, secure: bool) -> Result<(), StorageError> {
    storage.write(session_cookie(token, secure))?;
    info!("session established");
    Ok(())
}

/// Delete the session cookie and send the client to the sign-in page.
///
/// Deleting a missing cookie is fine; the navigation still happens.
///
/// # Errors
///
/// Returns `StorageError` if the delete itself failed. No navigation is
/// returned in that case.
pub fn terminate(storage: &mut impl CookieStorage) -> Result<Navigation, StorageError> {
    let existed = storage.delete(SESSION_COOKIE)?;
    info!(existed, "session terminated");
    Ok(Navigation { to: LOGIN_PATH })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

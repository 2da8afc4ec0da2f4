//! Identity provider seam — sign-in methods and their failures.
//!
//! DESIGN
//! ======
//! Every sign-in method reduces to one call that yields an opaque
//! [`IdentityToken`] or a [`ProviderError`]. Provider error strings are parsed
//! exactly once, in [`ProviderError::from_code`]; user-facing text comes from
//! [`ProviderError::user_message`]. Handlers never compare raw codes.
//!
//! The provider handle is built once at startup and owned by `AppState`,
//! so the phone verifier and HTTP client have one explicit owner.

use crate::error::ErrorCode;
use crate::services::session::IdentityToken;

// =============================================================================
// TYPES
// =============================================================================

/// Redirect-capable sign-in providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    /// Enterprise single sign-on through an OIDC provider.
    FusionAuth,
}

impl OAuthProvider {
    /// Parse the `{provider}` path segment.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "google" => Some(Self::Google),
            "fusionauth" => Some(Self::FusionAuth),
            _ => None,
        }
    }

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::FusionAuth => "fusionauth",
        }
    }
}

/// Credentials for a single `authenticate` call.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    EmailPassword { email: String, password: String, sign_up: bool },
    Anonymous,
    PhoneCode { verification_id: String, code: String },
    Passkey,
    /// Result of a provider redirect: the full callback URI and the session
    /// id returned when the redirect was started.
    RedirectResult { provider: OAuthProvider, request_uri: String, session_id: String },
}

impl Credentials {
    /// Method name used in logs.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::EmailPassword { sign_up: false, .. } => "email",
            Self::EmailPassword { sign_up: true, .. } => "email_sign_up",
            Self::Anonymous => "anonymous",
            Self::PhoneCode { .. } => "phone",
            Self::Passkey => "passkey",
            Self::RedirectResult { provider, .. } => provider.slug(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credentials({})", self.method())
    }
}

/// Where to send the browser to start a redirect sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectStart {
    pub auth_uri: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationId(pub String);

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("invalid credential")]
    InvalidCredential,
    #[error("email already in use")]
    EmailAlreadyInUse,
    #[error("sign-in popup closed by user")]
    PopupClosed,
    #[error("provider not configured: {0}")]
    Unconfigured(&'static str),
    #[error("invalid verification code")]
    InvalidVerificationCode,
    #[error("too many requests")]
    TooManyRequests,
    #[error("network error: {0}")]
    Network(String),
    #[error("provider error: {0}")]
    Other(String),
}

impl ErrorCode for ProviderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "E_INVALID_CREDENTIAL",
            Self::EmailAlreadyInUse => "E_EMAIL_IN_USE",
            Self::PopupClosed => "E_POPUP_CLOSED",
            Self::Unconfigured(_) => "E_PROVIDER_UNCONFIGURED",
            Self::InvalidVerificationCode => "E_INVALID_CODE",
            Self::TooManyRequests => "E_TOO_MANY_REQUESTS",
            Self::Network(_) => "E_PROVIDER_NETWORK",
            Self::Other(_) => "E_PROVIDER",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::TooManyRequests | Self::Network(_))
    }
}

// =============================================================================
// CODE PARSING
// =============================================================================

impl ProviderError {
    /// Classify a provider error code. Both SDK-style (`auth/...`) and
    /// REST-style (`UPPER_SNAKE`) spellings are recognized.
    ///
    /// REST messages may carry a detail suffix (`"CODE : detail"`); only the
    /// leading code is matched.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.split(" : ").next().unwrap_or(code).trim();
        match code {
            "auth/invalid-credential"
            | "auth/wrong-password"
            | "auth/user-not-found"
            | "INVALID_LOGIN_CREDENTIALS"
            | "INVALID_PASSWORD"
            | "EMAIL_NOT_FOUND"
            | "INVALID_IDP_RESPONSE" => Self::InvalidCredential,
            "auth/email-already-in-use" | "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "auth/popup-closed-by-user" | "auth/cancelled-popup-request" | "access_denied" => Self::PopupClosed,
            "auth/invalid-verification-code" | "INVALID_CODE" | "INVALID_SESSION_INFO" | "SESSION_EXPIRED" => {
                Self::InvalidVerificationCode
            }
            "auth/too-many-requests" | "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "auth/network-request-failed" => Self::Network(code.to_owned()),
            "auth/operation-not-allowed" | "OPERATION_NOT_ALLOWED" | "CONFIGURATION_NOT_FOUND" => {
                Self::Unconfigured("provider")
            }
            other => Self::Other(other.to_owned()),
        }
    }

    /// Human-readable text for the sign-in page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredential => "Invalid credentials. Please check your email and password.".into(),
            Self::EmailAlreadyInUse => {
                "This email is already in use. Please sign in or use a different email.".into()
            }
            Self::PopupClosed => {
                "The sign-in window was closed before completing. Please try again, and ensure this domain is authorized with the identity provider.".into()
            }
            Self::Unconfigured(method) => format!("Sign-in with {method} is not available right now."),
            Self::InvalidVerificationCode => "The verification code is invalid or has expired.".into(),
            Self::TooManyRequests => "Too many attempts. Please wait a moment and try again.".into(),
            Self::Network(_) => "An unexpected error occurred. Please try again.".into(),
            Self::Other(code) => humanize_code(code),
        }
    }

    /// Slug carried in `/login?error=` query strings. Parsing `auth/{slug}`
    /// with [`ProviderError::from_code`] yields the same variant again;
    /// `Unconfigured` and `Network` lose their payload on the way.
    ///
    /// Codes outside `[a-z0-9-]` (after normalizing) collapse to
    /// `internal-error`, so the slug never needs escaping.
    #[must_use]
    pub fn slug(&self) -> String {
        match self {
            Self::InvalidCredential => "invalid-credential".into(),
            Self::EmailAlreadyInUse => "email-already-in-use".into(),
            Self::PopupClosed => "popup-closed-by-user".into(),
            Self::Unconfigured(_) => "operation-not-allowed".into(),
            Self::InvalidVerificationCode => "invalid-verification-code".into(),
            Self::TooManyRequests => "too-many-requests".into(),
            Self::Network(_) => "network-request-failed".into(),
            Self::Other(code) => {
                let slug = code
                    .strip_prefix("auth/")
                    .unwrap_or(code)
                    .to_ascii_lowercase()
                    .replace('_', "-");
                if is_slug(&slug) { slug } else { FALLBACK_SLUG.into() }
            }
        }
    }
}

/// Slug for codes that cannot travel in a query string as-is.
const FALLBACK_SLUG: &str = "internal-error";

/// Non-empty, `[a-z0-9-]` only. Safe in a `Location` header without escaping.
fn is_slug(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// `auth/user-disabled` -> `User disabled`; `USER_DISABLED` -> `User disabled`.
fn humanize_code(code: &str) -> String {
    let text = code
        .strip_prefix("auth/")
        .unwrap_or(code)
        .replace(['-', '_'], " ")
        .to_lowercase();
    let mut chars = text.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "An unexpected error occurred. Please try again.".into(),
    }
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// External authentication collaborator.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate and obtain an identity token.
    async fn authenticate(&self, credentials: Credentials) -> Result<IdentityToken, ProviderError>;

    /// Send a one-time code to `phone`. The returned id is passed back in
    /// [`Credentials::PhoneCode`].
    async fn send_phone_code(&self, phone: &str, recaptcha_token: &str) -> Result<VerificationId, ProviderError>;

    /// Start a redirect sign-in that returns to `continue_uri`.
    async fn start_redirect(&self, provider: OAuthProvider, continue_uri: &str) -> Result<RedirectStart, ProviderError>;
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;

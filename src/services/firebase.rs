//! Firebase Authentication adapter over the Identity Toolkit REST API.
//!
//! DESIGN
//! ======
//! Each sign-in method maps to one `accounts:*` endpoint that answers with
//! an `idToken`. Errors come back as `{"error":{"message":"CODE"}}` and are
//! classified by [`ProviderError::from_code`]. The HTTP client is created on
//! first use and then reused for the life of the process.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::OnceCell;

use crate::config::IdentityConfig;
use crate::services::identity::{
    Credentials, IdentityProvider, OAuthProvider, ProviderError, RedirectStart, VerificationId,
};
use crate::services::session::IdentityToken;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const CONNECT_TIMEOUT_SECS: u64 = 5;

const GOOGLE_PROVIDER_ID: &str = "google.com";

pub struct FirebaseIdentity {
    config: IdentityConfig,
    client: OnceCell<reqwest::Client>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendCodeResponse {
    session_info: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthUriResponse {
    auth_uri: String,
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentity {
    #[must_use]
    pub fn new(config: IdentityConfig) -> Self {
        Self { config, client: OnceCell::new() }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn provider_id(&self, provider: OAuthProvider) -> &str {
        match provider {
            OAuthProvider::Google => GOOGLE_PROVIDER_ID,
            OAuthProvider::FusionAuth => &self.config.fusionauth_provider_id,
        }
    }

    fn endpoint_url(&self, endpoint: &str, api_key: &str) -> String {
        format!("{}/accounts:{endpoint}?key={api_key}", self.config.base_url)
    }

    async fn client(&self) -> Result<&reqwest::Client, ProviderError> {
        self.client
            .get_or_try_init(|| async {
                reqwest::Client::builder()
                    .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                    .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                    .build()
                    .map_err(|e| ProviderError::Network(e.to_string()))
            })
            .await
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &'static str,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<R, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::Unconfigured(method))?;
        let client = self.client().await?;

        let resp = client
            .post(self.endpoint_url(endpoint, api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(parse_error_body(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|_| ProviderError::Other(format!("unexpected {endpoint} response")))
    }

    async fn id_token(&self, method: &'static str, endpoint: &str, body: serde_json::Value) -> Result<IdentityToken, ProviderError> {
        let resp: TokenResponse = self.call(method, endpoint, body).await?;
        IdentityToken::new(resp.id_token).ok_or_else(|| ProviderError::Other(format!("empty idToken from {endpoint}")))
    }
}

/// Classify a non-2xx Identity Toolkit response body.
pub(crate) fn parse_error_body(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ProviderError::from_code(&envelope.error.message),
        Err(_) => ProviderError::Other(format!("http {status}")),
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn authenticate(&self, credentials: Credentials) -> Result<IdentityToken, ProviderError> {
        let method = credentials.method();
        match credentials {
            Credentials::EmailPassword { email, password, sign_up } => {
                let endpoint = if sign_up { "signUp" } else { "signInWithPassword" };
                let body = json!({ "email": email, "password": password, "returnSecureToken": true });
                self.id_token(method, endpoint, body).await
            }
            Credentials::Anonymous => {
                self.id_token(method, "signUp", json!({ "returnSecureToken": true }))
                    .await
            }
            Credentials::PhoneCode { verification_id, code } => {
                let body = json!({ "sessionInfo": verification_id, "code": code });
                self.id_token(method, "signInWithPhoneNumber", body).await
            }
            // Identity Toolkit has no passkey endpoint.
            Credentials::Passkey => Err(ProviderError::Unconfigured(method)),
            Credentials::RedirectResult { request_uri, session_id, .. } => {
                let body = json!({
                    "requestUri": request_uri,
                    "sessionId": session_id,
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                });
                self.id_token(method, "signInWithIdp", body).await
            }
        }
    }

    async fn send_phone_code(&self, phone: &str, recaptcha_token: &str) -> Result<VerificationId, ProviderError> {
        let body = json!({ "phoneNumber": phone, "recaptchaToken": recaptcha_token });
        let resp: SendCodeResponse = self.call("phone", "sendVerificationCode", body).await?;
        Ok(VerificationId(resp.session_info))
    }

    async fn start_redirect(&self, provider: OAuthProvider, continue_uri: &str) -> Result<RedirectStart, ProviderError> {
        let body = json!({ "providerId": self.provider_id(provider), "continueUri": continue_uri });
        let resp: AuthUriResponse = self.call(provider.slug(), "createAuthUri", body).await?;
        Ok(RedirectStart { auth_uri: resp.auth_uri, session_id: resp.session_id })
    }
}

#[cfg(test)]
#[path = "firebase_test.rs"]
mod tests;

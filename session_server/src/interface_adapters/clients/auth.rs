use crate::domain::{Identity, TokenValidator, VerifyTokenError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Verification response from the auth service.
#[derive(Debug, Clone, Deserialize)]
struct VerifiedIdentity {
    user_id: u64,
    display_name: String,
    session_id: String,
}

impl From<VerifiedIdentity> for Identity {
    fn from(v: VerifiedIdentity) -> Self {
        Self {
            user_id: v.user_id,
            display_name: v.display_name,
            session_id: v.session_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct VerifyTokenRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

// Thin reqwest client for join-token verification against an external auth service.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TokenValidator for AuthClient {
    async fn verify_token(&self, token: &str) -> Result<Identity, VerifyTokenError> {
        let url = format!("{}/auth/verify-token", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&VerifyTokenRequest { token })
            .send()
            .await
            .map_err(|_| VerifyTokenError::UpstreamUnavailable)?;

        if response.status().is_success() {
            return response
                .json::<VerifiedIdentity>()
                .await
                .map(Identity::from)
                .map_err(|_| VerifyTokenError::UpstreamUnavailable);
        }

        if response.status() == StatusCode::UNAUTHORIZED {
            let error = response
                .json::<ErrorResponse>()
                .await
                .map_err(|_| VerifyTokenError::UpstreamUnavailable)?;

            if error.message == "session expired" {
                return Err(VerifyTokenError::SessionExpired);
            }
            return Err(VerifyTokenError::InvalidToken);
        }

        Err(VerifyTokenError::UpstreamUnavailable)
    }
}

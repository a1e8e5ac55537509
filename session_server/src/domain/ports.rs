use async_trait::async_trait;

// Identity confirmed by the session validator for a join token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: u64,
    pub display_name: String,
    pub session_id: String,
}

#[derive(Debug)]
pub enum VerifyTokenError {
    InvalidToken,
    SessionExpired,
    UpstreamUnavailable,
}

// Port for session-token validation. The session endpoint depends on this trait, not on the
// concrete auth client, so tests can plug in fixed identities.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<Identity, VerifyTokenError>;
}

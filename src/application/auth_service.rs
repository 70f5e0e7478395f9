use crate::domain::error::DomainError;
use crate::domain::user::{LoginRequest, Role};
use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use tracing::{info, instrument, trace, warn};

pub const MISSING_CREDENTIALS: &str = "Email and password are required";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: String,
    pub role: Role,
}

/// Issues placeholder session tokens.
///
/// No credentials are checked against any store: a complete request always
/// succeeds. The token is a reversible encoding, not a signature, and nothing
/// in this crate validates it.
pub struct AuthService {
    role: Role,
}

impl AuthService {
    pub fn new() -> Self {
        Self { role: Role::Lab }
    }

    #[instrument(skip_all, fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome> {
        trace!("Starting login");

        if !req.is_complete() {
            warn!(
                email_present = !req.email.is_empty(),
                password_present = !req.password.is_empty(),
                "Login request missing credentials"
            );
            return Err(DomainError::Validation(MISSING_CREDENTIALS.to_string()).into());
        }

        let token = issue_placeholder_token(&req.email, self.role, Utc::now());

        info!(email = %req.email, role = %self.role, "Login successful");

        Ok(LoginOutcome {
            token,
            role: self.role,
        })
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes `{email}:{role}:{unix millis}` as standard base64.
pub fn issue_placeholder_token(email: &str, role: Role, issued_at: DateTime<Utc>) -> String {
    let raw = format!("{}:{}:{}", email, role, issued_at.timestamp_millis());
    STANDARD.encode(raw)
}

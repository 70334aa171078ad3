/// JWT Claims structures
///
/// Payloads of the two session tokens. Both carry the user id as `sub`;
/// access tokens additionally embed the refresh token that produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A token is valid until the clock reaches `exp`; there is no other transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    Expired,
}

impl TokenState {
    pub fn at(exp: i64, now: DateTime<Utc>) -> Self {
        if now.timestamp() >= exp {
            TokenState::Expired
        } else {
            TokenState::Valid
        }
    }
}

/// Claims of a short-lived access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user id as string)
    pub sub: String,
    /// Refresh token this access token was minted from
    pub refresh_token: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Unique token id
    pub jti: String,
}

/// Claims of a refresh token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

impl AccessClaims {
    pub fn new(
        subject: &str,
        refresh_token: &str,
        now: DateTime<Utc>,
        expiry_seconds: i64,
        issuer: &str,
    ) -> Self {
        let iat = now.timestamp();
        Self {
            sub: subject.to_string(),
            refresh_token: refresh_token.to_string(),
            exp: iat + expiry_seconds,
            iat,
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        TokenState::at(self.exp, now)
    }
}

impl RefreshClaims {
    pub fn new(subject: &str, now: DateTime<Utc>, expiry_seconds: i64, issuer: &str) -> Self {
        let iat = now.timestamp();
        Self {
            sub: subject.to_string(),
            exp: iat + expiry_seconds,
            iat,
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        TokenState::at(self.exp, now)
    }
}

pub(crate) fn parse_subject(sub: &str) -> Result<i64, AppError> {
    sub.parse::<i64>()
        .map_err(|_| AppError::Internal("Invalid user ID in token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_access_claims_creation() {
        let now = Utc::now();
        let claims = AccessClaims::new("42", "refresh.jwt.value", now, 15, "test");

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.refresh_token, "refresh.jwt.value");
        assert_eq!(claims.exp - claims.iat, 15);
        assert_eq!(parse_subject(&claims.sub).unwrap(), 42);
    }

    #[test]
    fn test_each_claim_set_gets_its_own_jti() {
        let now = Utc::now();
        let a = RefreshClaims::new("1", now, 600, "test");
        let b = RefreshClaims::new("1", now, 600, "test");
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_token_state_boundary() {
        let issued = Utc::now();
        let claims = RefreshClaims::new("7", issued, 600, "test");

        assert_eq!(claims.state_at(issued), TokenState::Valid);
        assert_eq!(claims.state_at(issued + Duration::seconds(599)), TokenState::Valid);
        assert_eq!(claims.state_at(issued + Duration::seconds(600)), TokenState::Expired);
    }

    #[test]
    fn test_invalid_subject() {
        assert!(parse_subject("not-a-number").is_err());
    }
}

/// JWT Token Generation and Validation
///
/// Issues and verifies the two session tokens. Signatures are checked by
/// `jsonwebtoken`; expiry is checked here against the injected `Clock` so
/// that token lifetimes are exact and testable.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;

use crate::auth::claims::{AccessClaims, RefreshClaims, TokenState};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, MalformedTokenReason};

/// Mint a refresh token for `subject`
pub fn generate_refresh_token(
    subject: &str,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = RefreshClaims::new(subject, now, config.refresh_token_expiry, &config.issuer);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.refresh_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Refresh token generation failed: {}", e)))
}

/// Mint an access token for `subject`, embedding `refresh_token`.
///
/// # Errors
/// Fails if the refresh token does not decode to the same subject.
pub fn generate_access_token(
    subject: &str,
    refresh_token: &str,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let refresh_subject = decode_subject_unverified(refresh_token)?;
    if refresh_subject != subject {
        return Err(AppError::Internal(
            "Refresh token subject does not match access token subject".to_string(),
        ));
    }

    let claims = AccessClaims::new(
        subject,
        refresh_token,
        now,
        config.access_token_expiry,
        &config.issuer,
    );

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.access_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

fn signature_validation(config: &JwtSettings) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is compared against the injected clock instead
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation.set_issuer(&[&config.issuer]);
    validation
}

/// Verify an access token's signature and expiry
///
/// # Errors
/// `AuthError::InvalidToken` for any failure; signature and expiry failures
/// are deliberately indistinguishable.
pub fn validate_access_token(
    token: &str,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<AccessClaims, AuthError> {
    let claims = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.access_secret.as_bytes()),
        &signature_validation(config),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Access token rejected: {}", e);
        AuthError::InvalidToken
    })?;

    match claims.state_at(now) {
        TokenState::Valid => Ok(claims),
        TokenState::Expired => {
            tracing::debug!(user_id = %claims.sub, "Access token expired");
            Err(AuthError::InvalidToken)
        }
    }
}

/// Verify a refresh token's signature and expiry
pub fn validate_refresh_token(
    token: &str,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<RefreshClaims, AuthError> {
    let claims = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.refresh_secret.as_bytes()),
        &signature_validation(config),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Refresh token rejected: {}", e);
        AuthError::InvalidRefreshToken
    })?;

    match claims.state_at(now) {
        TokenState::Valid => Ok(claims),
        TokenState::Expired => Err(AuthError::InvalidRefreshToken),
    }
}

#[derive(Deserialize)]
struct UnverifiedClaims {
    #[serde(default)]
    sub: Option<serde_json::Value>,
}

/// Read the subject of a token WITHOUT checking its signature or expiry.
///
/// Only used to reject structurally broken tokens before verification.
pub fn decode_subject_unverified(token: &str) -> Result<String, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let claims = decode::<UnverifiedClaims>(token, &DecodingKey::from_secret(b""), &validation)
        .map_err(|_| AuthError::MalformedToken(MalformedTokenReason::NoPayload))?
        .claims;

    match claims.sub {
        Some(serde_json::Value::String(sub)) => Ok(sub),
        _ => Err(AuthError::MalformedToken(MalformedTokenReason::SubjectNotString)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            access_secret: "access-secret-key-at-least-32-characters".to_string(),
            refresh_secret: "refresh-secret-key-at-least-32-characters".to_string(),
            access_token_expiry: 15,
            refresh_token_expiry: 600,
            issuer: "test".to_string(),
        }
    }

    fn login_tokens(config: &JwtSettings, now: DateTime<Utc>) -> (String, String) {
        let refresh = generate_refresh_token("42", config, now).expect("Failed to generate refresh token");
        let access = generate_access_token("42", &refresh, config, now).expect("Failed to generate access token");
        (access, refresh)
    }

    #[test]
    fn test_generate_and_validate_tokens() {
        let config = get_test_config();
        let now = Utc::now();
        let (access, refresh) = login_tokens(&config, now);

        let access_claims = validate_access_token(&access, &config, now).expect("Invalid access token");
        let refresh_claims = validate_refresh_token(&refresh, &config, now).expect("Invalid refresh token");

        assert_eq!(access_claims.sub, "42");
        assert_eq!(refresh_claims.sub, "42");
        assert_eq!(access_claims.refresh_token, refresh);
    }

    #[test]
    fn test_tokens_only_verify_against_their_own_secret() {
        let config = get_test_config();
        let now = Utc::now();
        let (access, refresh) = login_tokens(&config, now);

        assert!(validate_access_token(&refresh, &config, now).is_err());
        assert!(matches!(
            validate_refresh_token(&access, &config, now),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn test_access_token_expiry_boundary() {
        let config = get_test_config();
        let issued = Utc::now();
        let (access, _) = login_tokens(&config, issued);

        assert!(validate_access_token(&access, &config, issued + Duration::seconds(14)).is_ok());
        assert!(matches!(
            validate_access_token(&access, &config, issued + Duration::seconds(16)),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_refresh_token_expiry_boundary() {
        let config = get_test_config();
        let issued = Utc::now();
        let (_, refresh) = login_tokens(&config, issued);

        assert!(validate_refresh_token(&refresh, &config, issued + Duration::seconds(599)).is_ok());
        assert!(validate_refresh_token(&refresh, &config, issued + Duration::seconds(601)).is_err());
    }

    #[test]
    fn test_tampered_token() {
        let config = get_test_config();
        let now = Utc::now();
        let (access, _) = login_tokens(&config, now);

        let tampered = format!("{}X", access);
        assert!(validate_access_token(&tampered, &config, now).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = get_test_config();
        let now = Utc::now();
        let (access, _) = login_tokens(&config, now);

        config.issuer = "wrong-issuer".to_string();
        assert!(validate_access_token(&access, &config, now).is_err());
    }

    #[test]
    fn test_access_token_rejects_foreign_refresh_subject() {
        let config = get_test_config();
        let now = Utc::now();
        let refresh = generate_refresh_token("1", &config, now).unwrap();

        assert!(generate_access_token("2", &refresh, &config, now).is_err());
    }

    #[test]
    fn test_decode_subject_unverified() {
        let config = get_test_config();
        let refresh = generate_refresh_token("99", &config, Utc::now()).unwrap();

        assert_eq!(decode_subject_unverified(&refresh).unwrap(), "99");
    }

    #[test]
    fn test_decode_garbage_has_no_payload() {
        assert!(matches!(
            decode_subject_unverified("definitely-not-a-jwt"),
            Err(AuthError::MalformedToken(MalformedTokenReason::NoPayload))
        ));
    }

    #[test]
    fn test_decode_numeric_subject_is_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": 42, "exp": 0 }),
            &EncodingKey::from_secret(b"whatever"),
        )
        .unwrap();

        assert!(matches!(
            decode_subject_unverified(&token),
            Err(AuthError::MalformedToken(MalformedTokenReason::SubjectNotString))
        ));
    }

    #[test]
    fn test_decode_missing_subject_is_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "exp": 0 }),
            &EncodingKey::from_secret(b"whatever"),
        )
        .unwrap();

        assert!(decode_subject_unverified(&token).is_err());
    }
}

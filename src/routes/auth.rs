/// Authentication Routes
///
/// Registration, login, logout and access-token renewal.

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{
    decode_subject_unverified, generate_access_token, generate_refresh_token, hash_password,
    validate_refresh_token, verify_password, Clock,
};
use crate::configuration::{CookieSettings, JwtSettings};
use crate::cookies::{
    refreshed_access_cookie, removal_cookie, session_cookie, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use crate::error::{AppError, AuthError, MalformedTokenReason, StoreError, ValidationError};
use crate::store::{CredentialStore, NewUser, PublicUser};
use crate::validators::{is_valid_email, is_valid_name, is_valid_password, is_valid_username};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request.
///
/// The token is kept as raw JSON: a missing or empty token is a conflict and
/// a token that is not a string is unreadable, neither is a schema error.
#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<serde_json::Value>,
}

impl RefreshRequest {
    /// Parse a request body. A missing body or a non-JSON content type reads
    /// as a request without a token.
    pub fn from_body(req: &HttpRequest, body: &[u8]) -> Result<Self, ValidationError> {
        let is_json = req.content_type().contains("json");
        if !is_json || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        serde_json::from_slice(body).map_err(|e| ValidationError::MalformedBody(e.to_string()))
    }

    /// The token to verify
    ///
    /// # Errors
    /// - `MissingRefreshToken`: absent, `null`, `false`, `0` or `""`
    /// - `MalformedToken(NoPayload)`: any other non-string value
    pub fn token(&self) -> Result<&str, AuthError> {
        match &self.refresh_token {
            None | Some(Value::Null) | Some(Value::Bool(false)) => {
                Err(AuthError::MissingRefreshToken)
            }
            Some(Value::String(token)) if token.is_empty() => Err(AuthError::MissingRefreshToken),
            Some(Value::String(token)) => Ok(token.as_str()),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {
                Err(AuthError::MissingRefreshToken)
            }
            Some(_) => Err(AuthError::MalformedToken(MalformedTokenReason::NoPayload)),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub payload: RegisteredUser,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user: PublicUser,
    pub refresh_token: String,
    pub access_token: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// POST /api/auth/register
///
/// # Errors
/// - 400: Validation errors
/// - 409: Username already taken
/// - 500: Store failure
pub async fn register<S: CredentialStore + 'static>(
    form: web::Json<RegisterRequest>,
    store: web::Data<S>,
) -> Result<HttpResponse, AppError> {
    is_valid_name(&form.name)?;
    is_valid_username(&form.username)?;
    is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let password_hash = hash_password(&form.password).await?;
    let new_user = NewUser {
        name: form.name.clone(),
        username: form.username.clone(),
        email: form.email.clone(),
        password_hash,
    };

    // The username uniqueness constraint is the only duplicate check
    let id = store.insert_user(&new_user).await.map_err(|e| match e {
        StoreError::UniqueViolation(_) => AppError::Auth(AuthError::UsernameTaken),
        other => AppError::Store(other),
    })?;

    tracing::info!(user_id = id, "User registered");

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully".to_string(),
        payload: RegisteredUser {
            id,
            username: new_user.username,
        },
    }))
}

/// POST /api/auth/login
///
/// Sets the `access_token` and `refresh_token` cookies and also returns both
/// tokens in the body.
///
/// # Errors
/// - 400: Validation error or wrong password
/// - 404: Unknown username
/// - 500: Store failure
pub async fn login<S: CredentialStore + 'static>(
    form: web::Json<LoginRequest>,
    store: web::Data<S>,
    jwt_config: web::Data<JwtSettings>,
    cookie_config: web::Data<CookieSettings>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    is_valid_username(&form.username)?;
    is_valid_password(&form.password)?;

    let user = store
        .find_by_username(&form.username)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !verify_password(&form.password, &user.password).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let user = PublicUser::from(user);
    let subject = user.id.to_string();
    let now = clock.now();

    let refresh_token = generate_refresh_token(&subject, &jwt_config, now)?;
    let access_token = generate_access_token(&subject, &refresh_token, &jwt_config, now)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(ACCESS_TOKEN_COOKIE, &access_token, &cookie_config))
        .cookie(session_cookie(REFRESH_TOKEN_COOKIE, &refresh_token, &cookie_config))
        .json(LoginResponse {
            message: "User logged in".to_string(),
            user,
            refresh_token,
            access_token,
        }))
}

/// POST /api/auth/logout
///
/// Always succeeds; clearing cookies the client does not have is a no-op.
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
        .json(MessageResponse {
            message: "User logged out".to_string(),
        })
}

/// POST /api/auth/refresh-token
///
/// Exchanges a refresh token for a new access token. The refresh token is
/// not rotated; it stays usable until it expires.
///
/// # Errors
/// - 400: Body is not valid JSON
/// - 409: No refresh token in the body, or no body at all
/// - 500: Token is undecodable or its subject is not a string
/// - 401: Bad signature or expired (`INVALID_REFRESH_TOKEN`)
pub async fn refresh_token(
    req: HttpRequest,
    body: web::Bytes,
    jwt_config: web::Data<JwtSettings>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    let form = RefreshRequest::from_body(&req, &body)?;
    let refresh_token = form.token()?;

    let subject = decode_subject_unverified(refresh_token)?;

    let now = clock.now();
    let claims = validate_refresh_token(refresh_token, &jwt_config, now)?;

    let access_token = generate_access_token(&claims.sub, refresh_token, &jwt_config, now)?;

    tracing::info!(user_id = %subject, "Access token refreshed");

    Ok(HttpResponse::Ok()
        .cookie(refreshed_access_cookie(&access_token))
        .json(RefreshResponse { access_token }))
}

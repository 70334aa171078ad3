/// Authentication module
///
/// Password hashing, session token issuance/verification and the clock
/// that drives token expiry.

mod claims;
mod clock;
mod jwt;
mod password;

pub use claims::{AccessClaims, RefreshClaims, TokenState};
pub use clock::{Clock, MockClock, SystemClock};
pub use jwt::decode_subject_unverified;
pub use jwt::generate_access_token;
pub use jwt::generate_refresh_token;
pub use jwt::validate_access_token;
pub use jwt::validate_refresh_token;
pub use password::hash_password;
pub use password::verify_password;

/// Identity attached to a request by the auth guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Token subject, the user id in string form
    pub user_id: String,
}

impl AuthenticatedUser {
    pub fn id(&self) -> Result<i64, crate::error::AppError> {
        claims::parse_subject(&self.user_id)
    }
}

//! Credential store
//!
//! The users table as seen by the API. Handlers are generic over
//! `CredentialStore`; production uses PostgreSQL, tests and local runs can
//! use the in-memory store.

mod memory;
mod postgres;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

use serde::Serialize;

use crate::error::StoreError;

/// Stored user row, including the password hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never the plaintext
    pub password: String,
    pub profile_pic: Option<String>,
    pub cover_pic: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
}

/// User without the password hash. The only user shape sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub cover_pic: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            profile_pic: user.profile_pic,
            cover_pic: user.cover_pic,
            city: user.city,
            website: user.website,
        }
    }
}

/// Row to insert on registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[trait_variant::make(CredentialStore: Send)]
pub trait LocalCredentialStore {
    /// Insert a user and return the store-assigned id.
    ///
    /// A duplicate username fails with `StoreError::UniqueViolation`.
    async fn insert_user(&self, user: &NewUser) -> Result<i64, StoreError>;

    /// Exact-match lookup by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_user_drops_password() {
        let user = User {
            id: 1,
            name: "Alice Smith".to_string(),
            username: "alice_01".to_string(),
            email: "alice@example.com".to_string(),
            password: "$2b$10$hash".to_string(),
            profile_pic: None,
            cover_pic: None,
            city: Some("Lisbon".to_string()),
            website: None,
        };

        let public = PublicUser::from(user);
        let json = serde_json::to_value(&public).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alice_01");
        assert_eq!(json["city"], "Lisbon");
    }
}

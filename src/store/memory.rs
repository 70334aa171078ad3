//! In-memory credential store
//!
//! Mirrors the Postgres table semantics that the auth flow relies on:
//! sequential ids and a unique `username`.

use std::sync::{Arc, RwLock};

use super::{CredentialStore, NewUser, User};
use crate::error::StoreError;

const USERNAME_CONSTRAINT: &str = "users_username_key";

#[derive(Default)]
struct Table {
    rows: Vec<User>,
    next_id: i64,
}

/// Clones share the same table
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    table: Arc<RwLock<Table>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Connection("in-memory store lock poisoned".to_string())
    }
}

impl CredentialStore for InMemoryCredentialStore {
    async fn insert_user(&self, user: &NewUser) -> Result<i64, StoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;

        if table.rows.iter().any(|row| row.username == user.username) {
            return Err(StoreError::UniqueViolation(USERNAME_CONSTRAINT.to_string()));
        }

        table.next_id += 1;
        let id = table.next_id;
        table.rows.push(User {
            id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password: user.password_hash.clone(),
            profile_pic: None,
            cover_pic: None,
            city: None,
            website: None,
        });

        Ok(id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table.rows.iter().find(|row| row.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table.rows.iter().find(|row| row.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table.rows.clone())
    }
}

//! User rows and role vocabulary.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use curio_core::types::{Id, Timestamp};

/// Role strings stored in `user_roles`.
pub mod roles {
    pub const READ: &str = "READ";
    pub const VOTE: &str = "VOTE";
    pub const EDIT: &str = "EDIT";
    pub const BOT: &str = "BOT";
    pub const ADMIN: &str = "ADMIN";
}

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub id: Id,
    pub name: String,
    pub email: Option<String>,
}

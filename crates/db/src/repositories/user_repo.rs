//! Repository for the `users` and `user_roles` tables.

use sqlx::PgConnection;

use curio_core::types::Id;

use crate::models::user::{CreateUser, User};

/// Column list for users queries.
const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

/// Provides CRUD for users and their role grants.
pub struct UserRepo;

impl UserRepo {
    pub async fn create(conn: &mut PgConnection, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, name, email)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(&input.email)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Id) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn list_roles(
        conn: &mut PgConnection,
        user_id: Id,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
            .bind(user_id)
            .fetch_all(conn)
            .await
    }

    pub async fn has_role(
        conn: &mut PgConnection,
        user_id: Id,
        role: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2)",
        )
        .bind(user_id)
        .bind(role)
        .fetch_one(conn)
        .await
    }

    pub async fn grant_role(
        conn: &mut PgConnection,
        user_id: Id,
        role: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role)
        .execute(conn)
        .await?;
        Ok(())
    }
}

//! Operations on the `users` table.

use campus_registry::RegistryError;
use campus_types::{NewUser, Role, User, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `users` table.
pub struct UserStore<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStore<'a> {
    /// Create a user store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Validate `input` and insert the account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with a validation error or
    /// `DuplicateStudentNo`.
    pub async fn insert(&self, input: NewUser) -> Result<User, DbError> {
        let user = input.into_user().map_err(RegistryError::from)?;

        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r"INSERT INTO users (id, name, student_no, phone_no, role, created_at)
              VALUES ($1, $2, $3, $4, $5, $6)
              ON CONFLICT (student_no) DO NOTHING
              RETURNING id",
        )
        .bind(user.id.into_inner())
        .bind(&user.name)
        .bind(&user.student_no)
        .bind(user.phone_no.as_deref())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .fetch_optional(self.pool)
        .await?;

        if inserted.is_none() {
            return Err(RegistryError::DuplicateStudentNo(user.student_no).into());
        }

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Account created");
        Ok(user)
    }

    /// Fetch one account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with `UserNotFound` if there is no such
    /// account.
    pub async fn get(&self, user_id: UserId) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, student_no, phone_no, role, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RegistryError::UserNotFound(user_id))?.try_into()
    }

    /// Fetch the account holding `student_no`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with `StudentNotFound` if no account
    /// has it.
    pub async fn get_by_student_no(&self, student_no: &str) -> Result<User, DbError> {
        let wanted = student_no.trim();
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, student_no, phone_no, role, created_at FROM users WHERE student_no = $1",
        )
        .bind(wanted)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or_else(|| RegistryError::StudentNotFound(wanted.to_owned()))?
            .try_into()
    }

    /// Every account, ordered by name, then id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, student_no, phone_no, role, created_at FROM users ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// User UUID.
    pub id: Uuid,
    /// Full name.
    pub name: String,
    /// Student number.
    pub student_no: String,
    /// Phone number.
    pub phone_no: Option<String>,
    /// Role wire name.
    pub role: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| DbError::Decode(format!("unknown role {:?}", row.role)))?;
        Ok(Self {
            id: UserId::from(row.id),
            name: row.name,
            student_no: row.student_no,
            phone_no: row.phone_no,
            role,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_user() {
        let row = UserRow {
            id: Uuid::now_v7(),
            name: String::from("Ece Polat"),
            student_no: String::from("2020777"),
            phone_no: None,
            role: String::from("admin"),
            created_at: Utc::now(),
        };
        let user = User::try_from(row);
        assert!(user.is_ok_and(|u| u.is_admin()));
    }

    #[test]
    fn unknown_role_is_corrupt() {
        let row = UserRow {
            id: Uuid::now_v7(),
            name: String::from("Ece Polat"),
            student_no: String::from("2020777"),
            phone_no: None,
            role: String::from("superuser"),
            created_at: Utc::now(),
        };
        assert!(matches!(User::try_from(row), Err(DbError::Decode(_))));
    }
}

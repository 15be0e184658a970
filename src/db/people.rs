//! Person repository.
//!
//! People own PERSON streams and start pages. Administrators are flagged here.

use super::{DbError, is_unique_violation};
use serde::Serialize;
use sqlx::SqlitePool;

/// A registered person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: i64,
    pub account_id: String,
    pub display_name: String,
    pub is_administrator: bool,
    pub created_at: i64,
}

type PersonRow = (i64, String, String, bool, i64);

fn person_from_row((id, account_id, display_name, is_administrator, created_at): PersonRow) -> Person {
    Person {
        id,
        account_id,
        display_name,
        is_administrator,
        created_at,
    }
}

/// Repository for person operations.
pub struct PersonRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PersonRepository<'a> {
    /// Create a new person repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a person. Fails with `AccountExists` on a duplicate account id.
    pub async fn create(
        &self,
        account_id: &str,
        display_name: &str,
        is_administrator: bool,
    ) -> Result<Person, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO people (account_id, display_name, is_administrator, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(account_id)
        .bind(display_name)
        .bind(is_administrator)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DbError::AccountExists(account_id.to_string());
            }
            DbError::from(e)
        })?;

        Ok(Person {
            id: result.last_insert_rowid(),
            account_id: account_id.to_string(),
            display_name: display_name.to_string(),
            is_administrator,
            created_at: now,
        })
    }

    /// Create the person if missing and make sure they are an administrator.
    ///
    /// Returns true when anything changed.
    pub async fn ensure_administrator(&self, account_id: &str) -> Result<bool, DbError> {
        match self.find_by_account_id(account_id).await? {
            Some(person) if person.is_administrator => Ok(false),
            Some(person) => {
                sqlx::query("UPDATE people SET is_administrator = 1 WHERE id = ?")
                    .bind(person.id)
                    .execute(self.pool)
                    .await?;
                Ok(true)
            }
            None => {
                self.create(account_id, account_id, true).await?;
                Ok(true)
            }
        }
    }

    /// Find a person by account id (case-insensitive).
    pub async fn find_by_account_id(&self, account_id: &str) -> Result<Option<Person>, DbError> {
        let row = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, account_id, display_name, is_administrator, created_at
            FROM people
            WHERE account_id = ? COLLATE NOCASE
            "#,
        )
        .bind(account_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(person_from_row))
    }

    /// Ids of all system administrators, ascending.
    pub async fn system_administrator_ids(&self) -> Result<Vec<i64>, DbError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM people WHERE is_administrator = ? ORDER BY id",
        )
        .bind(true)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }
}

//! Group repository.

use super::{DbError, is_unique_violation};
use serde::Serialize;
use sqlx::SqlitePool;

/// A group owning a GROUP stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: i64,
    pub short_name: String,
    pub name: String,
    pub is_public: bool,
    pub coordinator_person_id: i64,
    pub created_at: i64,
}

/// Repository for group operations.
pub struct GroupRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GroupRepository<'a> {
    /// Create a new group repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a group coordinated by the given person.
    pub async fn create(
        &self,
        short_name: &str,
        name: &str,
        is_public: bool,
        coordinator_person_id: i64,
    ) -> Result<Group, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO groups (short_name, name, is_public, coordinator_person_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(short_name)
        .bind(name)
        .bind(is_public)
        .bind(coordinator_person_id)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DbError::GroupExists(short_name.to_string());
            }
            DbError::from(e)
        })?;

        Ok(Group {
            id: result.last_insert_rowid(),
            short_name: short_name.to_string(),
            name: name.to_string(),
            is_public,
            coordinator_person_id,
            created_at: now,
        })
    }

    /// Find a group by short name (case-insensitive).
    pub async fn find_by_short_name(&self, short_name: &str) -> Result<Option<Group>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, String, bool, i64, i64)>(
            r#"
            SELECT id, short_name, name, is_public, coordinator_person_id, created_at
            FROM groups
            WHERE short_name = ? COLLATE NOCASE
            "#,
        )
        .bind(short_name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(
            |(id, short_name, name, is_public, coordinator_person_id, created_at)| Group {
                id,
                short_name,
                name,
                is_public,
                coordinator_person_id,
                created_at,
            },
        ))
    }
}

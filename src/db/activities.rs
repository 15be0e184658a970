//! Activity and comment repository.

use super::DbError;
use crate::stream::{Activity, BaseObject, BaseObjectType, StreamScope};
use serde::Serialize;
use sqlx::SqlitePool;

/// Activity fields supplied by the poster; id and time are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub actor_person_id: i64,
    pub recipient_stream_scope: StreamScope,
    pub is_destination_stream_public: bool,
    pub base_object_type: BaseObjectType,
    pub base_object: BaseObject,
}

/// A comment on an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub activity_id: i64,
    pub author_person_id: i64,
    pub body: String,
    pub posted_at: i64,
}

/// Repository for activity operations.
pub struct ActivityRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ActivityRepository<'a> {
    /// Create a new activity repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new activity posted now.
    pub async fn insert(&self, activity: NewActivity) -> Result<Activity, DbError> {
        let now = chrono::Utc::now().timestamp();
        self.insert_at(activity, now).await
    }

    /// Store a new activity with an explicit posting time.
    pub async fn insert_at(&self, activity: NewActivity, posted_at: i64) -> Result<Activity, DbError> {
        let base_object = serde_json::to_string(&activity.base_object)
            .map_err(|e| DbError::CorruptRow(format!("base object: {e}")))?;

        let result = sqlx::query(
            r#"
            INSERT INTO activities (actor_person_id, recipient_scope_type, recipient_unique_key,
                                    is_destination_public, base_object_type, base_object, posted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(activity.actor_person_id)
        .bind(activity.recipient_stream_scope.scope_type.as_str())
        .bind(&activity.recipient_stream_scope.unique_key)
        .bind(activity.is_destination_stream_public)
        .bind(activity.base_object_type.as_str())
        .bind(&base_object)
        .bind(posted_at)
        .execute(self.pool)
        .await?;

        Ok(Activity {
            id: result.last_insert_rowid(),
            actor_person_id: activity.actor_person_id,
            recipient_stream_scope: activity.recipient_stream_scope,
            is_destination_stream_public: activity.is_destination_stream_public,
            base_object_type: activity.base_object_type,
            base_object: activity.base_object,
            posted_at,
        })
    }

    /// Add a comment posted now.
    pub async fn add_comment(
        &self,
        activity_id: i64,
        author_person_id: i64,
        body: &str,
    ) -> Result<Comment, DbError> {
        let now = chrono::Utc::now().timestamp();
        self.add_comment_at(activity_id, author_person_id, body, now).await
    }

    /// Add a comment with an explicit posting time.
    pub async fn add_comment_at(
        &self,
        activity_id: i64,
        author_person_id: i64,
        body: &str,
        posted_at: i64,
    ) -> Result<Comment, DbError> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM activities WHERE id = ?")
            .bind(activity_id)
            .fetch_one(self.pool)
            .await?;
        if exists == 0 {
            return Err(DbError::ActivityNotFound(activity_id));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO comments (activity_id, author_person_id, body, posted_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(activity_id)
        .bind(author_person_id)
        .bind(body)
        .bind(posted_at)
        .execute(self.pool)
        .await?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            activity_id,
            author_person_id,
            body: body.to_string(),
            posted_at,
        })
    }
}

//! Hashtag repository.
//!
//! Hashtags are stored once per normalized content; stream associations link a
//! hashtag to the stream an activity was posted to.

use super::DbError;
use crate::stream::{HashTag, StreamHashTag, StreamScope};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Usage count of one hashtag within a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamHashTagCount {
    pub content: String,
    pub count: i64,
}

/// Repository for hashtag operations.
pub struct HashTagRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HashTagRepository<'a> {
    /// Create a new hashtag repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the hashtags matching any of `contents`. Unknown contents are skipped.
    pub async fn find_by_contents(&self, contents: &[String]) -> Result<Vec<HashTag>, DbError> {
        if contents.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT id, content FROM hashtags WHERE content IN (");
        let mut separated = qb.separated(", ");
        for content in contents {
            separated.push_bind(content.as_str());
        }
        separated.push_unseparated(")");

        let rows = qb
            .build_query_as::<(i64, String)>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, content)| HashTag { id, content })
            .collect())
    }

    /// Insert any of `contents` not stored yet, then load them all.
    pub async fn find_or_create(&self, contents: &[String]) -> Result<Vec<HashTag>, DbError> {
        if contents.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        for content in contents {
            sqlx::query("INSERT OR IGNORE INTO hashtags (content) VALUES (?)")
                .bind(content)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.find_by_contents(contents).await
    }

    /// Insert a stream association. Returns false if it already existed.
    pub async fn insert_stream_hashtag(&self, row: &StreamHashTag) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO stream_hashtags
                (hashtag_id, stream_unique_key, stream_scope_type, activity_id, activity_date, is_public)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.hashtag.id)
        .bind(&row.stream_unique_key)
        .bind(row.stream_scope_type.as_str())
        .bind(row.activity_id)
        .bind(row.activity_date)
        .bind(row.is_public)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hashtags used in a stream, most used first.
    ///
    /// Private associations are counted only when `include_private` is set.
    pub async fn stream_hashtag_counts(
        &self,
        scope: &StreamScope,
        include_private: bool,
        limit: i64,
    ) -> Result<Vec<StreamHashTagCount>, DbError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT h.content, COUNT(*) AS uses
            FROM stream_hashtags sh
            JOIN hashtags h ON h.id = sh.hashtag_id
            WHERE sh.stream_scope_type = ?
              AND sh.stream_unique_key = ? COLLATE NOCASE
              AND (sh.is_public = 1 OR ? = 1)
            GROUP BY h.content
            ORDER BY uses DESC, h.content ASC
            LIMIT ?
            "#,
        )
        .bind(scope.scope_type.as_str())
        .bind(&scope.unique_key)
        .bind(include_private)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(content, count)| StreamHashTagCount { content, count })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewActivity};
    use crate::stream::{BaseObject, BaseObjectType, ScopeType};

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn find_or_create_is_stable() {
        let db = Database::new(":memory:").await.unwrap();

        let first = db.hashtags().find_or_create(&tags(&["#a", "#b"])).await.unwrap();
        let second = db.hashtags().find_or_create(&tags(&["#b", "#c"])).await.unwrap();

        let b1 = first.iter().find(|t| t.content == "#b").unwrap();
        let b2 = second.iter().find(|t| t.content == "#b").unwrap();
        assert_eq!(b1.id, b2.id);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn find_by_contents_skips_unknown() {
        let db = Database::new(":memory:").await.unwrap();
        db.hashtags().find_or_create(&tags(&["#known"])).await.unwrap();

        let found = db
            .hashtags()
            .find_by_contents(&tags(&["#known", "#unknown"]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "#known");
        assert!(db.hashtags().find_by_contents(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stream_hashtag_insert_is_idempotent_and_counted() {
        let db = Database::new(":memory:").await.unwrap();
        let person = db.people().create("jdoe", "Jane", false).await.unwrap();
        let activity = db
            .activities()
            .insert(NewActivity {
                actor_person_id: person.id,
                recipient_stream_scope: StreamScope::group("g"),
                is_destination_stream_public: false,
                base_object_type: BaseObjectType::Note,
                base_object: BaseObject::new(),
            })
            .await
            .unwrap();
        let tag = db.hashtags().find_or_create(&tags(&["#x"])).await.unwrap().remove(0);

        let row = StreamHashTag {
            hashtag: tag,
            stream_unique_key: "g".to_string(),
            stream_scope_type: ScopeType::Group,
            activity_id: activity.id,
            activity_date: activity.posted_at,
            is_public: false,
        };
        assert!(db.hashtags().insert_stream_hashtag(&row).await.unwrap());
        assert!(!db.hashtags().insert_stream_hashtag(&row).await.unwrap());

        let scope = StreamScope::group("G");
        let public_only = db.hashtags().stream_hashtag_counts(&scope, false, 10).await.unwrap();
        assert!(public_only.is_empty());

        let all = db.hashtags().stream_hashtag_counts(&scope, true, 10).await.unwrap();
        assert_eq!(
            all,
            vec![StreamHashTagCount {
                content: "#x".to_string(),
                count: 1
            }]
        );
    }
}

//! Usage repository for database queries.

use super::models::{DailyUsageSummary, DayWindow};
use crate::db::DbError;
use crate::stream::StreamScope;
use chrono::NaiveDate;
use sqlx::SqlitePool;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for usage metrics and daily summaries.
pub struct UsageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UsageRepository<'a> {
    /// Create a new usage repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one usage metric at the given time.
    pub async fn record_metric(
        &self,
        actor_person_id: i64,
        is_page_view: bool,
        is_stream_view: bool,
        stream: Option<&StreamScope>,
        created_at: i64,
    ) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO usage_metrics (actor_person_id, is_page_view, is_stream_view,
                                       stream_scope_type, stream_unique_key, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(actor_person_id)
        .bind(is_page_view)
        .bind(is_stream_view)
        .bind(stream.map(|s| s.scope_type.as_str()))
        .bind(stream.map(|s| s.unique_key.as_str()))
        .bind(created_at)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Distinct people with any usage metric in the day.
    pub async fn unique_visitor_count(&self, day: NaiveDate) -> Result<i64, DbError> {
        self.metric_count(
            "SELECT COUNT(DISTINCT actor_person_id) FROM usage_metrics WHERE created_at >= ? AND created_at < ?",
            day,
        )
        .await
    }

    /// Page views in the day.
    pub async fn page_view_count(&self, day: NaiveDate) -> Result<i64, DbError> {
        self.metric_count(
            "SELECT COUNT(*) FROM usage_metrics WHERE is_page_view = 1 AND created_at >= ? AND created_at < ?",
            day,
        )
        .await
    }

    /// Distinct people who viewed a stream in the day.
    pub async fn stream_viewer_count(&self, day: NaiveDate) -> Result<i64, DbError> {
        self.metric_count(
            "SELECT COUNT(DISTINCT actor_person_id) FROM usage_metrics WHERE is_stream_view = 1 AND created_at >= ? AND created_at < ?",
            day,
        )
        .await
    }

    /// Stream views in the day.
    pub async fn stream_view_count(&self, day: NaiveDate) -> Result<i64, DbError> {
        self.metric_count(
            "SELECT COUNT(*) FROM usage_metrics WHERE is_stream_view = 1 AND created_at >= ? AND created_at < ?",
            day,
        )
        .await
    }

    /// Distinct people who posted an activity or a comment in the day.
    pub async fn stream_contributor_count(&self, day: NaiveDate) -> Result<i64, DbError> {
        let window = DayWindow::for_date(day);
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT person_id) FROM (
                SELECT actor_person_id AS person_id FROM activities
                WHERE posted_at >= ? AND posted_at < ?
                UNION
                SELECT author_person_id AS person_id FROM comments
                WHERE posted_at >= ? AND posted_at < ?
            )
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .bind(window.start)
        .bind(window.end)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Activities plus comments posted in the day.
    pub async fn message_count(&self, day: NaiveDate) -> Result<i64, DbError> {
        let window = DayWindow::for_date(day);
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM activities WHERE posted_at >= ? AND posted_at < ?) +
                (SELECT COUNT(*) FROM comments WHERE posted_at >= ? AND posted_at < ?)
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .bind(window.start)
        .bind(window.end)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Mean minutes from posting to first comment, over activities posted in
    /// the day that received a comment. Zero when there are none.
    pub async fn avg_activity_response_time(&self, day: NaiveDate) -> Result<i64, DbError> {
        let window = DayWindow::for_date(day);
        let minutes = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CAST(COALESCE(AVG(first_comment_at - posted_at), 0) / 60 AS INTEGER)
            FROM (
                SELECT a.posted_at AS posted_at, MIN(c.posted_at) AS first_comment_at
                FROM activities a
                JOIN comments c ON c.activity_id = a.id
                WHERE a.posted_at >= ? AND a.posted_at < ?
                GROUP BY a.id
            )
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(self.pool)
        .await?;

        Ok(minutes)
    }

    /// Load the summary stored for a date.
    pub async fn summary_by_date(&self, day: NaiveDate) -> Result<Option<DailyUsageSummary>, DbError> {
        let row = sqlx::query_as::<_, (String, i64, i64, i64, i64, i64, i64, i64)>(
            r#"
            SELECT usage_date, unique_visitor_count, page_view_count, stream_viewer_count,
                   stream_view_count, stream_contributor_count, message_count, avg_activity_response_time
            FROM daily_usage_summaries
            WHERE usage_date = ?
            "#,
        )
        .bind(day.format(DATE_FORMAT).to_string())
        .fetch_optional(self.pool)
        .await?;

        let Some((
            usage_date,
            unique_visitor_count,
            page_view_count,
            stream_viewer_count,
            stream_view_count,
            stream_contributor_count,
            message_count,
            avg_activity_response_time,
        )) = row
        else {
            return Ok(None);
        };

        let usage_date = NaiveDate::parse_from_str(&usage_date, DATE_FORMAT)
            .map_err(|e| DbError::CorruptRow(format!("usage_date {usage_date}: {e}")))?;

        Ok(Some(DailyUsageSummary {
            usage_date,
            unique_visitor_count,
            page_view_count,
            stream_viewer_count,
            stream_view_count,
            stream_contributor_count,
            message_count,
            avg_activity_response_time,
        }))
    }

    /// Insert a summary. Returns false when the date already has one.
    pub async fn insert_summary(&self, summary: &DailyUsageSummary) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO daily_usage_summaries
                (usage_date, unique_visitor_count, page_view_count, stream_viewer_count,
                 stream_view_count, stream_contributor_count, message_count,
                 avg_activity_response_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(summary.usage_date.format(DATE_FORMAT).to_string())
        .bind(summary.unique_visitor_count)
        .bind(summary.page_view_count)
        .bind(summary.stream_viewer_count)
        .bind(summary.stream_view_count)
        .bind(summary.stream_contributor_count)
        .bind(summary.message_count)
        .bind(summary.avg_activity_response_time)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete usage metrics recorded before `cutoff` (Unix seconds).
    pub async fn delete_metrics_before(&self, cutoff: i64) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM usage_metrics WHERE created_at < ?")
            .bind(cutoff)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn metric_count(&self, sql: &str, day: NaiveDate) -> Result<i64, DbError> {
        let window = DayWindow::for_date(day);
        let count = sqlx::query_scalar::<_, i64>(sql)
            .bind(window.start)
            .bind(window.end)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

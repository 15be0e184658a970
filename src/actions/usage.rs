//! Usage metrics and the daily usage summary.

use super::{Access, ActionContext, ExecutionStrategy, Services};
use crate::db::{Database, DbError, DailyUsageSummary};
use crate::error::ExecutionError;
use crate::stream::StreamScope;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds.
    fn now(&self) -> i64;

    /// Current UTC calendar date.
    fn today(&self) -> NaiveDate {
        DateTime::from_timestamp(self.now(), 0)
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

/// Wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// The UTC date `days` days before today.
pub fn days_ago(clock: &dyn Clock, days: i64) -> NaiveDate {
    clock.today() - TimeDelta::days(days)
}

/// Writes yesterday's usage summary if it does not exist yet.
pub struct GenerateDailyUsageSummary {
    db: Database,
    clock: Arc<dyn Clock>,
    retention_days: i64,
}

impl GenerateDailyUsageSummary {
    pub fn new(db: Database, clock: Arc<dyn Clock>, retention_days: i64) -> Self {
        Self {
            db,
            clock,
            retention_days,
        }
    }

    /// Returns true when a summary was written.
    pub async fn execute(&self) -> Result<bool, DbError> {
        let date = days_ago(self.clock.as_ref(), 1);
        let usage = self.db.usage();

        if usage.summary_by_date(date).await?.is_some() {
            info!(date = %date, "Daily usage summary already exists");
            return Ok(false);
        }

        let summary = DailyUsageSummary {
            usage_date: date,
            unique_visitor_count: usage.unique_visitor_count(date).await?,
            page_view_count: usage.page_view_count(date).await?,
            stream_viewer_count: usage.stream_viewer_count(date).await?,
            stream_view_count: usage.stream_view_count(date).await?,
            stream_contributor_count: usage.stream_contributor_count(date).await?,
            message_count: usage.message_count(date).await?,
            avg_activity_response_time: usage.avg_activity_response_time(date).await?,
        };

        if !usage.insert_summary(&summary).await? {
            info!(date = %date, "Daily usage summary written concurrently");
            return Ok(false);
        }

        let cutoff = self.clock.now() - TimeDelta::days(self.retention_days).num_seconds();
        let pruned = usage.delete_metrics_before(cutoff).await?;

        crate::metrics::record_summary_generated();
        info!(
            date = %date,
            unique_visitors = summary.unique_visitor_count,
            page_views = summary.page_view_count,
            messages = summary.message_count,
            pruned,
            "Generated daily usage summary"
        );

        Ok(true)
    }
}

/// `generate_daily_usage_summary`: run the summary on demand.
pub struct GenerateDailyUsageSummaryAction {
    inner: GenerateDailyUsageSummary,
}

impl GenerateDailyUsageSummaryAction {
    pub fn new(services: &Services) -> Self {
        Self {
            inner: services.daily_usage_summary(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for GenerateDailyUsageSummaryAction {
    fn access(&self) -> Access {
        Access::Administrator
    }

    async fn execute(&self, _ctx: &ActionContext) -> Result<Value, ExecutionError> {
        Ok(json!(self.inner.execute().await?))
    }
}

#[derive(Debug, Deserialize)]
struct RecordUsageParams {
    #[serde(default)]
    page_view: bool,
    #[serde(default)]
    stream_view: bool,
    stream: Option<StreamScope>,
}

/// `record_usage_metric`: log a page and/or stream view by the caller.
pub struct RecordUsageMetric {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl RecordUsageMetric {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
            clock: services.clock.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for RecordUsageMetric {
    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let principal = ctx.principal()?;
        let params: RecordUsageParams = ctx.params()?;
        if !params.page_view && !params.stream_view {
            return Err(ExecutionError::InvalidParams(
                "a metric needs page_view or stream_view".to_string(),
            ));
        }
        if params.stream_view && params.stream.is_none() {
            return Err(ExecutionError::InvalidParams(
                "stream_view requires a stream".to_string(),
            ));
        }

        let id = self
            .db
            .usage()
            .record_metric(
                principal.id,
                params.page_view,
                params.stream_view,
                params.stream.as_ref(),
                self.clock.now(),
            )
            .await?;

        Ok(json!(id))
    }
}

#[derive(Debug, Deserialize)]
struct SummaryParams {
    date: NaiveDate,
}

/// `get_daily_usage_summary`: the stored summary for a date.
pub struct GetDailyUsageSummary {
    db: Database,
}

impl GetDailyUsageSummary {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for GetDailyUsageSummary {
    fn access(&self) -> Access {
        Access::Administrator
    }

    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let params: SummaryParams = ctx.params()?;
        let summary = self
            .db
            .usage()
            .summary_by_date(params.date)
            .await?
            .ok_or_else(|| ExecutionError::NotFound(format!("usage summary for {}", params.date)))?;

        serde_json::to_value(summary).map_err(|e| ExecutionError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::actions::Registry;
    use crate::db::NewActivity;
    use crate::stream::{BaseObject, BaseObjectType};

    #[test]
    fn days_ago_crosses_month_boundary() {
        let clock = FixedClock(noon(2024, 3, 1));
        assert_eq!(
            days_ago(&clock, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(days_ago(&clock, 0), clock.today());
    }

    #[tokio::test]
    async fn summary_is_generated_once_per_day() {
        let services = services_at(noon(2024, 3, 2)).await;
        let jane = person(&services, "jdoe", false).await;
        let yesterday = noon(2024, 3, 1);

        let usage = services.db.usage();
        usage.record_metric(jane.id, true, false, None, yesterday).await.unwrap();
        usage.record_metric(jane.id, true, false, None, yesterday + 60).await.unwrap();
        services
            .db
            .activities()
            .insert_at(
                NewActivity {
                    actor_person_id: jane.id,
                    recipient_stream_scope: StreamScope::person("jdoe"),
                    is_destination_stream_public: true,
                    base_object_type: BaseObjectType::Note,
                    base_object: BaseObject::new(),
                },
                yesterday,
            )
            .await
            .unwrap();

        let strategy = services.daily_usage_summary();
        assert!(strategy.execute().await.unwrap());
        assert!(!strategy.execute().await.unwrap());

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let summary = usage.summary_by_date(date).await.unwrap().unwrap();
        assert_eq!(summary.unique_visitor_count, 1);
        assert_eq!(summary.page_view_count, 2);
        assert_eq!(summary.message_count, 1);
        assert_eq!(summary.stream_contributor_count, 1);
    }

    #[tokio::test]
    async fn cleanup_runs_only_when_summary_written() {
        let services = services_at(noon(2024, 3, 20)).await;
        let jane = person(&services, "jdoe", false).await;
        let usage = services.db.usage();
        let old = usage
            .record_metric(jane.id, true, false, None, noon(2024, 3, 1))
            .await
            .unwrap();
        assert!(old > 0);

        let existing = DailyUsageSummary {
            usage_date: NaiveDate::from_ymd_opt(2024, 3, 19).unwrap(),
            unique_visitor_count: 0,
            page_view_count: 0,
            stream_viewer_count: 0,
            stream_view_count: 0,
            stream_contributor_count: 0,
            message_count: 0,
            avg_activity_response_time: 0,
        };
        assert!(usage.insert_summary(&existing).await.unwrap());

        let strategy = services.daily_usage_summary();
        assert!(!strategy.execute().await.unwrap());
        // Summary existed, so the old metric survives.
        assert_eq!(usage.delete_metrics_before(noon(2024, 3, 2)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn written_summary_prunes_metrics_past_retention() {
        let services = services_at(noon(2024, 3, 20)).await;
        let jane = person(&services, "jdoe", false).await;
        let usage = services.db.usage();
        usage
            .record_metric(jane.id, true, false, None, noon(2024, 3, 1))
            .await
            .unwrap();
        usage
            .record_metric(jane.id, true, false, None, noon(2024, 3, 19))
            .await
            .unwrap();

        assert!(services.daily_usage_summary().execute().await.unwrap());

        // Retention is 7 days: the March 1st metric is gone, yesterday's stays.
        assert_eq!(usage.delete_metrics_before(noon(2024, 3, 2)).await.unwrap(), 0);
        assert_eq!(usage.delete_metrics_before(noon(2024, 3, 21)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn record_and_fetch_through_registry() {
        let services = services_at(noon(2024, 3, 2)).await;
        let registry = Registry::new(&services);
        let admin = person(&services, "admin", true).await;

        let id = registry
            .dispatch(
                "record_usage_metric",
                &ctx(
                    &admin,
                    json!({"stream_view": true, "stream": {"scope_type": "GROUP", "unique_key": "g"}}),
                ),
            )
            .await
            .unwrap();
        assert!(id.as_i64().is_some());

        let err = registry
            .dispatch("record_usage_metric", &ctx(&admin, json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidParams(_)));

        let err = registry
            .dispatch("get_daily_usage_summary", &ctx(&admin, json!({"date": "2024-03-01"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NotFound(_)));

        let written = registry
            .dispatch("generate_daily_usage_summary", &ctx(&admin, Value::Null))
            .await
            .unwrap();
        assert_eq!(written, json!(true));

        let summary = registry
            .dispatch("get_daily_usage_summary", &ctx(&admin, json!({"date": "2024-03-01"})))
            .await
            .unwrap();
        assert_eq!(summary["usage_date"], json!("2024-03-01"));
    }
}

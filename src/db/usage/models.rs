//! Usage database models.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One day of aggregated usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsageSummary {
    pub usage_date: NaiveDate,
    pub unique_visitor_count: i64,
    pub page_view_count: i64,
    pub stream_viewer_count: i64,
    pub stream_view_count: i64,
    pub stream_contributor_count: i64,
    pub message_count: i64,
    /// Mean minutes from posting to first comment.
    pub avg_activity_response_time: i64,
}

/// Half-open `[start, end)` range of Unix seconds covering one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: i64,
    pub end: i64,
}

impl DayWindow {
    const SECONDS_PER_DAY: i64 = 86_400;

    pub fn for_date(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN).and_utc().timestamp();
        Self {
            start,
            end: start + Self::SECONDS_PER_DAY,
        }
    }
}

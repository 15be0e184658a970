//! Usage metric repository for daily usage reporting.
//!
//! Raw usage metrics are recorded per request; the daily summary job rolls one
//! UTC day of metrics, activities and comments into a `DailyUsageSummary`.

pub mod models;
pub mod queries;

pub use models::DailyUsageSummary;
pub use queries::UsageRepository;

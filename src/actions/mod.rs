//! Action framework: named execution strategies and their registry.
//!
//! Every action is an [`ExecutionStrategy`] registered under a static name.
//! The registry checks the caller's access level, runs the strategy inside a
//! tracing span and records latency and error metrics.

mod people;
mod start;
mod stream;
pub mod usage;

use crate::cache::MemoryCache;
use crate::db::{Database, Person};
use crate::error::ExecutionError;
use crate::stream::{CachedHashTagMapper, StoreStreamHashTagsForActivity};
use crate::telemetry::{ActionTimer, spans};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug};

pub use usage::{Clock, GenerateDailyUsageSummary, SystemClock};

/// Who may invoke an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Administrator,
}

/// Per-invocation input: the caller and the JSON parameters.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub principal: Option<Person>,
    pub params: Value,
}

impl ActionContext {
    pub fn new(principal: Option<Person>, params: Value) -> Self {
        Self { principal, params }
    }

    /// The caller, or `Unauthenticated`.
    pub fn principal(&self) -> Result<&Person, ExecutionError> {
        self.principal.as_ref().ok_or(ExecutionError::Unauthenticated)
    }

    /// Decode the parameters. A missing body decodes from `null`.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, ExecutionError> {
        serde_json::from_value(self.params.clone())
            .map_err(|e| ExecutionError::InvalidParams(e.to_string()))
    }

    fn is_administrator(&self) -> bool {
        self.principal.as_ref().is_some_and(|p| p.is_administrator)
    }
}

/// One unit of business logic invoked by name.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn access(&self) -> Access {
        Access::Authenticated
    }

    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError>;
}

/// Shared collaborators handed to strategies at registration.
#[derive(Clone)]
pub struct Services {
    pub db: Database,
    pub cache: Arc<MemoryCache>,
    pub clock: Arc<dyn Clock>,
    pub hashtags: Arc<StoreStreamHashTagsForActivity>,
    /// Days of raw usage metrics kept after a summary is generated.
    pub usage_retention_days: i64,
}

impl Services {
    pub fn new(
        db: Database,
        cache: Arc<MemoryCache>,
        clock: Arc<dyn Clock>,
        usage_retention_days: i64,
    ) -> Self {
        let hashtags = Arc::new(StoreStreamHashTagsForActivity::new(
            Arc::new(CachedHashTagMapper::new(db.clone(), cache.clone())),
            Arc::new(db.clone()),
        ));
        Self {
            db,
            cache,
            clock,
            hashtags,
            usage_retention_days,
        }
    }

    /// The daily usage summary strategy wired to these services.
    pub fn daily_usage_summary(&self) -> GenerateDailyUsageSummary {
        GenerateDailyUsageSummary::new(
            self.db.clone(),
            self.clock.clone(),
            self.usage_retention_days,
        )
    }
}

/// Registry of execution strategies.
pub struct Registry {
    strategies: HashMap<&'static str, Box<dyn ExecutionStrategy>>,
}

impl Registry {
    /// Create a registry with every action registered.
    pub fn new(services: &Services) -> Self {
        let mut strategies: HashMap<&'static str, Box<dyn ExecutionStrategy>> = HashMap::new();

        // People
        strategies.insert(
            "get_system_administrator_ids",
            Box::new(people::GetSystemAdministratorIds::new(services)),
        );
        strategies.insert("register_person", Box::new(people::RegisterPerson::new(services)));

        // Streams
        strategies.insert("create_group", Box::new(stream::CreateGroup::new(services)));
        strategies.insert("post_activity", Box::new(stream::PostActivity::new(services)));
        strategies.insert("post_comment", Box::new(stream::PostComment::new(services)));
        strategies.insert(
            "get_stream_hashtags",
            Box::new(stream::GetStreamHashTags::new(services)),
        );

        // Usage
        strategies.insert(
            "generate_daily_usage_summary",
            Box::new(usage::GenerateDailyUsageSummaryAction::new(services)),
        );
        strategies.insert(
            "record_usage_metric",
            Box::new(usage::RecordUsageMetric::new(services)),
        );
        strategies.insert(
            "get_daily_usage_summary",
            Box::new(usage::GetDailyUsageSummary::new(services)),
        );

        // Start page
        strategies.insert("undelete_gadget", Box::new(start::UndeleteGadget::new(services)));
        strategies.insert("add_gadget", Box::new(start::AddGadget::new(services)));
        strategies.insert("delete_gadget", Box::new(start::DeleteGadget::new(services)));
        strategies.insert(
            "get_person_page_properties",
            Box::new(start::GetPersonPageProperties::new(services)),
        );

        Self { strategies }
    }

    /// Execute the named action for the caller in `ctx`.
    pub async fn dispatch(&self, name: &str, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let Some(strategy) = self.strategies.get(name) else {
            return Err(ExecutionError::UnknownAction(name.to_string()));
        };

        let span = spans::action(name, ctx.principal.as_ref().map(|p| p.account_id.as_str()));
        let _timer = ActionTimer::new(name);

        let result = async {
            match strategy.access() {
                Access::Public => {}
                Access::Authenticated => {
                    ctx.principal()?;
                }
                Access::Administrator => {
                    ctx.principal()?;
                    if !ctx.is_administrator() {
                        return Err(ExecutionError::Forbidden(format!(
                            "{name} requires an administrator"
                        )));
                    }
                }
            }
            strategy.execute(ctx).await
        }
        .instrument(span)
        .await;

        if let Err(ref e) = result {
            crate::metrics::record_action_error(name, e.error_code());
            debug!(action = %name, error = %e, "Action error");
        }

        result
    }
}

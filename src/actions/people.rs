//! People actions: administrators and registration.

use super::{Access, ActionContext, ExecutionStrategy, Services};
use crate::cache::{MemoryCache, keys};
use crate::db::Database;
use crate::error::ExecutionError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// `get_system_administrator_ids`: ids of every administrator, by id.
pub struct GetSystemAdministratorIds {
    db: Database,
    cache: Arc<MemoryCache>,
}

impl GetSystemAdministratorIds {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
            cache: services.cache.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for GetSystemAdministratorIds {
    async fn execute(&self, _ctx: &ActionContext) -> Result<Value, ExecutionError> {
        if let Some(ids) = self.cache.get::<Vec<i64>>(keys::SYSTEM_ADMINISTRATOR_IDS) {
            return Ok(json!(ids));
        }

        let ids = self.db.people().system_administrator_ids().await?;
        self.cache.set(keys::SYSTEM_ADMINISTRATOR_IDS, &ids);
        Ok(json!(ids))
    }
}

#[derive(Debug, Deserialize)]
struct RegisterParams {
    account_id: String,
    display_name: String,
    #[serde(default)]
    is_administrator: bool,
}

/// Account ids: 1-64 chars of letters, digits, `.`, `_` or `-`.
fn valid_account_id(account_id: &str) -> bool {
    !account_id.is_empty()
        && account_id.len() <= 64
        && account_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// `register_person`: create a person (administrators only).
pub struct RegisterPerson {
    db: Database,
    cache: Arc<MemoryCache>,
}

impl RegisterPerson {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
            cache: services.cache.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for RegisterPerson {
    fn access(&self) -> Access {
        Access::Administrator
    }

    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let params: RegisterParams = ctx.params()?;
        if !valid_account_id(&params.account_id) {
            return Err(ExecutionError::InvalidParams(format!(
                "invalid account id: {}",
                params.account_id
            )));
        }

        let person = self
            .db
            .people()
            .create(&params.account_id, &params.display_name, params.is_administrator)
            .await?;

        if person.is_administrator {
            self.cache.delete(keys::SYSTEM_ADMINISTRATOR_IDS);
        }

        info!(account = %person.account_id, admin = person.is_administrator, "Person registered");
        serde_json::to_value(&person).map_err(|e| ExecutionError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::actions::Registry;

    #[test]
    fn account_id_rules() {
        assert!(valid_account_id("j.doe-2"));
        assert!(!valid_account_id(""));
        assert!(!valid_account_id("has space"));
    }

    #[tokio::test]
    async fn administrator_ids_are_cached_and_invalidated() {
        let services = services().await;
        let registry = Registry::new(&services);
        let root = person(&services, "root", true).await;
        person(&services, "jdoe", false).await;

        let ids = registry
            .dispatch("get_system_administrator_ids", &ctx(&root, Value::Null))
            .await
            .unwrap();
        assert_eq!(ids, json!([root.id]));
        assert!(services.cache.get::<Vec<i64>>(keys::SYSTEM_ADMINISTRATOR_IDS).is_some());

        let added = registry
            .dispatch(
                "register_person",
                &ctx(
                    &root,
                    json!({"account_id": "ops", "display_name": "Ops", "is_administrator": true}),
                ),
            )
            .await
            .unwrap();
        assert!(services.cache.get::<Vec<i64>>(keys::SYSTEM_ADMINISTRATOR_IDS).is_none());

        let ids = registry
            .dispatch("get_system_administrator_ids", &ctx(&root, Value::Null))
            .await
            .unwrap();
        assert_eq!(ids, json!([root.id, added["id"]]));
    }

    #[tokio::test]
    async fn duplicate_account_conflicts() {
        let services = services().await;
        let registry = Registry::new(&services);
        let root = person(&services, "root", true).await;

        let err = registry
            .dispatch(
                "register_person",
                &ctx(&root, json!({"account_id": "ROOT", "display_name": "Again"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Conflict(_)));
    }
}

//! Start page actions: tabs and gadgets of the caller.

use super::{ActionContext, ExecutionStrategy, Services};
use crate::cache::{MemoryCache, keys};
use crate::db::{Database, GadgetUndeletionError, Tab};
use crate::error::ExecutionError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

const UNDELETE_FAILED: &str = "Error occurred undeleting gadget.";

#[derive(Debug, Deserialize)]
struct GadgetParams {
    gadget_id: i64,
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ExecutionError> {
    serde_json::to_value(value).map_err(|e| ExecutionError::Internal(e.to_string()))
}

/// Fail unless the gadget's tab belongs to `person_id`.
async fn check_gadget_owner(db: &Database, gadget_id: i64, person_id: i64) -> Result<(), ExecutionError> {
    match db.tabs().gadget_owner(gadget_id).await? {
        Some(owner) if owner == person_id => Ok(()),
        Some(_) => Err(ExecutionError::Forbidden(format!(
            "gadget {gadget_id} belongs to another person"
        ))),
        None => Err(ExecutionError::NotFound(format!("gadget {gadget_id}"))),
    }
}

/// `undelete_gadget`: restore a deleted gadget and return its tab.
pub struct UndeleteGadget {
    db: Database,
    cache: Arc<MemoryCache>,
}

impl UndeleteGadget {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
            cache: services.cache.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for UndeleteGadget {
    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let principal = ctx.principal()?;
        let params: GadgetParams = ctx.params()?;

        self.cache.delete(&keys::person_page_properties(principal.id));

        let tabs = self.db.tabs();
        match tabs.gadget_owner(params.gadget_id).await? {
            Some(owner) if owner == principal.id => {}
            Some(_) => {
                return Err(ExecutionError::Forbidden(format!(
                    "gadget {} belongs to another person",
                    params.gadget_id
                )));
            }
            None => {
                return Err(ExecutionError::execution(
                    UNDELETE_FAILED,
                    GadgetUndeletionError::NotFound(params.gadget_id),
                ));
            }
        }

        let tab = tabs
            .undelete_gadget(params.gadget_id)
            .await
            .map_err(|e| ExecutionError::execution(UNDELETE_FAILED, e))?;

        info!(gadget = params.gadget_id, tab = tab.id, "Gadget undeleted");
        to_value(&tab)
    }
}

#[derive(Debug, Deserialize)]
struct AddGadgetParams {
    definition_url: String,
    #[serde(default)]
    zone_number: i64,
}

/// `add_gadget`: put a gadget at the top of a zone on the start tab.
pub struct AddGadget {
    db: Database,
    cache: Arc<MemoryCache>,
}

impl AddGadget {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
            cache: services.cache.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for AddGadget {
    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let principal = ctx.principal()?;
        let params: AddGadgetParams = ctx.params()?;
        if params.definition_url.trim().is_empty() {
            return Err(ExecutionError::InvalidParams(
                "definition_url must not be empty".to_string(),
            ));
        }
        if params.zone_number < 0 {
            return Err(ExecutionError::InvalidParams(
                "zone_number must not be negative".to_string(),
            ));
        }

        let tabs = self.db.tabs();
        let tab = tabs.start_tab(principal.id).await?;
        let gadget = tabs
            .add_gadget(tab.id, &params.definition_url, params.zone_number)
            .await?;

        self.cache.delete(&keys::person_page_properties(principal.id));
        to_value(&gadget)
    }
}

/// `delete_gadget`: soft-delete a gadget and return its tab.
pub struct DeleteGadget {
    db: Database,
    cache: Arc<MemoryCache>,
}

impl DeleteGadget {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
            cache: services.cache.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for DeleteGadget {
    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let principal = ctx.principal()?;
        let params: GadgetParams = ctx.params()?;

        check_gadget_owner(&self.db, params.gadget_id, principal.id).await?;

        let tab = self.db.tabs().delete_gadget(params.gadget_id).await?;
        self.cache.delete(&keys::person_page_properties(principal.id));
        to_value(&tab)
    }
}

/// `get_person_page_properties`: the caller's tabs, read through the cache.
pub struct GetPersonPageProperties {
    db: Database,
    cache: Arc<MemoryCache>,
}

impl GetPersonPageProperties {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
            cache: services.cache.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for GetPersonPageProperties {
    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let principal = ctx.principal()?;
        let key = keys::person_page_properties(principal.id);

        if let Some(tabs) = self.cache.get::<Vec<Tab>>(&key) {
            return to_value(&tabs);
        }

        let tabs = self.db.tabs();
        let mut properties = tabs.tabs_for_person(principal.id).await?;
        if properties.is_empty() {
            properties.push(tabs.start_tab(principal.id).await?);
        }

        self.cache.set(key, &properties);
        to_value(&properties)
    }
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use shared::{
    domain::{EntityId, EntityStatus, ModerationAction, ModerationDomain},
    error::{ActionError, FetchError},
};

use thiserror::Error;

use crate::pagination::{Page, PagingMode};

pub type Filters = BTreeMap<String, String>;

/// One filter dimension an adapter accepts, with its allowed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: &'static str,
    pub allowed_values: &'static [&'static str],
    pub default: &'static str,
}

impl FilterSpec {
    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values.contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Unknown filter '{0}'")]
    UnknownName(String),
    #[error("'{value}' is not a valid {name} filter")]
    DisallowedValue { name: String, value: String },
}

pub fn default_filters(available: &[FilterSpec]) -> Filters {
    available
        .iter()
        .map(|filter| (filter.name.to_string(), filter.default.to_string()))
        .collect()
}

pub fn check_filter(available: &[FilterSpec], name: &str, value: &str) -> Result<(), FilterError> {
    let filter = available
        .iter()
        .find(|filter| filter.name == name)
        .ok_or_else(|| FilterError::UnknownName(name.to_string()))?;
    if filter.allows(value) {
        Ok(())
    } else {
        Err(FilterError::DisallowedValue {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Per-domain seam between the list controller and a backend.
#[async_trait]
pub trait ModerationAdapter: Send + Sync {
    fn domain(&self) -> ModerationDomain;

    /// In [`PagingMode::Client`] `list` returns the whole result set and the
    /// controller cuts pages itself.
    fn paging(&self) -> PagingMode {
        PagingMode::Server
    }

    fn describe_filters(&self) -> Vec<FilterSpec> {
        Vec::new()
    }

    fn target_status(&self, action: ModerationAction) -> EntityStatus;

    async fn list(&self, filters: &Filters, page_number: u32) -> Result<Page, FetchError>;

    async fn act(
        &self,
        id: &EntityId,
        action: ModerationAction,
    ) -> Result<EntityStatus, ActionError>;

    async fn bulk_act(
        &self,
        ids: &[EntityId],
        action: ModerationAction,
    ) -> Result<EntityStatus, ActionError>;

    /// Every id matching `filters` server-side, when the backend offers it.
    async fn all_ids(&self, _filters: &Filters) -> Result<Option<Vec<EntityId>>, FetchError> {
        Ok(None)
    }
}

//! Trait abstraction for the backend to enable mocking in tests

use super::BackendError;
use crate::session::Session;
use crate::state::forms::{FormMode, ReferenceSource};
use crate::state::{EntityKind, Record};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A selectable option in a reference dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOption {
    pub code: String,
    pub label: String,
}

impl ReferenceOption {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Loader and submit collaborator for entity forms and lists
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityBackend: Send + Sync {
    /// List all records of a kind
    async fn list(&self, session: &Session, kind: EntityKind) -> Result<Vec<Record>, BackendError>;

    /// Fetch one record by key
    async fn fetch(
        &self,
        session: &Session,
        kind: EntityKind,
        key: &str,
    ) -> Result<Record, BackendError>;

    /// Load options for a reference dropdown
    async fn load_options(
        &self,
        session: &Session,
        source: ReferenceSource,
    ) -> Result<Vec<ReferenceOption>, BackendError>;

    /// Persist a validated draft payload, returning the stored record
    async fn save(
        &self,
        session: &Session,
        kind: EntityKind,
        mode: &FormMode,
        payload: Record,
    ) -> Result<Record, BackendError>;

    /// Remove a record by key
    async fn delete(&self, session: &Session, kind: EntityKind, key: &str)
        -> Result<(), BackendError>;
}

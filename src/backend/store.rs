//! Local JSON-file store implementing the backend contract
//!
//! Records live in one JSON document keyed by entity kind. Every write is
//! applied to a copy, persisted, and only then committed, so a failed
//! write leaves both the file and the in-memory state untouched.

use super::{BackendError, EntityBackend, ReferenceOption};
use crate::session::Session;
use crate::state::forms::{FormMode, ReferenceSource};
use crate::state::{record_key, EntityKind, Record};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    records: BTreeMap<EntityKind, Vec<Record>>,
    #[serde(default)]
    next_ids: BTreeMap<EntityKind, u64>,
}

impl StoreData {
    fn records(&self, kind: EntityKind) -> &[Record] {
        self.records.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    fn position(&self, kind: EntityKind, key: &str) -> Option<usize> {
        self.records(kind)
            .iter()
            .position(|r| record_key(kind, r).as_deref() == Some(key))
    }

    /// Per-field conflicts with records other than `skip`
    fn conflicts(&self, kind: EntityKind, payload: &Record, skip: Option<usize>) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();
        for field in kind.unique_fields() {
            let Some(value) = payload.get(*field).and_then(Value::as_str) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let taken = self.records(kind).iter().enumerate().any(|(i, record)| {
                Some(i) != skip
                    && record
                        .get(*field)
                        .and_then(Value::as_str)
                        .is_some_and(|other| other.trim().eq_ignore_ascii_case(value))
            });
            if taken {
                errors.insert(field.to_string(), "already exists".to_string());
            }
        }
        errors
    }

    fn create(&mut self, kind: EntityKind, mut payload: Record) -> Result<Record, BackendError> {
        let key_field = kind.key_field();
        if kind.has_generated_key() {
            let next = self.next_ids.entry(kind).or_insert(0);
            *next += 1;
            payload.insert(key_field.to_string(), Value::from(*next));
        } else {
            let has_key = payload
                .get(key_field)
                .and_then(Value::as_str)
                .is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                return Err(BackendError::field(key_field, "is required"));
            }
        }

        let conflicts = self.conflicts(kind, &payload, None);
        if !conflicts.is_empty() {
            return Err(BackendError::Validation(conflicts));
        }

        let now = Value::from(Utc::now().to_rfc3339());
        payload.insert("created_at".to_string(), now.clone());
        payload.insert("updated_at".to_string(), now);
        self.records.entry(kind).or_default().push(payload.clone());
        Ok(payload)
    }

    fn update(&mut self, kind: EntityKind, key: &str, payload: Record) -> Result<Record, BackendError> {
        let index = self.position(kind, key).ok_or(BackendError::NotFound)?;

        let conflicts = self.conflicts(kind, &payload, Some(index));
        if !conflicts.is_empty() {
            return Err(BackendError::Validation(conflicts));
        }

        let records = self.records.entry(kind).or_default();
        let record = &mut records[index];
        let key_value = record.get(kind.key_field()).cloned();
        record.extend(payload);
        if let Some(key_value) = key_value {
            record.insert(kind.key_field().to_string(), key_value);
        }
        record.insert(
            "updated_at".to_string(),
            Value::from(Utc::now().to_rfc3339()),
        );
        Ok(record.clone())
    }

    fn delete(&mut self, kind: EntityKind, key: &str) -> Result<Record, BackendError> {
        let index = self.position(kind, key).ok_or(BackendError::NotFound)?;
        Ok(self.records.entry(kind).or_default().remove(index))
    }
}

/// Record store backed by a JSON file (or memory only)
#[derive(Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
    data: Mutex<StoreData>,
}

impl LocalStore {
    /// Open the store at `path`; a missing file starts empty
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(err) => return Err(err.into()),
        };
        tracing::info!(path = %path.display(), "opened record store");
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    /// A store that never touches disk
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(StoreData::default()),
        }
    }

    async fn persist(&self, data: &StoreData) -> Result<(), BackendError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    fn authorize(session: &Session) -> Result<(), BackendError> {
        if session.is_signed_in() {
            Ok(())
        } else {
            Err(BackendError::Unauthorized)
        }
    }
}

#[async_trait]
impl EntityBackend for LocalStore {
    async fn list(&self, session: &Session, kind: EntityKind) -> Result<Vec<Record>, BackendError> {
        Self::authorize(session)?;
        let data = self.data.lock().await;
        Ok(data.records(kind).to_vec())
    }

    async fn fetch(
        &self,
        session: &Session,
        kind: EntityKind,
        key: &str,
    ) -> Result<Record, BackendError> {
        Self::authorize(session)?;
        let data = self.data.lock().await;
        data.position(kind, key)
            .map(|i| data.records(kind)[i].clone())
            .ok_or(BackendError::NotFound)
    }

    async fn load_options(
        &self,
        session: &Session,
        source: ReferenceSource,
    ) -> Result<Vec<ReferenceOption>, BackendError> {
        Self::authorize(session)?;
        let data = self.data.lock().await;
        let options = data
            .records(source.kind())
            .iter()
            .filter_map(|record| {
                let code = match record.get(source.code_field())? {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                let label = record.get(source.label_field()).and_then(Value::as_str);
                let label = source.option_label(&code, label);
                Some(ReferenceOption { code, label })
            })
            .collect();
        Ok(options)
    }

    async fn save(
        &self,
        session: &Session,
        kind: EntityKind,
        mode: &FormMode,
        payload: Record,
    ) -> Result<Record, BackendError> {
        Self::authorize(session)?;
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let saved = match mode {
            FormMode::Create => next.create(kind, payload)?,
            FormMode::Edit { key } => next.update(kind, key, payload)?,
            FormMode::View { .. } => return Err(BackendError::Forbidden),
        };
        self.persist(&next).await?;
        *data = next;
        tracing::info!(user = %session.user, ?kind, key = ?record_key(kind, &saved), "record saved");
        Ok(saved)
    }

    async fn delete(&self, session: &Session, kind: EntityKind, key: &str) -> Result<(), BackendError> {
        Self::authorize(session)?;
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.delete(kind, key)?;
        self.persist(&next).await?;
        *data = next;
        tracing::info!(user = %session.user, ?kind, key, "record deleted");
        Ok(())
    }
}

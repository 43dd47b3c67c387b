//! Application state definitions

use super::forms::FormController;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// A record as the backend returns it
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Entities the console manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Application,
    Consultant,
    TopicArea,
    Task,
    Quote,
}

impl EntityKind {
    /// Sidebar order
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Project,
        EntityKind::Application,
        EntityKind::Consultant,
        EntityKind::TopicArea,
        EntityKind::Task,
        EntityKind::Quote,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Application => "Application",
            Self::Consultant => "Consultant",
            Self::TopicArea => "Topic area",
            Self::Task => "Task",
            Self::Quote => "Quote",
        }
    }

    pub fn plural_label(&self) -> &'static str {
        match self {
            Self::Project => "Projects",
            Self::Application => "Applications",
            Self::Consultant => "Consultants",
            Self::TopicArea => "Topic Areas",
            Self::Task => "Tasks",
            Self::Quote => "Quotes",
        }
    }

    /// Field holding the record's key
    pub fn key_field(&self) -> &'static str {
        match self {
            Self::Project => "project_code",
            Self::Application => "application_id",
            Self::Consultant => "consultant_id",
            Self::TopicArea => "topic_area_id",
            Self::Task => "task_id",
            Self::Quote => "quote_id",
        }
    }

    /// Field shown as the record's title in lists
    pub fn title_field(&self) -> &'static str {
        match self {
            Self::Project => "project_name",
            Self::Application => "status",
            Self::Consultant => "consultant_name",
            Self::TopicArea => "topic_area",
            Self::Task => "title",
            Self::Quote => "quote_status",
        }
    }

    /// Fields that must be unique across records of this kind
    pub fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Project => &["project_code", "project_name"],
            Self::TopicArea => &["topic_area"],
            _ => &[],
        }
    }

    /// Whether the backend assigns the key on create
    pub fn has_generated_key(&self) -> bool {
        !matches!(self, Self::Project)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(0)
    }
}

/// Key of a record as a string, whatever its JSON type
pub fn record_key(kind: EntityKind, record: &Record) -> Option<String> {
    match record.get(kind.key_field())? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One-line summary of a record for list views
pub fn record_summary(kind: EntityKind, record: &Record) -> String {
    let key = record_key(kind, record).unwrap_or_else(|| "?".to_string());
    let title = record
        .get(kind.title_field())
        .and_then(|v| v.as_str())
        .unwrap_or("");
    match kind {
        EntityKind::Application => {
            let project = record
                .get("project_code")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            format!("#{key}  {project}  {title}")
        }
        EntityKind::Project => format!("{key}  {title}"),
        _ => format!("#{key}  {title}"),
    }
}

/// A delete waiting for the user to confirm it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub kind: EntityKind,
    pub key: String,
    /// How the record is named in the prompt
    pub display: String,
    /// Whether "Delete" rather than "Cancel" is highlighted
    pub confirm_selected: bool,
}

impl PendingDelete {
    pub fn for_record(kind: EntityKind, record: &Record) -> Option<Self> {
        let key = record_key(kind, record)?;
        let noun = kind.label().to_lowercase();
        let title = record
            .get(kind.title_field())
            .and_then(|v| v.as_str())
            .map(str::trim)
            .unwrap_or("");
        let display = if kind == EntityKind::Application || title.is_empty() {
            format!("{noun} {key}")
        } else {
            format!("{noun} \"{title}\"")
        };
        Some(Self {
            kind,
            key,
            display,
            confirm_selected: false,
        })
    }
}

/// Current view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List(EntityKind),
    /// Waiting for the record an edit form is seeded from
    Loading(EntityKind),
    Form(EntityKind),
}

impl Default for View {
    fn default() -> Self {
        View::List(EntityKind::Project)
    }
}

impl View {
    pub fn kind(&self) -> EntityKind {
        match self {
            View::List(kind) | View::Loading(kind) | View::Form(kind) => *kind,
        }
    }
}

/// How long a toast stays on screen
const TOAST_TTL: Duration = Duration::from_secs(4);

/// Transient success message shown after navigation
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= TOAST_TTL
    }
}

/// Main application state
#[derive(Default)]
pub struct AppState {
    // Navigation
    pub current_view: View,

    // Data
    pub records: HashMap<EntityKind, Vec<Record>>,
    pub loading_lists: Vec<EntityKind>,

    // Selection
    pub selected_index: usize,

    // Mounted form, if any
    pub form: Option<FormController>,

    // Delete awaiting confirmation
    pub pending_delete: Option<PendingDelete>,

    // Messages
    pub toast: Option<Toast>,
    pub error_queue: VecDeque<String>,
}

impl AppState {
    /// Records loaded for a kind
    pub fn records_for(&self, kind: EntityKind) -> &[Record] {
        self.records.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The record under the list cursor
    pub fn selected_record(&self) -> Option<&Record> {
        self.records_for(self.current_view.kind())
            .get(self.selected_index)
    }

    /// Move selection down
    pub fn move_selection_down(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    /// Move selection up
    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// Replace a kind's records, keeping the cursor in range
    pub fn set_records(&mut self, kind: EntityKind, records: Vec<Record>) {
        self.loading_lists.retain(|k| *k != kind);
        let len = records.len();
        self.records.insert(kind, records);
        if self.current_view.kind() == kind && self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    /// Insert a saved record, replacing any record with the same key
    pub fn upsert_record(&mut self, kind: EntityKind, record: Record) {
        let key = record_key(kind, &record);
        let records = self.records.entry(kind).or_default();
        match records
            .iter_mut()
            .find(|existing| key.is_some() && record_key(kind, existing) == key)
        {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Drop a record by key, keeping the cursor in range
    pub fn remove_record(&mut self, kind: EntityKind, key: &str) {
        let Some(records) = self.records.get_mut(&kind) else {
            return;
        };
        records.retain(|record| record_key(kind, record).as_deref() != Some(key));
        let len = records.len();
        if self.current_view.kind() == kind && self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: String) {
        self.error_queue.push_back(message);
    }

    /// The error currently displayed, if any
    pub fn current_error(&self) -> Option<&str> {
        self.error_queue.front().map(String::as_str)
    }

    /// Dismiss the error currently displayed
    pub fn dismiss_error(&mut self) {
        self.error_queue.pop_front();
    }

    /// Show a success toast
    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message));
    }

    /// Drop the toast once it has been visible long enough
    pub fn expire_toast(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }
}

//! Application state and core logic

use crate::backend::{BackendError, EntityBackend, ReferenceOption};
use crate::session::{Session, USER_ENV};
use crate::state::forms::{
    catalog, FieldKind, FormController, FormMode, ReferenceSource, SubmitOutcome, SubmitTicket,
};
use crate::state::{record_key, AppState, EntityKind, PendingDelete, Record, View};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Completion of a spawned backend call
#[derive(Debug)]
pub enum AppEvent {
    ListLoaded {
        kind: EntityKind,
        result: Result<Vec<Record>, BackendError>,
    },
    RecordLoaded {
        load_id: Uuid,
        kind: EntityKind,
        mode: FormMode,
        result: Result<Record, BackendError>,
    },
    OptionsLoaded {
        form_id: Uuid,
        source: ReferenceSource,
        result: Result<Vec<ReferenceOption>, BackendError>,
    },
    Saved {
        form_id: Uuid,
        kind: EntityKind,
        result: Result<Record, BackendError>,
    },
    Deleted {
        kind: EntityKind,
        key: String,
        result: Result<(), BackendError>,
    },
}

/// User-facing text for a failed backend call
fn describe(err: &BackendError) -> String {
    match err {
        BackendError::Unauthorized => {
            format!("{err}. Set {USER_ENV} or \"user\" in config.json.")
        }
        other => other.to_string(),
    }
}

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Loader and submit collaborator
    backend: Arc<dyn EntityBackend>,
    /// Credentials passed to every backend call
    session: Session,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Record fetch an edit form is waiting on
    pending_edit: Option<Uuid>,
    /// Whether the app should quit
    quit: bool,
}

impl App {
    /// Create the app and start loading the first list.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(backend: Arc<dyn EntityBackend>, session: Session, start: EntityKind) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            state: AppState {
                current_view: View::List(start),
                ..Default::default()
            },
            backend,
            session,
            events_tx,
            events_rx,
            pending_edit: None,
            quit: false,
        };
        app.refresh_list(start);
        app
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.state.push_error(message.into());
    }

    /// Apply every completion that has arrived, without waiting
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
        self.state.expire_toast();
    }

    /// Wait for the next completion and apply it
    #[cfg(test)]
    pub async fn recv_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply_event(event);
                true
            }
            None => false,
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ListLoaded { kind, result } => match result {
                Ok(records) => {
                    tracing::debug!(?kind, count = records.len(), "list loaded");
                    self.state.set_records(kind, records);
                }
                Err(err) => {
                    tracing::warn!(?kind, error = %err.detail(), "failed to load list");
                    self.state.loading_lists.retain(|k| *k != kind);
                    let what = kind.plural_label().to_lowercase();
                    self.push_error(format!("Failed to load {what}: {}", describe(&err)));
                }
            },
            AppEvent::RecordLoaded {
                load_id,
                kind,
                mode,
                result,
            } => {
                if self.pending_edit != Some(load_id) {
                    tracing::debug!(%load_id, "dropping stale record load");
                    return;
                }
                self.pending_edit = None;
                match result {
                    Ok(record) => self.mount_form(kind, mode, Some(&record)),
                    Err(err) => {
                        tracing::warn!(?kind, key = ?mode.key(), error = %err.detail(), "failed to load record");
                        self.state.current_view = View::List(kind);
                        self.push_error(describe(&err));
                    }
                }
            }
            AppEvent::OptionsLoaded {
                form_id,
                source,
                result,
            } => match self.state.form.as_mut() {
                Some(form) if form.id() == form_id => form.apply_options(source, result),
                _ => tracing::debug!(%form_id, "dropping options for unmounted form"),
            },
            AppEvent::Saved {
                form_id,
                kind,
                result,
            } => {
                let Some(form) = self.state.form.as_mut().filter(|f| f.id() == form_id) else {
                    tracing::debug!(%form_id, "dropping result for unmounted form");
                    if result.is_ok() {
                        self.refresh_list(kind);
                    }
                    return;
                };
                if let SubmitOutcome::Saved { record, message } = form.finish_submit(result.into()) {
                    self.close_form();
                    self.state.upsert_record(kind, record);
                    self.state.show_toast(message);
                    self.refresh_list(kind);
                }
            }
            AppEvent::Deleted { kind, key, result } => match result {
                Ok(()) => {
                    self.state.remove_record(kind, &key);
                    self.state
                        .show_toast(format!("{} deleted successfully", kind.label()));
                    self.refresh_list(kind);
                }
                Err(err) => {
                    tracing::warn!(?kind, %key, error = %err.detail(), "failed to delete record");
                    let what = kind.label().to_lowercase();
                    self.push_error(format!("Failed to delete {what}: {}", describe(&err)));
                }
            },
        }
    }

    /// Handle a key press for the current view
    pub fn handle_key(&mut self, key: KeyEvent) {
        // Error dialog is modal
        if self.state.current_error().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_error();
            }
            return;
        }
        if self.state.pending_delete.is_some() {
            self.handle_delete_key(key);
            return;
        }

        match self.state.current_view {
            View::List(kind) => self.handle_list_key(kind, key),
            View::Loading(kind) => {
                if key.code == KeyCode::Esc {
                    self.pending_edit = None;
                    self.state.current_view = View::List(kind);
                }
            }
            View::Form(_) => self.handle_form_key(key),
        }
    }

    fn handle_list_key(&mut self, kind: EntityKind, key: KeyEvent) {
        let count = self.state.records_for(kind).len();
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_selection_down(count),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_selection_up(),
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => {
                let next = (kind.index() + 1) % EntityKind::ALL.len();
                self.select_kind(EntityKind::ALL[next]);
            }
            KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => {
                let len = EntityKind::ALL.len();
                let prev = (kind.index() + len - 1) % len;
                self.select_kind(EntityKind::ALL[prev]);
            }
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                if let Some(kind) = EntityKind::from_index(index) {
                    self.select_kind(kind);
                }
            }
            KeyCode::Char('r') => self.refresh_list(kind),
            KeyCode::Char('n') => self.mount_form(kind, FormMode::Create, None),
            KeyCode::Enter | KeyCode::Char('e') => self.open_selected(kind, false),
            KeyCode::Char('v') => self.open_selected(kind, true),
            KeyCode::Char('d') => {
                self.state.pending_delete = self
                    .state
                    .selected_record()
                    .and_then(|record| PendingDelete::for_record(kind, record));
            }
            _ => {}
        }
    }

    fn handle_delete_key(&mut self, key: KeyEvent) {
        let Some(pending) = self.state.pending_delete.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Up
            | KeyCode::Down
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Tab
            | KeyCode::BackTab => pending.confirm_selected = !pending.confirm_selected,
            KeyCode::Enter => {
                if pending.confirm_selected {
                    self.start_delete();
                } else {
                    self.state.pending_delete = None;
                }
            }
            KeyCode::Char('y') => self.start_delete(),
            KeyCode::Esc | KeyCode::Char('n') => self.state.pending_delete = None,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.state.form.as_mut() else {
            return;
        };
        let active_kind = form
            .active_field_name()
            .and_then(|name| form.schema().field(name))
            .map(|spec| spec.kind);

        let plain = key.modifiers == KeyModifiers::NONE || key.modifiers == KeyModifiers::SHIFT;

        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.start_submit();
            }
            KeyCode::Char('e') if plain && form.is_read_only() => {
                if let Some(code) = form.mode().key().map(str::to_string) {
                    let kind = form.kind();
                    self.close_form();
                    self.load_record(kind, FormMode::Edit { key: code });
                }
            }
            KeyCode::Esc => {
                if form.general_error().is_some() {
                    form.dismiss_general_error();
                } else {
                    self.cancel_form();
                }
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left | KeyCode::Right => {
                if let Some(name) = form.active_field_name() {
                    form.cycle_choice(name, key.code == KeyCode::Right);
                }
            }
            KeyCode::Char(' ') if active_kind == Some(FieldKind::Flag) => {
                form.toggle_active_flag();
            }
            KeyCode::Enter => match active_kind {
                Some(FieldKind::Text { multiline: true }) => {
                    form.input_char('\n');
                }
                Some(FieldKind::Flag) => {
                    form.toggle_active_flag();
                }
                _ => form.next_field(),
            },
            KeyCode::Char(c) if plain => {
                form.input_char(c);
            }
            KeyCode::Backspace => {
                form.backspace();
            }
            _ => {}
        }
    }

    /// Switch the list view to another entity kind
    pub fn select_kind(&mut self, kind: EntityKind) {
        self.state.current_view = View::List(kind);
        self.state.selected_index = 0;
        if !self.state.records.contains_key(&kind) {
            self.refresh_list(kind);
        }
    }

    /// Reload a kind's records in the background
    pub fn refresh_list(&mut self, kind: EntityKind) {
        if !self.state.loading_lists.contains(&kind) {
            self.state.loading_lists.push(kind);
        }
        let backend = Arc::clone(&self.backend);
        let session = self.session.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.list(&session, kind).await;
            let _ = tx.send(AppEvent::ListLoaded { kind, result });
        });
    }

    /// Open the selected record for editing, or read-only
    fn open_selected(&mut self, kind: EntityKind, read_only: bool) {
        let Some(key) = self
            .state
            .selected_record()
            .and_then(|record| record_key(kind, record))
        else {
            return;
        };
        let mode = if read_only {
            FormMode::View { key }
        } else {
            FormMode::Edit { key }
        };
        self.load_record(kind, mode);
    }

    /// Fetch a record, then mount it in a form with `mode`
    fn load_record(&mut self, kind: EntityKind, mode: FormMode) {
        let Some(key) = mode.key().map(str::to_string) else {
            return;
        };
        let load_id = Uuid::new_v4();
        self.pending_edit = Some(load_id);
        self.state.current_view = View::Loading(kind);

        let backend = Arc::clone(&self.backend);
        let session = self.session.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch(&session, kind, &key).await;
            let _ = tx.send(AppEvent::RecordLoaded {
                load_id,
                kind,
                mode,
                result,
            });
        });
    }

    /// Delete the record awaiting confirmation in the background
    fn start_delete(&mut self) {
        let Some(PendingDelete { kind, key, .. }) = self.state.pending_delete.take() else {
            return;
        };
        tracing::debug!(?kind, %key, "deleting record");
        let backend = Arc::clone(&self.backend);
        let session = self.session.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.delete(&session, kind, &key).await;
            let _ = tx.send(AppEvent::Deleted { kind, key, result });
        });
    }

    /// Mount a form and start loading its reference options
    fn mount_form(&mut self, kind: EntityKind, mode: FormMode, initial: Option<&Record>) {
        let form = FormController::seed(catalog::schema_for(kind), mode, initial);
        tracing::debug!(form = %form.id(), ?kind, mode = ?form.mode(), "form mounted");

        for source in form.pending_sources() {
            let form_id = form.id();
            let backend = Arc::clone(&self.backend);
            let session = self.session.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let result = backend.load_options(&session, source).await;
                let _ = tx.send(AppEvent::OptionsLoaded {
                    form_id,
                    source,
                    result,
                });
            });
        }

        self.state.form = Some(form);
        self.state.current_view = View::Form(kind);
    }

    /// Validate and, if valid, save the mounted form in the background
    fn start_submit(&mut self) {
        let Some(form) = self.state.form.as_mut() else {
            return;
        };
        let Some(ticket) = form.begin_submit() else {
            return;
        };
        let SubmitTicket {
            form_id,
            kind,
            mode,
            payload,
        } = ticket;

        let backend = Arc::clone(&self.backend);
        let session = self.session.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.save(&session, kind, &mode, payload).await;
            let _ = tx.send(AppEvent::Saved {
                form_id,
                kind,
                result,
            });
        });
    }

    fn cancel_form(&mut self) {
        if let Some(form) = self.state.form.as_mut() {
            form.cancel();
        }
        self.close_form();
    }

    fn close_form(&mut self) {
        let kind = self.state.current_view.kind();
        self.state.form = None;
        self.state.current_view = View::List(kind);
    }
}

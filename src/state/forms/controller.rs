//! Entity form controller
//!
//! Owns one form's draft and error map and drives the
//! `Idle -> Submitting -> Idle` submission lifecycle. Nothing here panics or
//! returns an error to the caller: every collaborator failure ends up as
//! field errors or a general error on the controller.

use super::draft::{Draft, ErrorMap};
use super::schema::{FieldKind, OptionSource, ReferenceSource, Schema};
use super::value::FieldValue;
use crate::backend::{BackendError, ReferenceOption};
use crate::state::{EntityKind, Record};
#[cfg(test)]
use crate::{backend::EntityBackend, session::Session};
use std::collections::HashMap;
use uuid::Uuid;

/// Whether the form creates, edits or only shows a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { key: String },
    /// Read-only details of an existing record
    View { key: String },
}

impl FormMode {
    pub fn is_edit(&self) -> bool {
        matches!(self, FormMode::Edit { .. })
    }

    pub fn is_view(&self) -> bool {
        matches!(self, FormMode::View { .. })
    }

    /// Key of the record being edited or viewed
    pub fn key(&self) -> Option<&str> {
        match self {
            FormMode::Create => None,
            FormMode::Edit { key } | FormMode::View { key } => Some(key),
        }
    }
}

/// Submission state visible to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
}

/// Outcome of one call to the submit collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResult {
    Success(Record),
    ValidationRejected(ErrorMap),
    Failure(String),
}

impl From<Result<Record, BackendError>> for SubmissionResult {
    fn from(result: Result<Record, BackendError>) -> Self {
        match result {
            Ok(record) => SubmissionResult::Success(record),
            Err(BackendError::Validation(errors)) if !errors.is_empty() => {
                SubmissionResult::ValidationRejected(errors)
            }
            Err(err) => SubmissionResult::Failure(err.to_string()),
        }
    }
}

/// What a submit attempt amounted to, for the caller to act on
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Client validation failed; the collaborator was not called
    Invalid,
    /// A submission is already in flight; this attempt was dropped
    Busy,
    /// Saved; the caller navigates away carrying `message`
    Saved { record: Record, message: String },
    /// The server rejected individual fields
    Rejected,
    /// General failure, exposed through `general_error`
    Failed(String),
}

/// Everything the submit collaborator needs, captured at submit time
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    pub form_id: Uuid,
    pub kind: EntityKind,
    pub mode: FormMode,
    pub payload: Record,
}

/// Load state of a reference option list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsState {
    Loading,
    Ready(Vec<ReferenceOption>),
    Failed(String),
}

/// Controller for a single mounted entity form
#[derive(Debug, Clone)]
pub struct FormController {
    id: Uuid,
    schema: &'static Schema,
    mode: FormMode,
    draft: Draft,
    errors: ErrorMap,
    general_error: Option<String>,
    state: SubmitState,
    options: HashMap<&'static str, OptionsState>,
    active_field: usize,
}

impl FormController {
    /// Mount a form, seeding the draft from `initial` (edit) or defaults (create)
    pub fn seed(schema: &'static Schema, mode: FormMode, initial: Option<&Record>) -> Self {
        let options = schema
            .fields
            .iter()
            .filter(|spec| matches!(spec.kind, FieldKind::Choice(OptionSource::Reference(_))))
            .map(|spec| (spec.name, OptionsState::Loading))
            .collect();
        Self {
            id: Uuid::new_v4(),
            schema,
            mode,
            draft: Draft::seed(schema, initial),
            errors: ErrorMap::new(),
            general_error: None,
            state: SubmitState::Idle,
            options,
            active_field: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn general_error(&self) -> Option<&str> {
        self.general_error.as_deref()
    }

    #[cfg(test)]
    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmitState::Submitting
    }

    /// Whether a field ignores edits in the current mode
    pub fn is_locked(&self, name: &str) -> bool {
        match self.mode {
            FormMode::Create => false,
            FormMode::Edit { .. } => self.schema.field(name).is_some_and(|spec| spec.locked_on_edit),
            FormMode::View { .. } => true,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.mode.is_view()
    }

    /// Apply a field change: write, run conditional clears, drop the field's error.
    ///
    /// Returns false for unknown or locked fields, which are left untouched.
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        if self.is_locked(name) {
            tracing::debug!(field = name, "ignoring edit of locked field");
            return false;
        }
        let trigger_value = value.as_text().to_string();
        if !self.draft.set(name, value) {
            tracing::debug!(field = name, "ignoring edit of unknown field");
            return false;
        }
        for dependent in self.schema.clears_for(name, &trigger_value) {
            self.draft.clear(dependent);
            self.errors.remove(dependent);
        }
        self.errors.remove(name);
        self.clamp_active_field();
        true
    }

    /// Validate the current draft against the schema
    pub fn validate(&self) -> ErrorMap {
        self.schema.validate(&self.draft)
    }

    /// Start a submission.
    ///
    /// Returns `None` when a submission is already in flight or when the
    /// draft is invalid (errors are surfaced). Otherwise the form is
    /// `Submitting` until [`finish_submit`](Self::finish_submit) is called.
    pub fn begin_submit(&mut self) -> Option<SubmitTicket> {
        if self.is_submitting() {
            tracing::debug!(form = %self.id, "submit dropped, already submitting");
            return None;
        }
        if self.is_read_only() {
            tracing::debug!(form = %self.id, "submit ignored on read-only form");
            return None;
        }
        let errors = self.validate();
        if !errors.is_empty() {
            tracing::debug!(form = %self.id, fields = errors.len(), "client validation failed");
            self.errors = errors;
            self.general_error = None;
            return None;
        }
        self.errors.clear();
        self.general_error = None;
        self.state = SubmitState::Submitting;
        Some(SubmitTicket {
            form_id: self.id,
            kind: self.kind(),
            mode: self.mode.clone(),
            payload: self.draft.to_payload(self.schema),
        })
    }

    /// Apply the collaborator's result and return to `Idle`
    pub fn finish_submit(&mut self, result: SubmissionResult) -> SubmitOutcome {
        self.state = SubmitState::Idle;
        match result {
            SubmissionResult::Success(record) => {
                self.errors.clear();
                self.general_error = None;
                tracing::info!(form = %self.id, kind = ?self.kind(), "saved");
                SubmitOutcome::Saved {
                    record,
                    message: self.success_message(),
                }
            }
            SubmissionResult::ValidationRejected(field_errors) => {
                tracing::warn!(form = %self.id, fields = field_errors.len(), "server rejected fields");
                self.errors.extend(field_errors);
                SubmitOutcome::Rejected
            }
            SubmissionResult::Failure(message) => {
                tracing::warn!(form = %self.id, error = %message, "submit failed");
                self.general_error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Validate and, if valid, save through `backend`
    #[cfg(test)]
    pub async fn submit<B>(&mut self, backend: &B, session: &Session) -> SubmitOutcome
    where
        B: EntityBackend + ?Sized,
    {
        if self.is_submitting() {
            return SubmitOutcome::Busy;
        }
        let Some(ticket) = self.begin_submit() else {
            return SubmitOutcome::Invalid;
        };
        let result = backend
            .save(session, ticket.kind, &ticket.mode, ticket.payload)
            .await;
        self.finish_submit(result.into())
    }

    /// Message the caller shows after navigating away
    pub fn success_message(&self) -> String {
        let verb = if self.mode.key().is_some() { "updated" } else { "created" };
        format!("{} {} successfully", self.kind().label(), verb)
    }

    /// Abandon the form. Returns true if a submission was still in flight;
    /// its result must then be discarded by id.
    pub fn cancel(&mut self) -> bool {
        let in_flight = self.is_submitting();
        if in_flight {
            tracing::debug!(form = %self.id, "cancelled while submitting");
        }
        self.state = SubmitState::Idle;
        in_flight
    }

    /// Dismiss the general error banner
    pub fn dismiss_general_error(&mut self) {
        self.general_error = None;
    }

    /// Reference lists this form still needs, one per source
    pub fn pending_sources(&self) -> Vec<ReferenceSource> {
        let mut sources = Vec::new();
        for spec in self.schema.fields {
            if !matches!(self.options.get(spec.name), Some(OptionsState::Loading)) {
                continue;
            }
            if let FieldKind::Choice(OptionSource::Reference(source)) = spec.kind {
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
        }
        sources
    }

    /// Record the loader's result for every field fed by `source`
    pub fn apply_options(
        &mut self,
        source: ReferenceSource,
        result: Result<Vec<ReferenceOption>, BackendError>,
    ) {
        let state = match result {
            Ok(options) => OptionsState::Ready(options),
            Err(err) => {
                tracing::warn!(?source, error = %err.detail(), "failed to load options");
                let what = source.kind().plural_label().to_lowercase();
                OptionsState::Failed(format!("Failed to load {what}"))
            }
        };
        for spec in self.schema.fields {
            if spec.kind == FieldKind::Choice(OptionSource::Reference(source)) {
                self.options.insert(spec.name, state.clone());
            }
        }
    }

    pub fn options(&self, name: &str) -> Option<&OptionsState> {
        self.options.get(name)
    }

    /// Option codes a choice field can cycle through
    pub fn choices(&self, name: &str) -> Vec<String> {
        match self.schema.field(name).map(|spec| spec.kind) {
            Some(FieldKind::Choice(OptionSource::Fixed(options))) => {
                options.iter().map(|o| o.to_string()).collect()
            }
            Some(FieldKind::Choice(OptionSource::Reference(_))) => match self.options.get(name) {
                Some(OptionsState::Ready(options)) => {
                    options.iter().map(|o| o.code.clone()).collect()
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Label to show for a choice value, falling back to the code
    pub fn choice_label(&self, name: &str, code: &str) -> String {
        match self.options.get(name) {
            Some(OptionsState::Ready(options)) => options
                .iter()
                .find(|o| o.code == code)
                .map(|o| o.label.clone())
                .unwrap_or_else(|| code.to_string()),
            _ => code.to_string(),
        }
    }

    /// Cycle a choice field forward or backward through its options.
    ///
    /// Optional fields get an extra empty stop so they can be unset.
    pub fn cycle_choice(&mut self, name: &str, forward: bool) -> bool {
        let mut choices = self.choices(name);
        if choices.is_empty() {
            return false;
        }
        if self.schema.field(name).is_some_and(|spec| spec.is_optional()) {
            choices.insert(0, String::new());
        }
        let current = choices.iter().position(|c| c == self.draft.text(name));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => choices.len() - 1,
            (Some(i), true) => (i + 1) % choices.len(),
            (Some(0), false) => choices.len() - 1,
            (Some(i), false) => i - 1,
        };
        self.set_field(name, FieldValue::Choice(choices[next].clone()))
    }

    /// Errors keyed to fields that are not on screen, as `Label: message`.
    ///
    /// Server rejections can name hidden or undeclared fields; these have
    /// no field line to sit under.
    pub fn unplaced_errors(&self) -> Vec<String> {
        let visible = self.visible_fields();
        self.errors
            .iter()
            .filter(|(name, _)| !visible.contains(&name.as_str()))
            .map(|(name, message)| {
                let label = self.schema.field(name).map_or(name.as_str(), |spec| spec.label);
                format!("{label}: {message}")
            })
            .collect()
    }

    /// Names of the fields currently shown, in schema order
    pub fn visible_fields(&self) -> Vec<&'static str> {
        self.schema
            .visible_fields(&self.draft)
            .into_iter()
            .map(|spec| spec.name)
            .collect()
    }

    pub fn active_field(&self) -> usize {
        self.active_field
    }

    pub fn active_field_name(&self) -> Option<&'static str> {
        self.visible_fields().get(self.active_field).copied()
    }

    pub fn next_field(&mut self) {
        let count = self.visible_fields().len();
        if count > 0 {
            self.active_field = (self.active_field + 1) % count;
        }
    }

    pub fn prev_field(&mut self) {
        let count = self.visible_fields().len();
        if count == 0 {
            return;
        }
        if self.active_field == 0 {
            self.active_field = count - 1;
        } else {
            self.active_field -= 1;
        }
    }

    /// Type a character into the active text field
    pub fn input_char(&mut self, c: char) -> bool {
        self.edit_active_text(|value| value.push_char(c))
    }

    /// Delete the last character of the active text field
    pub fn backspace(&mut self) -> bool {
        self.edit_active_text(FieldValue::pop_char)
    }

    /// Toggle the active field if it is a flag
    pub fn toggle_active_flag(&mut self) -> bool {
        let Some(name) = self.active_field_name() else {
            return false;
        };
        if self.schema.field(name).map(|spec| spec.kind) != Some(FieldKind::Flag) {
            return false;
        }
        let current = self.draft.flag(name);
        self.set_field(name, FieldValue::Flag(!current))
    }

    fn edit_active_text(&mut self, edit: impl FnOnce(&mut FieldValue)) -> bool {
        let Some(name) = self.active_field_name() else {
            return false;
        };
        let Some(current) = self.draft.get(name) else {
            return false;
        };
        if !matches!(current, FieldValue::Text(_)) {
            return false;
        }
        let mut value = current.clone();
        edit(&mut value);
        self.set_field(name, value)
    }

    fn clamp_active_field(&mut self) {
        let count = self.visible_fields().len();
        if count > 0 && self.active_field >= count {
            self.active_field = count - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LocalStore, MockEntityBackend};
    use crate::state::forms::catalog;
    use mockall::predicate::eq;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn session() -> Session {
        Session::new("tester")
    }

    fn application_form() -> FormController {
        FormController::seed(
            catalog::schema_for(EntityKind::Application),
            FormMode::Create,
            None,
        )
    }

    fn valid_application() -> FormController {
        let mut form = application_form();
        form.set_field("project_code", FieldValue::Choice("ABCD".to_string()));
        form.set_field("status", FieldValue::Choice("Development".to_string()));
        form
    }

    mod seeding {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_create_form_starts_idle_with_defaults() {
            let form = application_form();
            let schema = catalog::schema_for(EntityKind::Application);
            assert_eq!(form.draft(), &Draft::defaults(schema));
            assert!(form.errors().is_empty());
            assert_eq!(form.state(), SubmitState::Idle);
            assert!(form.general_error().is_none());
        }

        #[test]
        fn test_forms_get_distinct_ids() {
            assert_ne!(application_form().id(), application_form().id());
        }

        #[test]
        fn test_reference_fields_start_loading() {
            let form = application_form();
            assert_eq!(form.options("project_code"), Some(&OptionsState::Loading));
            assert_eq!(form.pending_sources(), vec![ReferenceSource::Projects]);
        }
    }

    mod set_field {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_leaving_withdrawn_clears_reason() {
            let mut form = application_form();
            form.set_field("status", FieldValue::Choice("Withdrawn".to_string()));
            form.set_field("reason_withdrawn", FieldValue::Text("Funding".to_string()));

            form.set_field("status", FieldValue::Choice("Development".to_string()));
            assert_eq!(form.draft().text("reason_withdrawn"), "");
        }

        #[test]
        fn test_leaving_determined_clears_outcome() {
            let mut form = application_form();
            form.set_field("status", FieldValue::Choice("Determined".to_string()));
            form.set_field("outcome", FieldValue::Choice("Refused".to_string()));

            form.set_field("status", FieldValue::Choice("Withdrawn".to_string()));
            assert_eq!(form.draft().text("outcome"), "");
        }

        #[test]
        fn test_unrelated_change_does_not_clear() {
            let mut form = application_form();
            form.set_field("status", FieldValue::Choice("Withdrawn".to_string()));
            form.set_field("reason_withdrawn", FieldValue::Text("Funding".to_string()));

            form.set_field("project_code", FieldValue::Choice("WXYZ".to_string()));
            assert_eq!(form.draft().text("reason_withdrawn"), "Funding");
        }

        #[test]
        fn test_change_clears_only_that_fields_error() {
            let mut form = application_form();
            form.set_field("status", FieldValue::Choice("Withdrawn".to_string()));
            assert!(form.begin_submit().is_none());
            assert!(form.errors().contains_key("project_code"));
            assert!(form.errors().contains_key("reason_withdrawn"));

            form.set_field("project_code", FieldValue::Choice("ABCD".to_string()));
            assert!(!form.errors().contains_key("project_code"));
            assert!(form.errors().contains_key("reason_withdrawn"));
        }

        #[test]
        fn test_locked_field_rejected_on_edit() {
            let initial = record(json!({ "project_code": "ABCD", "project_name": "Riverside" }));
            let mut form = FormController::seed(
                catalog::schema_for(EntityKind::Project),
                FormMode::Edit {
                    key: "ABCD".to_string(),
                },
                Some(&initial),
            );
            assert!(!form.set_field("project_code", FieldValue::Text("ZZZZ".to_string())));
            assert_eq!(form.draft().text("project_code"), "ABCD");
            assert!(form.set_field("project_name", FieldValue::Text("Hillside".to_string())));
        }

        #[test]
        fn test_unknown_field_rejected() {
            let mut form = application_form();
            assert!(!form.set_field("colour", FieldValue::Text("red".to_string())));
        }

        #[test]
        fn test_visibility_follows_status() {
            let mut form = application_form();
            assert!(!form.visible_fields().contains(&"reason_withdrawn"));
            form.set_field("status", FieldValue::Choice("Withdrawn".to_string()));
            assert!(form.visible_fields().contains(&"reason_withdrawn"));
            assert!(!form.visible_fields().contains(&"outcome"));
        }
    }

    mod submit {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_invalid_draft_never_reaches_collaborator() {
            let mut backend = MockEntityBackend::new();
            backend.expect_save().times(0);

            let mut form = application_form();
            let outcome = form.submit(&backend, &session()).await;

            assert_eq!(outcome, SubmitOutcome::Invalid);
            assert_eq!(
                form.errors().get("project_code").map(String::as_str),
                Some("Project is required")
            );
            assert_eq!(form.state(), SubmitState::Idle);
        }

        #[tokio::test]
        async fn test_valid_draft_submits_once_and_returns_idle() {
            let expected = record(json!({
                "project_code": "ABCD",
                "status": "Development",
                "reason_withdrawn": null,
                "outcome": null,
            }));
            let mut backend = MockEntityBackend::new();
            backend
                .expect_save()
                .with(
                    mockall::predicate::always(),
                    eq(EntityKind::Application),
                    eq(FormMode::Create),
                    eq(expected.clone()),
                )
                .times(1)
                .returning(|_, _, _, payload| {
                    let mut saved = payload;
                    saved.insert("application_id".to_string(), json!(1));
                    Ok(saved)
                });

            let mut form = valid_application();
            let outcome = form.submit(&backend, &session()).await;

            match outcome {
                SubmitOutcome::Saved { record, message } => {
                    assert_eq!(record.get("application_id"), Some(&json!(1)));
                    assert_eq!(message, "Application created successfully");
                }
                other => panic!("unexpected outcome {other:?}"),
            }
            assert_eq!(form.state(), SubmitState::Idle);
            assert!(form.errors().is_empty());
        }

        #[tokio::test]
        async fn test_field_rejection_is_merged() {
            let mut backend = MockEntityBackend::new();
            backend.expect_save().times(1).returning(|_, _, _, _| {
                let mut errors = ErrorMap::new();
                errors.insert("project_code".to_string(), "already exists".to_string());
                Err(BackendError::Validation(errors))
            });

            let mut form = valid_application();
            let outcome = form.submit(&backend, &session()).await;

            assert_eq!(outcome, SubmitOutcome::Rejected);
            let mut expected = ErrorMap::new();
            expected.insert("project_code".to_string(), "already exists".to_string());
            assert_eq!(form.errors(), &expected);
            assert!(form.general_error().is_none());
            assert_eq!(form.state(), SubmitState::Idle);
        }

        #[tokio::test]
        async fn test_general_failure_sets_banner_and_allows_retry() {
            let mut backend = MockEntityBackend::new();
            let mut calls = 0;
            backend.expect_save().times(2).returning(move |_, _, _, payload| {
                calls += 1;
                if calls == 1 {
                    Err(BackendError::Io(std::io::Error::other("connection reset")))
                } else {
                    Ok(payload)
                }
            });

            let mut form = valid_application();
            let outcome = form.submit(&backend, &session()).await;
            assert_eq!(
                outcome,
                SubmitOutcome::Failed("An unexpected error occurred".to_string())
            );
            assert_eq!(form.general_error(), Some("An unexpected error occurred"));
            assert!(form.errors().is_empty());

            let retry = form.submit(&backend, &session()).await;
            assert!(matches!(retry, SubmitOutcome::Saved { .. }));
            assert!(form.general_error().is_none());
        }

        #[tokio::test]
        async fn test_second_submit_while_in_flight_is_dropped() {
            let mut backend = MockEntityBackend::new();
            backend
                .expect_save()
                .times(1)
                .returning(|_, _, _, payload| Ok(payload));

            let mut form = valid_application();
            let ticket = form.begin_submit().expect("valid draft");
            assert!(form.is_submitting());
            assert!(form.begin_submit().is_none());
            assert_eq!(form.submit(&backend, &session()).await, SubmitOutcome::Busy);

            let result = backend
                .save(&session(), ticket.kind, &ticket.mode, ticket.payload)
                .await;
            let outcome = form.finish_submit(result.into());
            assert!(matches!(outcome, SubmitOutcome::Saved { .. }));
            assert_eq!(form.state(), SubmitState::Idle);
        }

        #[test]
        fn test_cancel_reports_in_flight_submission() {
            let mut form = valid_application();
            assert!(!form.cancel());
            assert!(form.begin_submit().is_some());
            assert!(form.cancel());
            assert_eq!(form.state(), SubmitState::Idle);
        }

        #[test]
        fn test_empty_validation_rejection_degrades_to_failure() {
            let result: SubmissionResult = Err(BackendError::Validation(ErrorMap::new())).into();
            assert_eq!(
                result,
                SubmissionResult::Failure("Validation failed".to_string())
            );
        }

        #[tokio::test]
        async fn test_clearing_task_project_on_edit_is_stored() {
            let store = LocalStore::in_memory();
            let created = store
                .save(
                    &session(),
                    EntityKind::Task,
                    &FormMode::Create,
                    record(json!({
                        "title": "Site visit",
                        "status": "pending",
                        "priority": "medium",
                        "project_code": "ABCD",
                    })),
                )
                .await
                .unwrap();
            let mut form = FormController::seed(
                catalog::schema_for(EntityKind::Task),
                FormMode::Edit {
                    key: "1".to_string(),
                },
                Some(&created),
            );
            assert!(form.set_field("project_code", FieldValue::Choice(String::new())));

            let outcome = form.submit(&store, &session()).await;
            assert!(matches!(outcome, SubmitOutcome::Saved { .. }));
            let stored = store.fetch(&session(), EntityKind::Task, "1").await.unwrap();
            assert_eq!(stored.get("project_code"), Some(&Value::Null));
            assert_eq!(stored.get("title"), Some(&json!("Site visit")));
        }

        #[tokio::test]
        async fn test_rejection_of_hidden_field_is_listed() {
            let mut backend = MockEntityBackend::new();
            backend.expect_save().times(1).returning(|_, _, _, _| {
                let mut errors = ErrorMap::new();
                errors.insert("reason_withdrawn".to_string(), "must be empty".to_string());
                errors.insert("created_by".to_string(), "unknown user".to_string());
                Err(BackendError::Validation(errors))
            });

            let mut form = valid_application();
            assert_eq!(form.submit(&backend, &session()).await, SubmitOutcome::Rejected);
            assert!(!form.visible_fields().contains(&"reason_withdrawn"));
            assert_eq!(
                form.unplaced_errors(),
                vec![
                    "created_by: unknown user".to_string(),
                    "Reason Withdrawn: must be empty".to_string(),
                ]
            );
        }

        #[test]
        fn test_visible_field_errors_are_not_unplaced() {
            let mut form = application_form();
            assert!(form.begin_submit().is_none());
            assert!(form.errors().contains_key("project_code"));
            assert!(form.unplaced_errors().is_empty());
        }

        #[test]
        fn test_edit_success_message() {
            let initial = record(json!({ "project_code": "ABCD", "project_name": "Riverside" }));
            let form = FormController::seed(
                catalog::schema_for(EntityKind::Project),
                FormMode::Edit {
                    key: "ABCD".to_string(),
                },
                Some(&initial),
            );
            assert_eq!(form.success_message(), "Project updated successfully");
        }
    }

    mod options {
        use super::*;
        use pretty_assertions::assert_eq;

        fn projects() -> Vec<ReferenceOption> {
            vec![
                ReferenceOption::new("ABCD", "Riverside"),
                ReferenceOption::new("WXYZ", "Hillside"),
            ]
        }

        #[test]
        fn test_ready_options_feed_choices_and_labels() {
            let mut form = application_form();
            form.apply_options(ReferenceSource::Projects, Ok(projects()));
            assert_eq!(form.choices("project_code"), vec!["ABCD", "WXYZ"]);
            assert_eq!(form.choice_label("project_code", "WXYZ"), "Hillside");
            assert!(form.pending_sources().is_empty());
        }

        #[test]
        fn test_load_failure_maps_to_failed_state() {
            let mut form = application_form();
            form.apply_options(
                ReferenceSource::Projects,
                Err(BackendError::Io(std::io::Error::other("down"))),
            );
            assert_eq!(
                form.options("project_code"),
                Some(&OptionsState::Failed("Failed to load projects".to_string()))
            );
            assert!(form.choices("project_code").is_empty());
        }

        #[test]
        fn test_cycle_choice_wraps() {
            let mut form = application_form();
            assert_eq!(form.draft().text("status"), "Development");
            form.cycle_choice("status", false);
            assert_eq!(form.draft().text("status"), "Determined");
            form.cycle_choice("status", true);
            assert_eq!(form.draft().text("status"), "Development");
        }

        #[test]
        fn test_optional_reference_cycles_through_none() {
            let mut form = FormController::seed(
                catalog::schema_for(EntityKind::Task),
                FormMode::Create,
                None,
            );
            form.apply_options(ReferenceSource::Projects, Ok(projects()));
            assert_eq!(form.draft().text("project_code"), "");

            form.cycle_choice("project_code", true);
            assert_eq!(form.draft().text("project_code"), "ABCD");
            form.cycle_choice("project_code", false);
            assert_eq!(form.draft().text("project_code"), "");
            form.cycle_choice("project_code", false);
            assert_eq!(form.draft().text("project_code"), "WXYZ");
            form.cycle_choice("project_code", true);
            assert_eq!(form.draft().text("project_code"), "");
        }

        #[test]
        fn test_required_reference_has_no_none_stop() {
            let mut form = application_form();
            form.apply_options(ReferenceSource::Projects, Ok(projects()));
            form.cycle_choice("project_code", true);
            form.cycle_choice("project_code", true);
            form.cycle_choice("project_code", true);
            assert_eq!(form.draft().text("project_code"), "ABCD");
        }

        #[test]
        fn test_each_source_is_requested_once() {
            let form = FormController::seed(
                catalog::schema_for(EntityKind::Task),
                FormMode::Create,
                None,
            );
            assert_eq!(
                form.pending_sources(),
                vec![ReferenceSource::Projects, ReferenceSource::Applications]
            );
        }

        #[test]
        fn test_cycle_reference_without_options_is_noop() {
            let mut form = application_form();
            assert!(!form.cycle_choice("project_code", true));
        }
    }

    mod read_only {
        use super::*;
        use pretty_assertions::assert_eq;

        fn viewed_project() -> FormController {
            let initial = record(json!({ "project_code": "ABCD", "project_name": "Riverside" }));
            FormController::seed(
                catalog::schema_for(EntityKind::Project),
                FormMode::View {
                    key: "ABCD".to_string(),
                },
                Some(&initial),
            )
        }

        #[test]
        fn test_view_form_rejects_every_edit() {
            let mut form = viewed_project();
            assert!(form.is_read_only());
            assert!(!form.set_field("project_name", FieldValue::Text("Hillside".to_string())));
            form.next_field();
            assert!(!form.input_char('x'));
            assert_eq!(form.draft().text("project_name"), "Riverside");
        }

        #[tokio::test]
        async fn test_view_form_never_submits() {
            let mut backend = MockEntityBackend::new();
            backend.expect_save().times(0);

            let mut form = viewed_project();
            assert!(form.begin_submit().is_none());
            assert_eq!(form.submit(&backend, &session()).await, SubmitOutcome::Invalid);
            assert!(form.errors().is_empty());
            assert_eq!(form.mode().key(), Some("ABCD"));
        }
    }

    mod focus {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_next_and_prev_wrap_over_visible_fields() {
            let mut form = application_form();
            assert_eq!(form.active_field_name(), Some("project_code"));
            form.next_field();
            assert_eq!(form.active_field_name(), Some("status"));
            form.next_field();
            assert_eq!(form.active_field(), 0);
            form.prev_field();
            assert_eq!(form.active_field_name(), Some("status"));
        }

        #[test]
        fn test_typing_edits_active_text_field() {
            let mut form = FormController::seed(
                catalog::schema_for(EntityKind::TopicArea),
                FormMode::Create,
                None,
            );
            form.input_char('H');
            form.input_char('i');
            form.backspace();
            assert_eq!(form.draft().text("topic_area"), "H");
        }

        #[test]
        fn test_space_toggles_flag() {
            let mut form = FormController::seed(
                catalog::schema_for(EntityKind::Project),
                FormMode::Create,
                None,
            );
            for _ in 0..3 {
                form.next_field();
            }
            assert_eq!(form.active_field_name(), Some("archived"));
            assert!(form.toggle_active_flag());
            assert!(form.draft().flag("archived"));
        }

        #[test]
        fn test_typing_into_choice_is_ignored() {
            let mut form = application_form();
            form.next_field();
            assert!(!form.input_char('x'));
            assert_eq!(form.draft().text("status"), "Development");
        }
    }
}

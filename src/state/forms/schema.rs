//! Declarative form schemas
//!
//! A [`Schema`] is a static table: fields in display order, each with its
//! requirement, format constraints and visibility guard, plus the
//! conditional-clear rules that fire when a trigger field changes. All
//! evaluation goes through [`Guard`]s over an immutable [`Draft`] snapshot.

use super::draft::{Draft, ErrorMap};
use super::value::FieldValue;
use crate::state::EntityKind;
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

/// Compiled field patterns, built on first use
static PATTERNS: LazyLock<Mutex<HashMap<&'static str, Option<Regex>>>> =
    LazyLock::new(Default::default);

/// Match against a cached compile of `pattern`; a pattern that fails to
/// compile is logged once and never matches
fn pattern_matches(pattern: &'static str, value: &str) -> bool {
    let Ok(mut compiled) = PATTERNS.lock() else {
        return false;
    };
    compiled
        .entry(pattern)
        .or_insert_with(|| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::error!(pattern, error = %err, "invalid field pattern");
                None
            }
        })
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Where a choice field gets its options from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    /// Options declared in the schema
    Fixed(&'static [&'static str]),
    /// Options fetched through the loader collaborator
    Reference(ReferenceSource),
}

/// Reference lists the loader can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSource {
    Projects,
    Applications,
    Consultants,
}

impl ReferenceSource {
    /// Entity kind the options are read from
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Projects => EntityKind::Project,
            Self::Applications => EntityKind::Application,
            Self::Consultants => EntityKind::Consultant,
        }
    }

    /// Record field used as the option code
    pub fn code_field(self) -> &'static str {
        match self {
            Self::Projects => "project_code",
            Self::Applications => "application_id",
            Self::Consultants => "consultant_id",
        }
    }

    /// Record field used as the option label
    pub fn label_field(self) -> &'static str {
        match self {
            Self::Projects => "project_name",
            Self::Applications => "project_code",
            Self::Consultants => "consultant_name",
        }
    }

    /// Text shown for an option, given the record's label field if it has one
    pub fn option_label(self, code: &str, label: Option<&str>) -> String {
        match (self, label) {
            (Self::Applications, Some(project)) => format!("APP-{code} ({project})"),
            (Self::Applications, None) => format!("APP-{code}"),
            (_, Some(label)) => label.to_string(),
            (_, None) => code.to_string(),
        }
    }
}

/// Kind of input a field takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { multiline: bool },
    Flag,
    Choice(OptionSource),
    /// Decimal number typed as text, sent as a JSON number
    Decimal,
    /// Calendar date typed as `YYYY-MM-DD`
    Date,
}

/// Initial value of a field on a create form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initial {
    Empty,
    Text(&'static str),
    Flag(bool),
}

/// Predicate over the current draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Equals {
        field: &'static str,
        value: &'static str,
    },
}

impl Guard {
    pub fn holds(&self, draft: &Draft) -> bool {
        match self {
            Guard::Equals { field, value } => draft.text(field) == *value,
        }
    }
}

/// Whether a field must be filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Optional,
    Always(&'static str),
    When(Guard, &'static str),
}

impl Requirement {
    /// The message to report if the field is required in `draft` and empty
    fn message(&self, draft: &Draft) -> Option<&'static str> {
        match self {
            Requirement::Optional => None,
            Requirement::Always(message) => Some(*message),
            Requirement::When(guard, message) => guard.holds(draft).then_some(*message),
        }
    }
}

/// Format constraint applied to a non-empty value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    Pattern {
        pattern: &'static str,
        message: &'static str,
    },
    MinLength(usize, &'static str),
    MaxLength(usize, &'static str),
    Decimal {
        min: Option<f64>,
        max: Option<f64>,
        message: &'static str,
    },
    IsoDate(&'static str),
    /// Value must be one of the field's fixed options
    OneOf(&'static str),
}

impl Constraint {
    fn check(&self, spec: &FieldSpec, value: &str) -> Option<&'static str> {
        let ok = match self {
            Constraint::Pattern { pattern, .. } => pattern_matches(pattern, value),
            Constraint::MinLength(min, _) => value.chars().count() >= *min,
            Constraint::MaxLength(max, _) => value.chars().count() <= *max,
            Constraint::Decimal { min, max, .. } => match value.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => {
                    min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m)
                }
                _ => false,
            },
            Constraint::IsoDate(_) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok(),
            Constraint::OneOf(_) => match spec.kind {
                FieldKind::Choice(OptionSource::Fixed(options)) => {
                    options.iter().any(|option| *option == value)
                }
                _ => true,
            },
        };
        if ok {
            None
        } else {
            Some(self.message())
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Constraint::Pattern { message, .. }
            | Constraint::MinLength(_, message)
            | Constraint::MaxLength(_, message)
            | Constraint::Decimal { message, .. }
            | Constraint::IsoDate(message)
            | Constraint::OneOf(message) => *message,
        }
    }
}

/// What to send for a field that is empty or hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absent {
    /// Send the empty value (`""` or `false`)
    Empty,
    /// Send JSON null
    Null,
}

/// Declaration of a single form field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub initial: Initial,
    pub requirement: Requirement,
    pub constraints: &'static [Constraint],
    pub visible_when: Option<Guard>,
    pub absent: Absent,
    /// Field keeps its seeded value on edit forms
    pub locked_on_edit: bool,
    pub help: &'static str,
}

impl FieldSpec {
    /// A plain optional single-line text field; adjust with struct update syntax
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text { multiline: false },
            initial: Initial::Empty,
            requirement: Requirement::Optional,
            constraints: &[],
            visible_when: None,
            absent: Absent::Empty,
            locked_on_edit: false,
            help: "",
        }
    }

    /// The type-appropriate empty value
    pub fn empty_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Flag => FieldValue::Flag(false),
            FieldKind::Choice(_) => FieldValue::Choice(String::new()),
            FieldKind::Text { .. } | FieldKind::Decimal | FieldKind::Date => {
                FieldValue::Text(String::new())
            }
        }
    }

    /// The value a create form starts with
    pub fn default_value(&self) -> FieldValue {
        match (self.initial, self.empty_value()) {
            (Initial::Empty, empty) => empty,
            (Initial::Flag(b), FieldValue::Flag(_)) => FieldValue::Flag(b),
            (Initial::Text(s), FieldValue::Choice(_)) => FieldValue::Choice(s.to_string()),
            (Initial::Text(s), FieldValue::Text(_)) => FieldValue::Text(s.to_string()),
            (_, empty) => empty,
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self.kind, FieldKind::Text { multiline: true })
    }

    /// Whether the field may be left empty in every draft
    pub fn is_optional(&self) -> bool {
        self.requirement == Requirement::Optional
    }

    pub fn is_visible(&self, draft: &Draft) -> bool {
        self.visible_when.map_or(true, |guard| guard.holds(draft))
    }

    /// First failing rule for this field, requiredness before format
    pub fn validate(&self, draft: &Draft) -> Option<&'static str> {
        let value = draft.get(self.name)?;
        if value.is_empty() {
            return self.requirement.message(draft);
        }
        let (FieldValue::Text(text) | FieldValue::Choice(text)) = value else {
            return None;
        };
        self.constraints
            .iter()
            .find_map(|constraint| constraint.check(self, text))
    }
}

/// A dependent field cleared when its trigger moves away from `keep_value`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearRule {
    pub trigger: &'static str,
    pub keep_value: &'static str,
    pub dependent: &'static str,
}

/// Complete form declaration for one entity kind
#[derive(Debug)]
pub struct Schema {
    pub kind: EntityKind,
    pub fields: &'static [FieldSpec],
    pub clear_rules: &'static [ClearRule],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields shown for the current draft, in schema order
    pub fn visible_fields(&self, draft: &Draft) -> Vec<&FieldSpec> {
        self.fields.iter().filter(|f| f.is_visible(draft)).collect()
    }

    /// Dependents to clear after `trigger` was set to `value`
    pub fn clears_for<'a>(
        &'a self,
        trigger: &'a str,
        value: &'a str,
    ) -> impl Iterator<Item = &'static str> + 'a {
        self.clear_rules
            .iter()
            .filter(move |rule| rule.trigger == trigger && rule.keep_value != value)
            .map(|rule| rule.dependent)
    }

    /// Validate every visible field in schema order, one message per field
    pub fn validate(&self, draft: &Draft) -> ErrorMap {
        self.fields
            .iter()
            .filter(|spec| spec.is_visible(draft))
            .filter_map(|spec| {
                spec.validate(draft)
                    .map(|message| (spec.name.to_string(), message.to_string()))
            })
            .collect()
    }
}

//! Form field value objects

use serde_json::Value;

/// Type-safe field values held in a draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    /// Selected option code, empty when nothing is selected
    Choice(String),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    /// Get the text value (returns empty string for flags)
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => s,
            FieldValue::Flag(_) => "",
        }
    }

    /// Get the flag value (returns false for text and choices)
    pub fn as_flag(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            _ => false,
        }
    }

    /// Whether the value counts as "not filled in" for requiredness.
    ///
    /// Whitespace-only text is empty; a `false` flag is not.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => s.trim().is_empty(),
            FieldValue::Flag(_) => false,
        }
    }

    /// The empty value of the same variant
    pub fn emptied(&self) -> Self {
        match self {
            FieldValue::Text(_) => FieldValue::Text(String::new()),
            FieldValue::Flag(_) => FieldValue::Flag(false),
            FieldValue::Choice(_) => FieldValue::Choice(String::new()),
        }
    }

    /// Push a character to the field value
    pub fn push_char(&mut self, c: char) {
        if let FieldValue::Text(s) = self {
            s.push(c);
        }
    }

    /// Remove the last character from the field value
    pub fn pop_char(&mut self) {
        if let FieldValue::Text(s) = self {
            s.pop();
        }
    }

    /// Coerce a JSON value into the same variant as `self`.
    ///
    /// Returns `None` for nulls and values that do not fit, so callers
    /// can fall back to the empty value.
    pub fn coerce_json(&self, json: &Value) -> Option<Self> {
        match (self, json) {
            (_, Value::Null) => None,
            (FieldValue::Flag(_), Value::Bool(b)) => Some(FieldValue::Flag(*b)),
            (FieldValue::Flag(_), _) => None,
            (FieldValue::Text(_), Value::String(s)) => Some(FieldValue::Text(s.clone())),
            (FieldValue::Text(_), Value::Number(n)) => Some(FieldValue::Text(n.to_string())),
            (FieldValue::Choice(_), Value::String(s)) => Some(FieldValue::Choice(s.clone())),
            (FieldValue::Choice(_), Value::Number(n)) => Some(FieldValue::Choice(n.to_string())),
            _ => None,
        }
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => s.clone(),
            FieldValue::Flag(true) => "[x] yes".to_string(),
            FieldValue::Flag(false) => "[ ] no".to_string(),
        }
    }
}

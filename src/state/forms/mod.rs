//! Form domain layer
//!
//! Declarative schemas, drafts and the controller that validates and
//! submits them. Rendering lives in `ui::forms`.

pub mod catalog;
mod controller;
mod draft;
mod schema;
mod value;

pub use controller::{FormController, FormMode, OptionsState, SubmitOutcome, SubmitTicket};
pub use draft::ErrorMap;
pub use schema::{FieldKind, OptionSource, ReferenceSource};

#[cfg(test)]
pub use controller::SubmitState;
#[cfg(test)]
pub use value::FieldValue;

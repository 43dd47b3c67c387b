//! Form rendering module
//!
//! - `field_renderer`: draws a single field with its error line
//! - `entity_form`: draws a mounted entity form

mod entity_form;
mod field_renderer;

pub use entity_form::draw_entity_form;

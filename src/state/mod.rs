//! Application state module

mod app_state;
pub mod forms;

pub use app_state::*;

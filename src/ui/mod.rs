//! UI module for rendering the TUI

mod components;
mod forms;
mod layout;
mod lists;
mod widgets;

use crate::app::App;
use crate::state::View;
use components::{render_confirm_dialog, render_error_dialog};
use ratatui::Frame;
use widgets::render_scrollable_list;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Draw the main layout with sidebar
    let (sidebar_area, main_area) = layout::create_layout(area);

    // Draw sidebar
    layout::draw_sidebar(frame, sidebar_area, app);

    // Draw main content based on current view
    match app.state.current_view {
        View::List(kind) => lists::draw_list(frame, main_area, app, kind),
        View::Loading(kind) => lists::draw_loading(frame, main_area, kind),
        View::Form(_) => match &app.state.form {
            Some(form) => forms::draw_entity_form(frame, main_area, form),
            None => lists::draw_list(frame, main_area, app, app.state.current_view.kind()),
        },
    }

    // Draw status bar
    layout::draw_status_bar(frame, app);

    if let Some(pending) = &app.state.pending_delete {
        render_confirm_dialog(frame, pending);
    }

    // Error dialog overlays everything
    if let Some(message) = app.state.current_error() {
        render_error_dialog(frame, message, app.state.error_queue.len());
    }
}

//! Confirmation dialog for deleting a record

use super::base::{render_dialog, DialogConfig};
use crate::state::PendingDelete;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Frame,
};

/// Render the delete prompt with Cancel and Delete options
pub fn render_confirm_dialog(frame: &mut Frame, pending: &PendingDelete) {
    let message = delete_message(pending);
    render_dialog(
        frame,
        DialogConfig {
            title: "Confirm Delete".to_string(),
            accent: Color::Red,
            message: &message,
            hint: Some(option_line(pending.confirm_selected)),
            max_width: 60,
        },
    );
}

fn delete_message(pending: &PendingDelete) -> String {
    format!(
        "Are you sure you want to delete {}? This action cannot be undone.",
        pending.display
    )
}

/// Cancel and Delete side by side, the selected one marked with ▸
fn option_line(confirm_selected: bool) -> Line<'static> {
    let mut spans = Vec::new();
    for (is_delete, label, color) in [(false, "Cancel", Color::White), (true, "Delete", Color::Red)] {
        let selected = confirm_selected == is_delete;
        let prefix = if selected { "▸ " } else { "  " };
        let style = if selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{prefix}{label}"), style));
        spans.push(Span::raw("   "));
    }
    spans.pop();
    Line::from(spans)
}

//! Entity list views

use super::render_scrollable_list;
use crate::app::App;
use crate::state::{record_summary, EntityKind};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Draw the records of one kind
pub fn draw_list(frame: &mut Frame, area: Rect, app: &App, kind: EntityKind) {
    let records = app.state.records_for(kind);
    let block = Block::default()
        .title(format!(" {} ", kind.plural_label()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if records.is_empty() {
        let message = if app.state.loading_lists.contains(&kind) {
            "Loading…".to_string()
        } else {
            let what = kind.plural_label().to_lowercase();
            format!("No {what} yet.\nPress 'n' to create one.")
        };
        let content = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(content, area);
        return;
    }

    let items: Vec<ListItem> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let is_selected = idx == app.state.selected_index;
            let prefix = if is_selected { "▸ " } else { "  " };
            let archived = record
                .get("archived")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);

            let mut spans = vec![
                Span::styled(prefix, Style::default().fg(Color::Cyan)),
                Span::raw(record_summary(kind, record)),
            ];
            if archived {
                spans.push(Span::styled(
                    "  [archived]",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    render_scrollable_list(frame, area, list, Some(app.state.selected_index));
}

/// Placeholder while an edit form waits for its record
pub fn draw_loading(frame: &mut Frame, area: Rect, kind: EntityKind) {
    let content = Paragraph::new(format!("Loading {}…", kind.label().to_lowercase()))
        .style(Style::default().fg(Color::DarkGray))
        .block(
            Block::default()
                .title(format!(" Open {} ", kind.label()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(content, area);
}

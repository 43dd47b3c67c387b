//! Button component for TUI

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Button height in rows (top border + content + bottom border)
pub const BUTTON_HEIGHT: u16 = 3;

/// Render a sidebar button: shortcut key, label and an optional record count
pub fn render_sidebar_button(
    frame: &mut Frame,
    area: Rect,
    key: char,
    label: &str,
    count: Option<usize>,
    is_selected: bool,
) {
    let (border_style, text_style) = if is_selected {
        (
            Style::default().fg(Color::Cyan),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (Style::default().fg(Color::DarkGray), Style::default())
    };

    let mut spans = vec![
        Span::styled(format!(" {key} "), Style::default().fg(Color::DarkGray)),
        Span::styled(label.to_string(), text_style),
    ];
    if let Some(count) = count {
        spans.push(Span::styled(
            format!(" {count}"),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

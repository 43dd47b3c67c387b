//! Field rendering utilities for forms

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Everything needed to draw one field
pub struct FieldView<'a> {
    pub label: &'a str,
    pub value: String,
    /// Shown dimmed when the value is empty
    pub placeholder: &'a str,
    pub is_active: bool,
    pub is_multiline: bool,
    pub is_locked: bool,
    /// Choice fields get arrow hints when active
    pub is_choice: bool,
    pub error: Option<&'a str>,
}

/// Rows a field occupies, including its error line
pub fn field_height(is_multiline: bool, has_error: bool) -> u16 {
    let body = if is_multiline { 6 } else { 3 };
    body + u16::from(has_error)
}

/// Draw a form field with its error line underneath
pub fn draw_field(frame: &mut Frame, area: Rect, field: &FieldView) {
    let accent = if field.error.is_some() {
        Color::Red
    } else if field.is_active {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let box_area = Rect {
        height: area.height.saturating_sub(u16::from(field.error.is_some())),
        ..area
    };

    let value_style = if field.is_locked {
        Style::default().fg(Color::DarkGray)
    } else if field.is_active {
        Style::default().fg(Color::White)
    } else {
        Style::default()
    };
    let cursor = if field.is_active && !field.is_locked && !field.is_choice {
        "▌"
    } else {
        ""
    };

    let mut lines: Vec<Line> = if field.value.is_empty() {
        vec![Line::from(Span::styled(
            field.placeholder.to_string(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))]
    } else {
        field
            .value
            .split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), value_style)))
            .collect()
    };
    if let Some(last) = lines.last_mut() {
        if field.value.is_empty() && !cursor.is_empty() {
            last.spans.insert(0, Span::styled(cursor, Style::default().fg(Color::Cyan)));
        } else {
            last.spans
                .push(Span::styled(cursor, Style::default().fg(Color::Cyan)));
        }
        if field.is_choice && field.is_active {
            last.spans.push(Span::styled(
                "  ◀ ▶",
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    let title = if field.is_locked {
        format!(" {} (locked) ", field.label)
    } else {
        format!(" {} ", field.label)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block),
        box_area,
    );

    if let Some(error) = field.error {
        let error_area = Rect {
            y: box_area.y + box_area.height,
            height: 1,
            ..area
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" {error}"),
                Style::default().fg(Color::Red),
            )),
            error_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_height() {
        assert_eq!(field_height(false, false), 3);
        assert_eq!(field_height(false, true), 4);
        assert_eq!(field_height(true, true), 7);
    }
}

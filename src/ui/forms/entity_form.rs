//! Entity form rendering (create, edit and view)

use super::field_renderer::{draw_field, field_height, FieldView};
use crate::state::forms::{FieldKind, FormController, FormMode, OptionSource, OptionsState};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Draw the mounted form
pub fn draw_entity_form(frame: &mut Frame, area: Rect, form: &FormController) {
    let kind = form.kind();
    let title = match form.mode() {
        FormMode::Create => format!(" New {} ", kind.label()),
        FormMode::Edit { key } => format!(" Edit {} {} ", kind.label(), key),
        FormMode::View { key } => format!(" {} {} ", kind.label(), key),
    };
    let border_color = if form.is_submitting() {
        Color::Yellow
    } else {
        Color::Cyan
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let banner = banner_messages(form);
    let banner_height = if banner.is_empty() {
        0
    } else {
        // Border rows plus one line per message, at most a third of the form
        (banner.len() as u16 + 2).min((inner.height / 3).max(3))
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Status line
            Constraint::Length(banner_height), // General error
            Constraint::Min(0),                // Fields
            Constraint::Length(1),             // Help
        ])
        .split(inner);

    draw_status_line(frame, chunks[0], form);
    if !banner.is_empty() {
        draw_error_banner(frame, chunks[1], &banner, form.general_error().is_some());
    }
    draw_fields(frame, chunks[2], form);
    draw_help(frame, chunks[3], form);
}

fn draw_status_line(frame: &mut Frame, area: Rect, form: &FormController) {
    let line = if form.is_submitting() {
        Line::from(Span::styled(
            " Saving…",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    } else if !form.errors().is_empty() {
        let count = form.errors().len();
        let noun = if count == 1 { "field needs" } else { "fields need" };
        Line::from(Span::styled(
            format!(" {count} {noun} attention"),
            Style::default().fg(Color::Red),
        ))
    } else if form.is_read_only() {
        Line::from(Span::styled(
            " e to edit, Esc to close",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::styled(
            " Ctrl+S to save, Esc to cancel",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Form-level messages: the general error, then errors for fields not on screen
fn banner_messages(form: &FormController) -> Vec<String> {
    form.general_error()
        .map(str::to_string)
        .into_iter()
        .chain(form.unplaced_errors())
        .collect()
}

fn draw_error_banner(frame: &mut Frame, area: Rect, messages: &[String], dismissable: bool) {
    let mut lines: Vec<Line> = messages
        .iter()
        .map(|m| Line::from(Span::styled(m.clone(), Style::default().fg(Color::Red))))
        .collect();
    if let Some(first) = lines.first_mut().filter(|_| dismissable) {
        first.spans.push(Span::styled(
            "  (Esc to dismiss)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    let banner = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
    frame.render_widget(banner, area);
}

fn draw_fields(frame: &mut Frame, area: Rect, form: &FormController) {
    let views: Vec<FieldView> = form
        .visible_fields()
        .into_iter()
        .enumerate()
        .filter_map(|(idx, name)| field_view(form, name, idx == form.active_field()))
        .collect();
    let heights: Vec<u16> = views
        .iter()
        .map(|v| field_height(v.is_multiline, v.error.is_some()))
        .collect();

    let start = first_visible(&heights, form.active_field(), area.height);
    let mut y = area.y;
    for (view, height) in views.iter().zip(&heights).skip(start) {
        if y + height > area.y + area.height {
            break;
        }
        draw_field(
            frame,
            Rect {
                x: area.x,
                y,
                width: area.width,
                height: *height,
            },
            view,
        );
        y += height;
    }
}

fn draw_help(frame: &mut Frame, area: Rect, form: &FormController) {
    let help = form
        .active_field_name()
        .and_then(|name| form.schema().field(name))
        .map(|spec| spec.help)
        .unwrap_or("");
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!(" {help}"),
            Style::default().fg(Color::DarkGray),
        )),
        area,
    );
}

/// Build the view of one field from the controller's state
fn field_view<'a>(form: &'a FormController, name: &str, is_active: bool) -> Option<FieldView<'a>> {
    let spec = form.schema().field(name)?;
    let value = form.draft().get(name)?;
    let mut error = form.errors().get(name).map(String::as_str);

    let (display, placeholder) = match spec.kind {
        FieldKind::Flag => (value.display_value(), ""),
        FieldKind::Choice(OptionSource::Reference(_)) => {
            let code = value.as_text();
            match form.options(name) {
                Some(OptionsState::Loading) => (code.to_string(), "Loading…"),
                Some(OptionsState::Failed(message)) => {
                    error = error.or(Some(message.as_str()));
                    (code.to_string(), "(unavailable)")
                }
                _ if code.is_empty() => (String::new(), "(none)"),
                _ => (form.choice_label(name, code), "(none)"),
            }
        }
        FieldKind::Choice(OptionSource::Fixed(_)) => (value.display_value(), "(none)"),
        FieldKind::Date => (value.display_value(), "YYYY-MM-DD"),
        FieldKind::Decimal => (value.display_value(), "0.00"),
        FieldKind::Text { .. } => (value.display_value(), "(empty)"),
    };

    Some(FieldView {
        label: spec.label,
        value: display,
        placeholder,
        is_active,
        is_multiline: spec.is_multiline(),
        is_locked: form.is_locked(name),
        is_choice: matches!(spec.kind, FieldKind::Choice(_)),
        error,
    })
}

/// First field to draw so that the active one fits in `available` rows
fn first_visible(heights: &[u16], active: usize, available: u16) -> usize {
    let active = active.min(heights.len().saturating_sub(1));
    let mut start = 0;
    while start < active && heights[start..=active].iter().sum::<u16>() > available {
        start += 1;
    }
    start
}

//! Layout components (sidebar, status bar)

use super::components::{render_sidebar_button, BUTTON_HEIGHT};
use crate::app::App;
use crate::session::USER_ENV;
use crate::state::{EntityKind, View};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const SIDEBAR_WIDTH: u16 = 22;

/// Create the main layout with sidebar
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    // Reserve bottom line for status bar
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(rows[0]);

    (columns[0], columns[1])
}

/// Draw the sidebar with one button per entity kind
pub fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let mut constraints = vec![Constraint::Length(BUTTON_HEIGHT); EntityKind::ALL.len()];
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let current = app.state.current_view.kind();
    for (idx, kind) in EntityKind::ALL.iter().enumerate() {
        let key = char::from_digit(idx as u32 + 1, 10).unwrap_or(' ');
        let count = app.state.records.get(kind).map(Vec::len);
        render_sidebar_button(
            frame,
            chunks[idx],
            key,
            kind.plural_label(),
            count,
            *kind == current,
        );
    }
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let status_area = Rect {
        x: 0,
        y: area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    let session = app.session();
    let mut spans = vec![if session.is_signed_in() {
        Span::styled(
            format!(" ● {} ", session.user),
            Style::default().fg(Color::Green),
        )
    } else {
        Span::styled(
            format!(" ○ not logged in, set {USER_ENV} "),
            Style::default().fg(Color::Red),
        )
    }];

    let read_only = app.state.form.as_ref().is_some_and(|f| f.is_read_only());
    spans.push(Span::styled(
        view_hints(&app.state.current_view, read_only),
        Style::default().fg(Color::Gray),
    ));

    if !app.state.loading_lists.is_empty() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled("loading…", Style::default().fg(Color::Yellow)));
    }

    if let Some(toast) = &app.state.toast {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            toast.message.as_str(),
            Style::default().fg(Color::Green),
        ));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, status_area);
}

/// Keyboard hints for the current view
fn view_hints(view: &View, read_only: bool) -> &'static str {
    match view {
        View::List(_) => {
            "j/k:nav  1-6/Tab:switch  n:new  Enter/e:edit  v:view  d:delete  r:refresh  q:quit"
        }
        View::Loading(_) => "Esc:cancel",
        View::Form(_) if read_only => "Tab:next  e:edit  Esc:close",
        View::Form(_) => "Tab:next  ←/→:choose  Space:toggle  ^S:save  Esc:cancel",
    }
}

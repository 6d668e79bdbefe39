use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::truncate;
use crate::app::App;
use crate::types::{Issue, Label};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let more = if session.has_more() {
        " - more available"
    } else if app.loading() {
        " - loading"
    } else {
        ""
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Open issues ({}){} ", session.issues.len(), more));

    if session.issues.is_empty() && !app.loading() {
        let empty = Paragraph::new("No open issues")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 36; // #num(7) + space(1) + @author(17) + space(1) + date(10)
    let flex = w.saturating_sub(fixed).max(10);

    let items: Vec<ListItem> = session
        .issues
        .iter()
        .enumerate()
        .map(|(i, issue)| issue_item(issue, i == app.issue_index, flex))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.issue_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn issue_item(issue: &Issue, selected: bool, flex: usize) -> ListItem<'static> {
    let style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let title = truncate(&issue.title, flex);
    let author = truncate(&issue.author.login, 16);

    let first = Line::from(vec![
        Span::styled(
            format!("#{:<6}", issue.number),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(format!("{:<flex$}", title), style),
        Span::raw(" "),
        Span::styled(format!("@{:<16}", author), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            issue.created_at.format("%Y-%m-%d").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    if issue.labels.is_empty() {
        return ListItem::new(first);
    }

    let mut swatches = vec![Span::raw("        ")];
    for label in &issue.labels {
        swatches.push(label_span(label));
        swatches.push(Span::raw(" "));
    }

    ListItem::new(vec![first, Line::from(swatches)])
}

/// Label name on a background of the label's own colour.
fn label_span(label: &Label) -> Span<'static> {
    let text = format!(" {} ", truncate(&label.name, 24));
    match label.rgb() {
        Some((r, g, b)) => Span::styled(
            text,
            Style::default()
                .bg(Color::Rgb(r, g, b))
                .fg(contrast_color(r, g, b)),
        ),
        None => Span::styled(text, Style::default().fg(Color::Magenta)),
    }
}

/// Black or white, whichever reads better on the given background.
fn contrast_color(r: u8, g: u8, b: u8) -> Color {
    let luma = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    if luma > 128_000 {
        Color::Black
    } else {
        Color::White
    }
}

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::action::Field;
use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let intro = Paragraph::new(Line::from(vec![Span::styled(
        " Browse the open issues of a GitHub repository",
        Style::default().fg(Color::Gray),
    )]));
    frame.render_widget(intro, chunks[0]);

    render_input(
        frame,
        " Repository (owner/repo) ",
        app.repo_input.clone(),
        app.focus == Field::Repository,
        chunks[1],
    );

    // Never echo the token itself
    let masked = "•".repeat(app.token_input.chars().count());
    render_input(
        frame,
        " Personal access token (optional) ",
        masked,
        app.focus == Field::Token,
        chunks[2],
    );

    if let Some(error) = &app.session().error {
        let message = Paragraph::new(Line::from(vec![Span::styled(
            format!(" {}", error),
            Style::default().fg(Color::Red),
        )]))
        .wrap(Wrap { trim: true });
        frame.render_widget(message, chunks[3]);
    }
}

fn render_input(frame: &mut Frame, title: &str, value: String, focused: bool, area: Rect) {
    let border_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let width = value.chars().count() as u16;
    let input = Paragraph::new(value).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title.to_string()),
    );
    frame.render_widget(input, area);

    if focused {
        let max_x = area.x + area.width.saturating_sub(2);
        let x = area.x.saturating_add(1).saturating_add(width).min(max_x);
        frame.set_cursor_position((x, area.y + 1));
    }
}

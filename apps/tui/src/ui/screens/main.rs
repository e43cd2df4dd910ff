use crate::app::{App, Focus};
use crate::ui::widgets::map::render_map;
use crate::ui::widgets::side_panel::render_side_panel;
use crate::ui::widgets::stepper::render_stepper;
use aoi_mapper::status::StatusLevel;
use aoi_mapper::Step;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render_main(app: &App, f: &mut Frame<'_>) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title area
            Constraint::Min(10),   // Map and side panel
            Constraint::Length(3), // Status area
            Constraint::Length(1), // Shortcuts hint
        ])
        .split(f.area().inner(Margin::new(1, 0)));

    render_title_section(app, f, main_layout[0]);
    render_content_section(app, f, main_layout[1]);
    render_status_section(app, f, main_layout[2]);
    render_shortcuts(app, f, main_layout[3]);
}

fn render_title_section(app: &App, f: &mut Frame<'_>, area: Rect) {
    let step = app.session.step();
    let title = TextLine::from(vec![
        Span::styled(
            "AOI Mapper ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Step {} of {}: ", step.number(), Step::ALL.len()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            step.title(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(title).block(block), area);
}

fn render_content_section(app: &App, f: &mut Frame<'_>, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(42)])
        .split(area);

    render_map(app, f, columns[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(12)])
        .split(columns[1]);

    render_stepper(app, f, side[0]);
    render_side_panel(app, f, side[1]);
}

fn render_status_section(app: &App, f: &mut Frame<'_>, area: Rect) {
    let status_block = Block::default()
        .title(" Status ")
        .title_style(Style::default().fg(Color::Yellow))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let status_text = app.session.status().map_or_else(Text::default, |status| {
        Text::from(Span::styled(
            status.message.as_str(),
            Style::default().fg(level_color(status.level)),
        ))
    });

    let status_paragraph = Paragraph::new(status_text)
        .block(status_block)
        .wrap(Wrap { trim: true });
    f.render_widget(status_paragraph, area);
}

const fn level_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Info => Color::Gray,
        StatusLevel::Success => Color::Green,
        StatusLevel::Warning => Color::Yellow,
        StatusLevel::Error => Color::Red,
    }
}

fn render_shortcuts(app: &App, f: &mut Frame<'_>, area: Rect) {
    let pairs: &[(&str, &str)] = match app.focus {
        Focus::LabelForm => &[
            ("Enter", "Save label"),
            ("Esc", "Cancel"),
            ("Tab", "Next feature"),
        ],
        Focus::Map => &[
            ("Arrows", "Pan"),
            ("Enter", "Act"),
            ("n/p", "Next/Prev"),
            ("i", "Label"),
            ("s", "Settings"),
            ("F1", "Help"),
            ("q", "Quit"),
        ],
    };

    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (i, (key, action)) in pairs.iter().enumerate() {
        spans.push(Span::styled(
            *key,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        let separator = if i + 1 < pairs.len() { " | " } else { "" };
        spans.push(Span::styled(
            format!(": {action}{separator}"),
            Style::default().fg(Color::Gray),
        ));
    }

    f.render_widget(
        Paragraph::new(TextLine::from(spans)).alignment(Alignment::Center),
        area,
    );
}

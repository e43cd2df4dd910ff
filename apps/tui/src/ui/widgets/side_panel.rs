use crate::app::{App, Focus};
use aoi_mapper::{GeometryKind, Step};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use throbber_widgets_tui::{Throbber, WhichUse, BRAILLE_SIX};

pub fn render_side_panel(app: &App, f: &mut Frame<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Undo / Delete
            Constraint::Length(4), // Label form
            Constraint::Min(4),    // Features and tile
            Constraint::Length(1), // Activity
        ])
        .split(area);

    render_controls(app, f, chunks[0]);
    render_label_form(app, f, chunks[1]);
    render_details(app, f, chunks[2]);
    render_activity(app, f, chunks[3]);
}

fn render_controls(app: &App, f: &mut Frame<'_>, area: Rect) {
    let session = &app.session;
    let can_undo = !session.is_submitting() && !session.layer().is_empty();
    let can_delete = !session.is_submitting() && session.selected().is_some();

    let line = TextLine::from(vec![
        control("[u] Undo", can_undo),
        Span::raw("  "),
        control("[d] Delete", can_delete),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn control(label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(label.to_string(), style)
}

/// Single-field form; its purpose follows the current step
fn render_label_form(app: &App, f: &mut Frame<'_>, area: Rect) {
    let session = &app.session;
    let editing = app.focus == Focus::LabelForm;
    let border = if editing { Color::Cyan } else { Color::Gray };

    let title = session.label_kind().map_or_else(
        || " Label ".to_string(),
        |kind| format!(" {} {} ", kind.label(), kind.field_label()),
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let text = match (session.label_kind(), session.editor().target()) {
        (None, _) => Text::from(Span::styled(
            "Nothing to label on this step",
            Style::default().fg(Color::DarkGray),
        )),
        (Some(_), None) => Text::from(Span::styled(
            "Tab to pick a feature",
            Style::default().fg(Color::DarkGray),
        )),
        (Some(_), Some(id)) => {
            let cursor = if editing { "_" } else { "" };
            Text::from(vec![
                TextLine::from(vec![
                    Span::styled(
                        session.editor().text().to_string(),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(cursor, Style::default().fg(Color::Cyan)),
                ]),
                TextLine::from(Span::styled(
                    format!("feature {id}  [i] edit  [Enter] save"),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        }
    };

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn render_details(app: &App, f: &mut Frame<'_>, area: Rect) {
    let session = &app.session;
    let view = session.view();
    let tile = view.tile_under_crosshair();

    let mut lines = vec![
        TextLine::from(Span::styled(
            step_hint(session.step()),
            Style::default().fg(Color::Gray),
        )),
        TextLine::from(""),
        count_line(app, GeometryKind::Point),
        count_line(app, GeometryKind::Polygon),
        TextLine::from(""),
        TextLine::from(vec![
            Span::styled("Tile: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{}/{}/{}", tile.z, tile.x, tile.y)),
        ]),
    ];

    let draw = &session.interactions().draw;
    if draw.active && !draw.sketch().is_empty() {
        lines.insert(
            2,
            TextLine::from(Span::styled(
                format!("Sketch: {} vertices (f to finish)", draw.sketch().len()),
                Style::default().fg(Color::LightGreen),
            )),
        );
    }

    if let Some(url) = view.tile_url() {
        lines.push(TextLine::from(Span::styled(
            url,
            Style::default().fg(Color::DarkGray),
        )));
    }

    if let Some(saved_at) = &app.saved_at {
        lines.push(TextLine::from(Span::styled(
            format!("Last saved: {saved_at}"),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default()
        .title(" Features ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn count_line(app: &App, kind: GeometryKind) -> TextLine<'static> {
    let layer = app.session.layer();
    let total = layer.count_of(kind);
    let unlabelled = layer.unlabelled_count(kind);
    let style = if unlabelled > 0 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Green)
    };
    TextLine::from(vec![
        Span::styled(plural_label(kind), Style::default().fg(Color::Gray)),
        Span::styled(format!("{total} ({unlabelled} unlabelled)"), style),
    ])
}

const fn plural_label(kind: GeometryKind) -> &'static str {
    match kind {
        GeometryKind::Point => "Access points: ",
        GeometryKind::Polygon => "Areas of interest: ",
    }
}

const fn step_hint(step: Step) -> &'static str {
    match step {
        Step::PlacePoints => "Enter places an access point at the crosshair",
        Step::LabelPoints => "Select an access point and give it an identifier",
        Step::PlacePolygons => "Enter adds a vertex, f closes the area",
        Step::LabelPolygons => "Select an area and give it a name",
        Step::Review => "Check the map, then Send",
        Step::Submit => "Sending features to the server",
    }
}

fn render_activity(app: &App, f: &mut Frame<'_>, area: Rect) {
    if !app.session.is_submitting() {
        return;
    }

    let throbber = Throbber::default()
        .label("Sending to server...")
        .style(Style::default().fg(Color::Cyan))
        .throbber_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .throbber_set(BRAILLE_SIX)
        .use_type(WhichUse::Spin);
    let mut state = app.throbber.clone();
    f.render_stateful_widget(throbber, area, &mut state);
}

use crate::app::App;
use aoi_mapper::wizard::{self, Step};
use aoi_mapper::Direction as StepDirection;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render_stepper(app: &App, f: &mut Frame<'_>, area: Rect) {
    let current = app.session.step();

    let block = Block::default()
        .title(" Steps ")
        .title_style(Style::default().fg(Color::Yellow))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let lines: Vec<TextLine<'_>> = Step::ALL
        .iter()
        .map(|&step| step_line(step, current))
        .collect();
    f.render_widget(Paragraph::new(lines), chunks[0]);

    f.render_widget(
        Paragraph::new(button_line(app, current)).alignment(Alignment::Center),
        chunks[1],
    );
}

fn step_line(step: Step, current: Step) -> TextLine<'static> {
    let (marker, style) = if step == current {
        (
            ">",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else if step < current {
        ("*", Style::default().fg(Color::Green))
    } else {
        (" ", Style::default().fg(Color::Gray))
    };

    TextLine::from(vec![
        Span::styled(format!("{marker} {}. ", step.number()), style),
        Span::styled(step.title(), style),
    ])
}

/// Previous / Next buttons; a button is dimmed when its transition does not exist
fn button_line(app: &App, current: Step) -> TextLine<'static> {
    let busy = app.session.is_submitting();
    let can_go_back = !busy && !current.is_first();
    let can_go_forward = !busy && wizard::lookup(current, StepDirection::Forward).is_some();

    let next_label = if current.is_last_before_submit() {
        "Send"
    } else {
        "Next"
    };

    TextLine::from(vec![
        button("[p] Previous", can_go_back),
        Span::raw("   "),
        button(&format!("[n] {next_label}"), can_go_forward),
    ])
}

fn button(label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!(" {label} "), style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_is_disabled_on_the_first_step() {
        let app = App::new();
        let line = button_line(&app, Step::PlacePoints);
        assert_eq!(line.spans[0].style.fg, Some(Color::DarkGray));
        assert_eq!(line.spans[2].style.bg, Some(Color::Cyan));

        let review = button_line(&app, Step::Review);
        assert_eq!(review.spans[0].style.bg, Some(Color::Cyan));
        assert!(review.spans[2].content.contains("Send"));
    }
}

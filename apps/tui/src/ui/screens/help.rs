use crate::ui::widgets::popup::{centered_rect, ClearWidget};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render_help_popup(f: &mut Frame<'_>) {
    let popup_area = centered_rect(80, 80, f.area());
    f.render_widget(ClearWidget, popup_area);

    let help_block = Block::default()
        .title("== Help & Keyboard Shortcuts ==")
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let help_paragraph = Paragraph::new(Text::from(build_help_lines()))
        .block(help_block)
        .wrap(Wrap { trim: true });
    f.render_widget(help_paragraph, popup_area);

    let hint = Paragraph::new(Span::styled(
        "Press F1 or Esc to close",
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center);

    let hint_area = Rect {
        x: popup_area.x,
        y: popup_area.y + popup_area.height.saturating_sub(2),
        width: popup_area.width,
        height: 1,
    };
    f.render_widget(hint, hint_area);
}

fn key_line(key: &'static str, action: &'static str) -> TextLine<'static> {
    TextLine::from(vec![
        Span::styled(
            format!("  {key:<10}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(action),
    ])
}

fn heading(text: &'static str) -> TextLine<'static> {
    TextLine::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn build_help_lines() -> Vec<TextLine<'static>> {
    let mut lines = vec![
        TextLine::from(Span::styled(
            "AOI Mapper",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        TextLine::from(""),
        TextLine::from(
            "Place and label access points, then areas of interest, review them and send both sets to the server.",
        ),
        TextLine::from(""),
        heading("Map:"),
        key_line("Arrows", "Pan the view (drags a grabbed vertex)"),
        key_line("+ / -", "Zoom in / out"),
        key_line("Enter", "Place a point, add a polygon vertex or select"),
        key_line("f", "Finish the polygon sketch"),
        key_line("Backspace", "Drop the last sketch vertex"),
        key_line("Esc", "Abandon the sketch"),
        key_line("m", "Grab / release the vertex under the crosshair"),
        key_line("u", "Undo the last added feature"),
        key_line("d", "Delete the selected feature"),
        TextLine::from(""),
        heading("Labels:"),
        key_line("Tab", "Select the next feature of this step"),
        key_line("i", "Edit the label of the selected feature"),
        key_line("Enter", "Save the label"),
        TextLine::from(""),
        heading("Wizard:"),
        key_line("n / ]", "Next step (Send on Review)"),
        key_line("p / [", "Previous step"),
        key_line("s / F2", "View settings"),
        key_line("F1", "Toggle this help"),
        key_line("q", "Quit"),
        TextLine::from(""),
        heading("CLI Options:"),
    ];

    let help_text = crate::cli::CliArgs::help_text();
    for line in help_text.lines() {
        if line.starts_with("Usage") || line.starts_with("Options") || line.trim().is_empty() {
            continue;
        }
        lines.push(TextLine::from(line.to_string()));
    }

    lines
}

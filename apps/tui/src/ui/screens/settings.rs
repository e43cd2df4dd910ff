use crate::app::{App, SettingsField};
use crate::ui::widgets::popup::{centered_rect, ClearWidget};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

pub fn render_settings_popup(app: &App, f: &mut Frame<'_>) {
    let popup_area = centered_rect(70, 50, f.area());
    f.render_widget(ClearWidget, popup_area);

    let block = Block::default()
        .title(" View Settings ")
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let items: Vec<ListItem<'_>> = SettingsField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let value = if app.settings_editing && i == app.settings_selection_index {
                format!("{}_", app.settings_input)
            } else {
                field.value(&app.options)
            };
            ListItem::new(TextLine::from(vec![
                Span::styled(
                    format!("{:<18}", field.label()),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(value, Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.settings_selection_index));
    f.render_stateful_widget(list, chunks[0], &mut state);

    f.render_widget(
        Paragraph::new(Span::styled(
            format!("Server: {}", app.actions.endpoint()),
            Style::default().fg(Color::DarkGray),
        )),
        chunks[1],
    );

    let hint = if app.settings_editing {
        "Enter: apply | Esc: cancel"
    } else {
        "Up/Down: select | Enter: edit | Esc: close"
    };
    f.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::Gray))),
        chunks[2],
    );
}

/*!
 * bondscan TUI Interface
 * Device list, loading indicator, toast line and confirmation dialog
 */

use bondscan_bluez::{BondState, Platform};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

// Conservative color palette
const BLUE: Color = Color::Rgb(100, 149, 237);
const GRAY: Color = Color::Rgb(128, 128, 128);
const WHITE: Color = Color::Rgb(255, 255, 255);
const GREEN: Color = Color::Rgb(34, 139, 34);
const AMBER: Color = Color::Rgb(255, 191, 0);

const SPINNER: [char; 8] = ['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

/// `frame` drives the spinner animation.
pub fn render_ui<P: Platform>(f: &mut Frame, app: &App<P>, frame: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header + loading indicator
            Constraint::Min(5),    // Device list
            Constraint::Length(3), // Toast / key help
        ])
        .split(f.area());

    render_header(f, chunks[0], app, frame);
    render_device_list(f, chunks[1], app);
    render_footer(f, chunks[2], app);

    if let Some(dialog) = app.dialog() {
        render_dialog(f, &dialog.prompt());
    }
}

fn render_header<P: Platform>(f: &mut Frame, area: Rect, app: &App<P>, frame: usize) {
    let mut spans = vec![Span::styled(
        "Bluetooth Devices",
        Style::default().fg(WHITE).add_modifier(Modifier::BOLD),
    )];
    if app.loading() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} Scanning...", SPINNER[frame % SPINNER.len()]),
            Style::default().fg(BLUE),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(GRAY)))
        .alignment(Alignment::Left);
    f.render_widget(header, area);
}

fn render_device_list<P: Platform>(f: &mut Frame, area: Rect, app: &App<P>) {
    let rows = app.rows();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Devices ({})", rows.len()))
        .border_style(Style::default().fg(BLUE));

    if app.registry().is_empty() {
        let hint = if app.is_ready() {
            "No devices yet. Press s to scan."
        } else {
            "Bluetooth is not available."
        };
        let paragraph = Paragraph::new(hint)
            .style(Style::default().fg(GRAY))
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let state_color = match row.bond_state {
                BondState::Bonded => GREEN,
                BondState::Bonding => AMBER,
                BondState::None => GRAY,
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", row.icon.glyph())),
                Span::styled(row.name.clone(), Style::default().fg(WHITE)),
                Span::styled(format!("  {}", row.address), Style::default().fg(GRAY)),
                Span::raw("  "),
                Span::styled(row.bond_label, Style::default().fg(state_color)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(BLUE).fg(WHITE))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(Some(app.selected()));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_footer<P: Platform>(f: &mut Frame, area: Rect, app: &App<P>) {
    let line = match app.toast() {
        Some(message) => Line::from(Span::styled(message.to_string(), Style::default().fg(AMBER))),
        None => Line::from(vec![
            Span::styled("[s] ", Style::default().fg(BLUE)),
            Span::raw("Scan  "),
            Span::styled("[↑/↓] ", Style::default().fg(BLUE)),
            Span::raw("Select  "),
            Span::styled("[Enter] ", Style::default().fg(BLUE)),
            Span::raw("Pair/Unpair  "),
            Span::styled("[q] ", Style::default().fg(BLUE)),
            Span::raw("Quit"),
        ]),
    };

    let footer = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(GRAY)));
    f.render_widget(footer, area);
}

fn render_dialog(f: &mut Frame, prompt: &str) {
    let area = centered_rect(60, 7, f.area());
    let content = vec![
        Line::from(prompt.to_string()),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y] ", Style::default().fg(GREEN)),
            Span::raw("OK    "),
            Span::styled("[n] ", Style::default().fg(GRAY)),
            Span::raw("Cancel"),
        ]),
    ];

    let dialog = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .border_style(Style::default().fg(BLUE)),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

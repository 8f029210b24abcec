use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};
use time_humanize::HumanTime;

use breth::pattern::PhaseKind;
use breth::session::SessionState;
use breth::util::format_clock;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn render(app: &App, f: &mut Frame) {
    match app.state {
        AppState::Breathing => render_breathing(app, f),
        AppState::Results => render_results(app, f),
        AppState::History => render_history(app, f),
    }
}

fn phase_color(kind: &PhaseKind) -> Color {
    match kind {
        PhaseKind::Inhale => Color::Green,
        PhaseKind::Hold => Color::Yellow,
        PhaseKind::Exhale => Color::Cyan,
        PhaseKind::Rest => Color::Magenta,
        PhaseKind::Custom(_) => Color::White,
    }
}

fn render_breathing(app: &App, f: &mut Frame) {
    let phases = app.settings.pattern.phases();
    let phase = &phases[app.snapshot.phase_index.min(phases.len() - 1)];

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(f.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            app.settings.pattern.name().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "{} / {}",
                format_clock(app.snapshot.active_secs),
                format_clock(app.snapshot.total_secs)
            ),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let label = if app.snapshot.state == SessionState::Paused {
        Paragraph::new(Span::styled(
            "PAUSED - press space to resume",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
    } else {
        Paragraph::new(Span::styled(
            phase.kind.to_string(),
            Style::default()
                .fg(phase_color(&phase.kind))
                .add_modifier(Modifier::BOLD),
        ))
    }
    .alignment(Alignment::Center);
    f.render_widget(label, chunks[1]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}s", phase.duration_secs)),
        )
        .gauge_style(Style::default().fg(phase_color(&phase.kind)))
        .ratio(app.snapshot.phase_fraction.clamp(0.0, 1.0));
    f.render_widget(gauge, chunks[2]);

    let footer = Paragraph::new(format!(
        "cycle {}   (space) pause  (esc) stop",
        app.snapshot.cycle_index + 1
    ))
    .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
    .alignment(Alignment::Center);
    f.render_widget(footer, chunks[3]);
}

fn render_results(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());

    let mut lines = Vec::new();
    match app.controller.result() {
        Some(result) => {
            let (title, color) = if result.completed {
                ("session complete", Color::Green)
            } else {
                ("session stopped early", Color::Yellow)
            };
            lines.push(Line::from(Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::default());
            lines.push(Line::from(format!(
                "{} practiced of {} planned",
                format_clock(result.actual_secs),
                format_clock(app.snapshot.total_secs)
            )));
            lines.push(Line::from(format!(
                "{} full {} of {}",
                result.cycles,
                if result.cycles == 1 { "cycle" } else { "cycles" },
                app.settings.pattern.name()
            )));
        }
        None => lines.push(Line::from("no session result yet")),
    }

    let summary = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(summary, chunks[0]);

    let instructions = Paragraph::new("(r)estart (h)istory (esc)ape")
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[1]);
}

fn render_history(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    let totals_line = match app.totals {
        Some(t) => format!(
            "{} sessions, {} completed, {} practiced",
            t.sessions,
            t.completed,
            format_clock(t.practiced_secs)
        ),
        None => "no history recorded yet".to_string(),
    };
    let header = Paragraph::new(Span::styled(
        totals_line,
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    if app.history.is_empty() {
        let empty = Paragraph::new("No sessions yet.\nFinish one to see it here.")
            .block(Block::default().borders(Borders::ALL).title("Recent sessions"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
    } else {
        let now = Local::now();
        let rows: Vec<Line> = app
            .history
            .iter()
            .map(|record| {
                let age_secs = (now - record.started_at).num_seconds();
                let age = HumanTime::from(-age_secs).to_string();
                let mark = if record.completed {
                    Span::styled("done", Style::default().fg(Color::Green))
                } else {
                    Span::styled("stopped", Style::default().fg(Color::Yellow))
                };
                Line::from(vec![
                    Span::styled(
                        format!("{:<18}", age),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                    Span::raw(format!("{:<14}", record.pattern)),
                    Span::raw(format!("{:>7}", format_clock(record.actual_secs))),
                    Span::raw(format!("  {:>3} cycles  ", record.cycles)),
                    mark,
                ])
            })
            .collect();

        let list = Paragraph::new(rows)
            .block(Block::default().borders(Borders::ALL).title("Recent sessions"));
        f.render_widget(list, chunks[1]);
    }

    let instructions = Paragraph::new("(b)ack (r)estart (esc)ape")
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[2]);
}

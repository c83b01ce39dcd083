// src/ui/widgets/infrastructure_view.rs

use crate::app::{App, AppState};
use crate::ui::widgets::analysis_view::render_pending;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, Table, Wrap},
};
use scano::core::models::{HeaderStatus, ProbeOutcome, ScanReport};

/// Renders the DNS resolver panel as a table and, below it, the certificate,
/// header and endpoint details as a scrollable paragraph.
pub fn render_infrastructure_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Infrastructure (Scroll with ↑ ↓, Tab for recommendations)");

    let Some(report) = app.scan_report.as_ref().filter(|_| matches!(app.state, AppState::Finished)) else {
        render_pending(frame, app, main_block, area);
        return;
    };

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(report.dns.len() as u16 + 2),
            Constraint::Min(0),
        ])
        .split(inner_area);

    frame.render_widget(dns_table(report), chunks[0]);

    let lines = detail_lines(report);
    let line_count = lines.len();
    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset.min(u16::MAX as usize) as u16, 0))
        .block(Block::default().borders(Borders::TOP).title("Details"));
    frame.render_widget(details, chunks[1]);

    app.report_scroll_state = app
        .report_scroll_state
        .content_length(line_count)
        .position(app.scroll_offset);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        chunks[1],
        &mut app.report_scroll_state,
    );
}

fn dns_table(report: &ScanReport) -> Table<'_> {
    let header = Row::new(["Resolver", "IP", "Location", "Operator"])
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow));

    let rows = report.dns.iter().map(|entry| {
        let ips = if entry.ips.is_empty() {
            Cell::from(entry.error.as_deref().unwrap_or("no answer").to_string())
                .style(Style::default().fg(Color::Red))
        } else {
            Cell::from(entry.ips.iter().map(|ip| ip.to_string()).collect::<Vec<_>>().join(", "))
        };
        Row::new(vec![
            Cell::from(entry.resolver.clone()),
            ips,
            Cell::from(entry.location.clone()),
            Cell::from(entry.operator.clone()),
        ])
    });

    Table::new(
        rows,
        [
            Constraint::Percentage(20),
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ],
    )
    .header(header)
}

fn detail_lines(report: &ScanReport) -> Vec<Line<'_>> {
    let mut lines = vec![
        Line::from(vec![Span::raw("Target: "), Span::styled(report.target.url.to_string(), Style::default().fg(Color::Cyan))]),
        Line::from(format!(
            "Primary IP: {}",
            report.primary_ip.map_or_else(|| "-".to_string(), |ip| ip.to_string())
        )),
        Line::from(""),
        Line::from("TLS CERTIFICATE".yellow().bold()),
    ];

    match &report.tls {
        ProbeOutcome::Available(tls) => {
            let days_style = if tls.days_remaining < 30 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            lines.push(Line::from(format!("Issuer: {}", tls.issuer)));
            lines.push(Line::from(format!("Subject: {}", tls.subject)));
            lines.push(Line::from(format!(
                "Valid: {} -> {}",
                tls.valid_from.format("%Y-%m-%d"),
                tls.valid_to.format("%Y-%m-%d")
            )));
            lines.push(Line::from(vec![
                Span::raw("Days remaining: "),
                Span::styled(tls.days_remaining.to_string(), days_style),
            ]));
            lines.push(Line::from(format!("Protocol: {}", tls.protocol_version)));
        }
        ProbeOutcome::Unavailable { reason } => {
            lines.push(Line::from(Span::styled(format!("Unavailable: {reason}"), Style::default().fg(Color::Red))));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from("SECURITY HEADERS".yellow().bold()));
    for (header, status) in report.headers.iter() {
        let line = match status {
            HeaderStatus::Present { value } => Line::from(vec![
                Span::styled("✓ ", Style::default().fg(Color::Green)),
                Span::raw(format!("{}: {value}", header.title())),
            ]),
            HeaderStatus::Missing => Line::from(vec![
                Span::styled("✗ ", Style::default().fg(Color::Red)),
                Span::raw(header.title()),
            ]),
        };
        lines.push(line);
    }
    lines.push(Line::from(format!("CSP: {}", report.csp.status)));
    for issue in &report.csp.issues {
        lines.push(Line::from(format!("  - {issue}")));
    }

    if let Some(endpoints) = &report.endpoints {
        lines.push(Line::from(""));
        lines.push(Line::from("SENSITIVE ENDPOINTS".yellow().bold()));
        match endpoints {
            ProbeOutcome::Available(found) if found.exposed.is_empty() => {
                lines.push(Line::from(format!("None of {} probed paths exposed.", found.probed)));
            }
            ProbeOutcome::Available(found) => {
                for path in &found.exposed {
                    lines.push(Line::from(Span::styled(format!("Exposed: {path}"), Style::default().fg(Color::Red))));
                }
            }
            ProbeOutcome::Unavailable { reason } => {
                lines.push(Line::from(format!("Unavailable: {reason}")));
            }
        }
    }

    lines
}

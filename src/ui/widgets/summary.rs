// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};
use scano::core::models::{CdnProvider, WafProduct};

/// Renders the summary widget, which provides a high-level overview of the scan results.
///
/// This widget displays the overall score, a progress gauge, the state of the
/// three probes, the recommendation counts and the infrastructure attribution.
/// It only renders content once the scan has finished.
///
/// # Arguments
/// * `frame` - The `Frame` used for rendering the UI.
/// * `app` - A reference to the application's state, containing all scan data.
/// * `area` - The `Rect` defining the drawable area for this widget.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Score & Rating section
            Constraint::Length(1), // Gauge chart
            Constraint::Length(1), // Spacer
            Constraint::Length(4), // Security Checks section
            Constraint::Length(1), // Spacer
            Constraint::Length(4), // Issues Found section
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Infrastructure section
        ])
        .split(area);

    if !matches!(app.state, AppState::Finished) {
        return;
    }

    // --- Score & Rating Section ---
    let (rating_text, rating_style) = match app.summary.score {
        90..=100 => ("Excellent", Style::default().fg(Color::Green)),
        75..=89 => ("Good", Style::default().fg(Color::Cyan)),
        50..=74 => ("Needs Improvement", Style::default().fg(Color::Yellow)),
        _ => ("Poor", Style::default().fg(Color::Red)),
    };
    let score_line = Line::from(format!("{}/100 ({})", app.summary.score, rating_text)).style(rating_style);
    let score_text = Text::from(vec![Line::from("Overall Score".bold()), score_line]);
    frame.render_widget(Paragraph::new(score_text).alignment(Alignment::Center), summary_chunks[0]);

    // --- Gauge Chart (Animated) ---
    let score_gauge = Gauge::default()
        .percent(u16::from(app.displayed_score))
        .label("")
        .style(Style::default().fg(if app.displayed_score >= 80 {
            Color::Green
        } else if app.displayed_score >= 50 {
            Color::Yellow
        } else {
            Color::Red
        }));
    frame.render_widget(score_gauge, summary_chunks[1]);

    // --- Security Checks Section ---
    let checks_block = Block::default().title("SECURITY CHECKS".bold());
    let summary = &app.summary;
    let checks_to_render = [
        (
            format!("Security Headers {}/{}", summary.headers_present, summary.headers_total),
            summary.headers_present == summary.headers_total,
        ),
        ("SSL/TLS Certificate".to_string(), summary.tls_ok),
        (
            format!("DNS Resolvers {}/{}", summary.resolvers_answered, summary.resolvers_total),
            summary.resolvers_answered > 0,
        ),
    ];
    let checks_lines: Vec<Line> = checks_to_render
        .into_iter()
        .map(|(name, passed)| {
            let (icon, style) = if passed {
                ("✓", Style::default().fg(Color::Green))
            } else {
                ("✗", Style::default().fg(Color::Red))
            };
            Line::from(vec![Span::styled(format!("{icon} "), style), Span::raw(name)])
        })
        .collect();
    frame.render_widget(Paragraph::new(checks_lines).block(checks_block), summary_chunks[3]);

    // --- Issue Details Section ---
    let issues_block = Block::default().title("ISSUES FOUND".bold());
    let details_text = Text::from(vec![
        Line::from(vec![
            Span::raw("Critical: "),
            Span::styled(summary.critical_issues.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            Span::raw("Warnings: "),
            Span::styled(summary.warning_issues.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::raw("Info: "),
            Span::styled(summary.info_issues.to_string(), Style::default().fg(Color::Cyan)),
        ]),
    ]);
    frame.render_widget(Paragraph::new(details_text).block(issues_block), summary_chunks[5]);

    // --- Infrastructure Section ---
    let infra_block = Block::default().title("INFRASTRUCTURE".bold());
    let mut infra_lines = Vec::new();
    if let Some(report) = &app.scan_report {
        let infra = &report.infrastructure;
        let cdn_style = match infra.cdn {
            CdnProvider::Unknown => Style::default().fg(Color::DarkGray),
            _ => Style::default().fg(Color::Cyan),
        };
        let waf_style = match infra.waf {
            WafProduct::NotDetected => Style::default().fg(Color::DarkGray),
            _ => Style::default().fg(Color::Green),
        };
        infra_lines.push(Line::from(vec![Span::raw("Server: "), Span::styled(infra.server.clone(), Style::default().fg(Color::Cyan))]));
        infra_lines.push(Line::from(vec![Span::raw("CDN: "), Span::styled(infra.cdn.to_string(), cdn_style)]));
        infra_lines.push(Line::from(vec![Span::raw("WAF: "), Span::styled(infra.waf.to_string(), waf_style)]));
        infra_lines.push(Line::from(vec![Span::raw("Hosting: "), Span::raw(infra.hosting.clone())]));
    }
    frame.render_widget(Paragraph::new(infra_lines).block(infra_block), summary_chunks[7]);
}

// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use scano::core::knowledge_base::{self, FindingCategory};
use scano::core::models::Severity;

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(Color::Red),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Info => Style::default().fg(Color::Cyan),
    }
}

/// Renders the placeholder shown while no report is available.
///
/// Shared with the infrastructure view so both panels agree on the idle,
/// scanning and rejected states.
pub fn render_pending(frame: &mut Frame, app: &App, block: Block, area: Rect) {
    let content = match &app.state {
        AppState::Scanning => {
            let spinner_char = SPINNER_CHARS[app.spinner_frame];
            Paragraph::new(Line::from(vec![
                Span::styled(format!("{spinner_char} "), Style::default().fg(Color::Cyan)),
                Span::raw("Scanning... Please wait."),
            ]))
        }
        AppState::Rejected(reason) => Paragraph::new(Text::from(vec![
            Line::from("TARGET REJECTED".bold().fg(Color::Red)),
            Line::from(""),
            Line::from(reason.as_str()),
        ]))
        .wrap(Wrap { trim: true }),
        _ => Paragraph::new("Scan results will appear here..."),
    };
    frame.render_widget(content.alignment(Alignment::Center).block(block), area);
}

pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Recommendations (Navigate with ↑ ↓, Tab for infrastructure)");

    let Some(report) = app.scan_report.as_ref().filter(|_| matches!(app.state, AppState::Finished)) else {
        render_pending(frame, app, main_block, area);
        return;
    };

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = report
        .recommendations
        .iter()
        .map(|r| {
            let detail = knowledge_base::rule_detail(&r.code);
            let category_prefix = match detail.map(|d| d.category) {
                Some(FindingCategory::Http) => "[HTTP] ",
                Some(FindingCategory::Tls) => "[SSL/TLS] ",
                Some(FindingCategory::Exposure) => "[EXPOSURE] ",
                None => "",
            };
            let title = detail.map_or(r.text.as_str(), |d| d.title);
            ListItem::new(Line::from(vec![
                Span::styled(category_prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(title.to_string(), severity_style(r.severity)),
            ]))
        })
        .collect();

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let selected = app
        .recommendations_state
        .selected()
        .and_then(|i| report.recommendations.get(i));

    let details = match selected {
        Some(recommendation) => {
            let mut text = vec![Line::from("")];
            if let Some(detail) = knowledge_base::rule_detail(&recommendation.code) {
                text.push(Line::from(detail.category.to_string().dark_gray()));
                text.push(Line::from(""));
                text.push(Line::from("WHAT IT IS:".yellow().bold()));
                text.push(Line::from(detail.description));
                text.push(Line::from(""));
            }
            text.push(Line::from("HOW TO FIX:".yellow().bold()));
            text.push(Line::from(recommendation.text.as_str()));
            Paragraph::new(text).wrap(Wrap { trim: true })
        }
        None if report.recommendations.is_empty() => Paragraph::new(Text::from(vec![
            Line::from(""),
            Line::from("✓ EXCELLENT SECURITY POSTURE".bold().fg(Color::Green)),
            Line::from(""),
            Line::from("No recommendations were produced by this scan."),
        ]))
        .alignment(Alignment::Center),
        None => Paragraph::new("Select an item above to see details.").alignment(Alignment::Center),
    };
    let details = details.block(detail_block);

    let findings_list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(findings_list, chunks[0], &mut app.recommendations_state);
    frame.render_widget(details, chunks[1]);
}

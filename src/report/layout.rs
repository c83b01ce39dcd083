// src/report/layout.rs

//! Page layout for the rendered report.
//!
//! The report is first flattened into styled lines, section by section, then
//! placed on A4 pages. Coordinates are PDF points with the origin at the
//! bottom-left corner. A new page starts whenever the next line would fall
//! below the bottom margin.

use crate::core::models::{HeaderStatus, ProbeOutcome, ScanReport};

pub const PAGE_WIDTH_PT: f32 = 595.0;
pub const PAGE_HEIGHT_PT: f32 = 842.0;
pub const MARGIN_PT: f32 = 50.0;
const BODY_INDENT_PT: f32 = 10.0;
const SECTION_GAP_PT: f32 = 14.0;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

pub const TITLE: &str = "Web Security Scan Report";
pub const NO_RECOMMENDATIONS: &str = "No recommendations.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Heading,
    Body,
}

impl TextStyle {
    pub fn font_size(self) -> f32 {
        match self {
            TextStyle::Title => 18.0,
            TextStyle::Heading => 14.0,
            TextStyle::Body => 11.0,
        }
    }

    /// Vertical space the line consumes.
    pub fn leading(self) -> f32 {
        match self {
            TextStyle::Title => 30.0,
            TextStyle::Heading => 20.0,
            TextStyle::Body => 15.0,
        }
    }

    fn indent(self) -> f32 {
        match self {
            TextStyle::Body => BODY_INDENT_PT,
            _ => 0.0,
        }
    }

    /// Characters that fit between the indent and the right margin.
    fn max_chars(self) -> usize {
        let usable = PAGE_WIDTH_PT - 2.0 * MARGIN_PT - self.indent();
        (usable / (self.font_size() * AVG_GLYPH_WIDTH)).floor() as usize
    }
}

/// A line of the document before pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub style: TextStyle,
    pub text: String,
}

impl Line {
    fn title(text: impl Into<String>) -> Self {
        Self { style: TextStyle::Title, text: text.into() }
    }

    fn heading(text: impl Into<String>) -> Self {
        Self { style: TextStyle::Heading, text: text.into() }
    }

    fn body(text: impl Into<String>) -> Self {
        Self { style: TextStyle::Body, text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub style: TextStyle,
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

/// Flattens a report into lines, sections in their fixed order.
pub fn report_lines(report: &ScanReport) -> Vec<Line> {
    let mut lines = vec![
        Line::title(TITLE),
        Line::body(format!("Target: {}", report.target.url)),
        Line::body(format!("Score: {}/100", report.score)),
        Line::body(format!("Date: {}", report.scanned_at.format("%Y-%m-%d %H:%M UTC"))),
    ];

    lines.push(Line::heading("Security Headers"));
    for (header, status) in report.headers.iter() {
        let state = match status {
            HeaderStatus::Present { .. } => "Present",
            HeaderStatus::Missing => "Missing",
        };
        lines.push(Line::body(format!("{}: {state}", header.title())));
    }
    let csp = if report.csp.issues.is_empty() {
        format!("CSP analysis: {}", report.csp.status)
    } else {
        format!("CSP analysis: {} ({})", report.csp.status, report.csp.issues.join(", "))
    };
    lines.push(Line::body(csp));

    lines.push(Line::heading("TLS Information"));
    match &report.tls {
        ProbeOutcome::Available(tls) => {
            lines.push(Line::body(format!("Issuer: {}", tls.issuer)));
            lines.push(Line::body(format!("Subject: {}", tls.subject)));
            lines.push(Line::body(format!("Valid from: {}", tls.valid_from.format("%Y-%m-%d"))));
            lines.push(Line::body(format!("Valid to: {}", tls.valid_to.format("%Y-%m-%d"))));
            lines.push(Line::body(format!("Days remaining: {}", tls.days_remaining)));
            lines.push(Line::body(format!("Protocol: {}", tls.protocol_version)));
        }
        ProbeOutcome::Unavailable { reason } => {
            lines.push(Line::body(format!("TLS unavailable: {reason}")));
        }
    }

    lines.push(Line::heading("DNS Resolution"));
    for entry in &report.dns {
        let ips = if entry.ips.is_empty() {
            "no answer".to_string()
        } else {
            entry.ips.iter().map(|ip| ip.to_string()).collect::<Vec<_>>().join(", ")
        };
        lines.push(Line::body(format!(
            "{} ({}): {} | {} | {}",
            entry.resolver, entry.address, entry.location, entry.operator, ips
        )));
    }

    lines.push(Line::heading("Infrastructure"));
    let infra = &report.infrastructure;
    lines.push(Line::body(format!("Server: {}", infra.server)));
    lines.push(Line::body(format!("CDN: {}", infra.cdn)));
    lines.push(Line::body(format!("WAF: {}", infra.waf)));
    lines.push(Line::body(format!("Hosting: {}", infra.hosting)));

    if let Some(endpoints) = &report.endpoints {
        lines.push(Line::heading("Sensitive Endpoints"));
        match endpoints {
            ProbeOutcome::Available(found) if found.exposed.is_empty() => {
                lines.push(Line::body(format!("None of {} probed paths exposed.", found.probed)));
            }
            ProbeOutcome::Available(found) => {
                lines.extend(found.exposed.iter().map(|p| Line::body(format!("Exposed: {p}"))));
            }
            ProbeOutcome::Unavailable { reason } => {
                lines.push(Line::body(format!("Endpoint probe unavailable: {reason}")));
            }
        }
    }

    lines.push(Line::heading("Recommendations"));
    if report.recommendations.is_empty() {
        lines.push(Line::body(NO_RECOMMENDATIONS));
    } else {
        lines.extend(report.recommendations.iter().map(|r| Line::body(format!("- {}", r.text))));
    }

    lines
}

/// Splits text on whitespace so no line exceeds `max_chars`.
///
/// A single word longer than the limit is hard-broken.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut out = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let split = word.char_indices().nth(max_chars).map_or(word.len(), |(i, _)| i);
            let rest = word.split_off(split);
            out.push(word);
            word = rest;
        }
        let needed = if current.is_empty() { 0 } else { current.chars().count() + 1 };
        if needed + word.chars().count() > max_chars {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Places lines on pages, wrapping long ones and breaking pages at the bottom margin.
pub fn paginate(lines: &[Line]) -> Vec<Page> {
    let top = PAGE_HEIGHT_PT - MARGIN_PT;
    let mut pages = vec![Page::default()];
    let mut y = top;

    for line in lines {
        if line.style == TextStyle::Heading && y < top {
            y -= SECTION_GAP_PT;
        }
        for text in wrap(&line.text, line.style.max_chars()) {
            let baseline = y - line.style.font_size();
            if baseline < MARGIN_PT {
                pages.push(Page::default());
                y = top;
            }
            y -= line.style.leading();
            if let Some(page) = pages.last_mut() {
                page.lines.push(PlacedLine {
                    style: line.style,
                    text,
                    x: MARGIN_PT + line.style.indent(),
                    y: y + line.style.leading() - line.style.font_size(),
                });
            }
        }
    }
    pages
}

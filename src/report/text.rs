// src/report/text.rs

use crate::core::models::ScanReport;
use crate::report::layout::{TextStyle, report_lines};

/// Plain-text rendering with the same sections as the PDF.
pub fn render_text(report: &ScanReport) -> String {
    let mut out = String::new();
    for line in report_lines(report) {
        match line.style {
            TextStyle::Title => {
                out.push_str(&line.text);
                out.push('\n');
                out.push_str(&"=".repeat(line.text.chars().count()));
                out.push('\n');
            }
            TextStyle::Heading => {
                out.push('\n');
                out.push_str(&line.text);
                out.push('\n');
                out.push_str(&"-".repeat(line.text.chars().count()));
                out.push('\n');
            }
            TextStyle::Body => {
                out.push_str("  ");
                out.push_str(&line.text);
                out.push('\n');
            }
        }
    }
    out
}

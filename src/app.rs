// src/app.rs

use std::path::PathBuf;

use ratatui::widgets::{ListState, ScrollbarState};
use scano::core::error::ScanError;
use scano::core::models::{ProbeOutcome, ScanReport, Severity};
use scano::report::pdf::{PDF_FILENAME, render_pdf};
use tracing::{error, info};

pub const SPINNER_CHARS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

pub enum AppState {
    /// The disclaimer popup is waiting for acknowledgement.
    Disclaimer,
    Idle,
    Scanning,
    Finished,
    /// The target was malformed or blocked; no report exists.
    Rejected(String),
}

/// Which panel the report area shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    Recommendations,
    Infrastructure,
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub score: u8,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub info_issues: usize,
    pub headers_present: usize,
    pub headers_total: usize,
    pub tls_ok: bool,
    pub resolvers_answered: usize,
    pub resolvers_total: usize,
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub input: String,
    pub scan_report: Option<ScanReport>,
    pub summary: ScanSummary,
    pub view: ReportView,
    pub recommendations_state: ListState,
    pub scroll_offset: usize,
    pub report_scroll_state: ScrollbarState,
    pub export_status: ExportStatus,
    pub spinner_frame: usize,
    /// Gauge value, animated toward `summary.score`.
    pub displayed_score: u8,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            state: AppState::Disclaimer,
            input: String::new(),
            scan_report: None,
            summary: ScanSummary::default(),
            view: ReportView::Recommendations,
            recommendations_state: ListState::default(),
            scroll_offset: 0,
            report_scroll_state: ScrollbarState::default(),
            export_status: ExportStatus::Idle,
            spinner_frame: 0,
            displayed_score: 0,
        }
    }

    /// Stores the outcome of a finished scan.
    pub fn finish_scan(&mut self, outcome: Result<ScanReport, ScanError>) {
        match outcome {
            Ok(report) => {
                self.recommendations_state = ListState::default();
                if !report.recommendations.is_empty() {
                    self.recommendations_state.select(Some(0));
                }
                self.scan_report = Some(report);
                self.state = AppState::Finished;
                self.update_summary();
            }
            Err(e) => {
                self.state = AppState::Rejected(e.to_string());
            }
        }
    }

    pub fn select_previous(&mut self) {
        match self.view {
            ReportView::Recommendations => self.recommendations_state.select_previous(),
            ReportView::Infrastructure => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                self.report_scroll_state = self.report_scroll_state.position(self.scroll_offset);
            }
        }
    }

    pub fn select_next(&mut self) {
        match self.view {
            ReportView::Recommendations => {
                let len = self.scan_report.as_ref().map_or(0, |r| r.recommendations.len());
                let next = self.recommendations_state.selected().map_or(0, |i| i + 1);
                if next < len {
                    self.recommendations_state.select(Some(next));
                }
            }
            ReportView::Infrastructure => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
                self.report_scroll_state = self.report_scroll_state.position(self.scroll_offset);
            }
        }
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            ReportView::Recommendations => ReportView::Infrastructure,
            ReportView::Infrastructure => ReportView::Recommendations,
        };
    }

    pub fn update_summary(&mut self) {
        if let Some(report) = &self.scan_report {
            let count = |severity: Severity| {
                report
                    .recommendations
                    .iter()
                    .filter(|r| r.severity == severity)
                    .count()
            };
            self.summary = ScanSummary {
                score: report.score,
                critical_issues: count(Severity::Critical),
                warning_issues: count(Severity::Warning),
                info_issues: count(Severity::Info),
                headers_present: report.headers.present_count(),
                headers_total: report.headers.len(),
                tls_ok: matches!(report.tls, ProbeOutcome::Available(_)),
                resolvers_answered: report.dns.iter().filter(|e| !e.ips.is_empty()).count(),
                resolvers_total: report.dns.len(),
            };
        }
    }

    /// Writes the current report as a PDF into the working directory.
    pub fn export_pdf(&mut self) {
        let Some(report) = &self.scan_report else {
            return;
        };
        let path = PathBuf::from(PDF_FILENAME);
        let result = render_pdf(report)
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(&path, bytes).map_err(|e| e.to_string()));
        self.export_status = match result {
            Ok(()) => {
                info!(path = %path.display(), "Report exported.");
                ExportStatus::Success(path.display().to_string())
            }
            Err(e) => {
                error!(error = %e, "Report export failed.");
                ExportStatus::Error(e)
            }
        };
    }

    pub fn on_tick(&mut self) {
        if matches!(self.state, AppState::Scanning) {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
        if matches!(self.state, AppState::Finished) && self.displayed_score < self.summary.score {
            self.displayed_score = (self.displayed_score + 2).min(self.summary.score);
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.scan_report = None;
        self.summary = ScanSummary::default();
        self.view = ReportView::Recommendations;
        self.recommendations_state = ListState::default();
        self.scroll_offset = 0;
        self.report_scroll_state = ScrollbarState::default();
        self.export_status = ExportStatus::Idle;
        self.displayed_score = 0;
    }
}

// src/ui/widgets/mod.rs

// Module declarations for all UI widgets.

pub mod analysis_view; // Recommendations list with knowledge-base details.
pub mod disclaimer_popup; // The legal disclaimer shown at startup.
pub mod footer; // The dynamic key-hint bar.
pub mod infrastructure_view; // DNS panel, TLS certificate and attribution.
pub mod input; // The target input field.
pub mod summary; // Score gauge and check overview.

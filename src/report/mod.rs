// src/report/mod.rs

// Renderers for a finished `ScanReport`. They only read the report; a
// rendering failure never invalidates the scan itself.

pub mod layout;
pub mod pdf;
pub mod text;

pub use pdf::render_pdf;
pub use text::render_text;

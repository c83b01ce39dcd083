// src/report/pdf.rs

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, Pt};
use tracing::{debug, error};

use crate::core::error::RenderError;
use crate::core::models::ScanReport;
use crate::report::layout::{PAGE_HEIGHT_PT, PAGE_WIDTH_PT, Page, TITLE, TextStyle, paginate, report_lines};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const PDF_FILENAME: &str = "scan_report.pdf";

/// Renders the report as a paginated A4 PDF.
///
/// Uses the built-in Helvetica faces, so text outside Windows-1252 is dropped
/// from the output rather than failing the render.
pub fn render_pdf(report: &ScanReport) -> Result<Vec<u8>, RenderError> {
    let pages = paginate(&report_lines(report));
    debug!(pages = pages.len(), url = %report.target.url, "Rendering PDF report.");

    let width = Mm::from(Pt(PAGE_WIDTH_PT));
    let height = Mm::from(Pt(PAGE_HEIGHT_PT));
    let (doc, first_page, first_layer) = PdfDocument::new(TITLE, width, height, "Layer 1");

    let regular = add_font(&doc, BuiltinFont::Helvetica)?;
    let bold = add_font(&doc, BuiltinFont::HelveticaBold)?;

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        draw_page(page, |text, size, x, y, style| {
            let font = match style {
                TextStyle::Body => &regular,
                TextStyle::Title | TextStyle::Heading => &bold,
            };
            layer.use_text(text, size, Mm::from(Pt(x)), Mm::from(Pt(y)), font);
        });
    }

    doc.save_to_bytes().map_err(|e| {
        error!(error = %e, "Failed to serialize PDF document.");
        RenderError::Pdf(e.to_string())
    })
}

fn add_font(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef, RenderError> {
    doc.add_builtin_font(font)
        .map_err(|e| RenderError::Pdf(format!("font {font:?} unavailable: {e}")))
}

fn draw_page(page: &Page, mut draw: impl FnMut(&str, f32, f32, f32, TextStyle)) {
    for line in &page.lines {
        draw(&line.text, line.style.font_size(), line.x, line.y, line.style);
    }
}

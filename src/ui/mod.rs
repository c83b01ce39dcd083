// src/ui/mod.rs

use crate::app::{App, AppState, ReportView};
use ratatui::prelude::*;

mod layout;
mod widgets;

pub fn render(app: &mut App, frame: &mut Frame) {
    let layout = layout::create_layout(frame.area());

    widgets::input::render_input(frame, app, layout.input);

    // The report area switches between the recommendations and the infrastructure panel.
    match app.view {
        ReportView::Recommendations => widgets::analysis_view::render_analysis_view(frame, app, layout.report),
        ReportView::Infrastructure => widgets::infrastructure_view::render_infrastructure_view(frame, app, layout.report),
    }

    widgets::summary::render_summary(frame, app, layout.summary);
    widgets::footer::render_footer(frame, app, layout.footer);

    if matches!(app.state, AppState::Disclaimer) {
        widgets::disclaimer_popup::render_disclaimer_popup(frame, frame.area());
    }
}

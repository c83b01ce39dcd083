// src/ui/widgets/disclaimer_popup.rs

use ratatui::{
    layout::Flex,
    prelude::*,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap},
};

const WHAT_A_SCAN_DOES: [&str; 4] = [
    "one GET against the origin you enter, following redirects",
    "a separate TLS handshake on port 443 to read the certificate",
    "A-record lookups against the configured public resolvers",
    "with path probing enabled, requests for a handful of sensitive files",
];

/// Modal shown once at startup, before the target input accepts keys.
pub fn render_disclaimer_popup(frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 72, 80);

    let mut lines = vec![
        Line::from("Authorized use only".bold().red()),
        Line::default(),
        Line::from("Scanning a single origin sends live traffic to it:"),
    ];
    lines.extend(
        WHAT_A_SCAN_DOES
            .iter()
            .map(|item| Line::from(vec![Span::raw("  - ").dark_gray(), Span::raw(*item)])),
    );
    lines.extend([
        Line::default(),
        Line::from(vec![
            Span::raw("Targets that resolve to loopback, private or link-local addresses are "),
            Span::raw("refused").bold(),
            Span::raw(" before anything is sent."),
        ]),
        Line::default(),
        Line::from("Only scan origins you own or are authorized in writing to assess."),
        Line::from("Unauthorized scanning may be an offence where you or the target are located."),
        Line::default(),
        Line::from(vec![
            Span::styled("Enter", Style::new().bold().yellow()),
            Span::raw(" continue    "),
            Span::styled("q", Style::new().bold().yellow()),
            Span::raw(" / "),
            Span::styled("Esc", Style::new().bold().yellow()),
            Span::raw(" quit"),
        ])
        .centered(),
    ]);

    let block = Block::default()
        .title(" scano ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(Color::Red))
        .padding(Padding::horizontal(2));

    let popup = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

/// `width`% by `height`% of `area`, centered in both directions.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Percentage(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn popup_is_centered_inside_the_frame() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered(area, 72, 80);
        assert_eq!((popup.width, popup.height), (72, 40));
        assert_eq!((popup.x, popup.y), (14, 5));
    }

    #[test]
    fn popup_names_the_keys() {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal
            .draw(|frame| render_disclaimer_popup(frame, frame.area()))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Authorized use only"));
        assert!(text.contains("Enter continue"));
        assert!(text.contains("Esc quit"));
    }
}

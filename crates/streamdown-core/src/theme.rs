use ratatui::style::Style;

/// Styles shared by the streamdown widgets.
///
/// The defaults keep regular prose unstyled so the terminal's own palette wins.
#[derive(Clone, Debug)]
pub struct Theme {
    pub text_primary: Style,
    pub text_muted: Style,
    pub heading: Style,
    pub link: Style,
    pub code: Style,
    /// Inline `??text??` highlight spans.
    pub highlight: Style,
    /// The streaming caret cell.
    pub caret: Style,
    /// Hover popover box and text.
    pub popover: Style,
}

impl Default for Theme {
    fn default() -> Self {
        use ratatui::style::Stylize;

        Self {
            text_primary: Style::default(),
            text_muted: Style::default().dark_gray(),
            heading: Style::default().magenta().bold(),
            link: Style::default().blue().underlined(),
            code: Style::default().cyan(),
            highlight: Style::default().black().on_yellow(),
            caret: Style::default().magenta(),
            popover: Style::default().black().on_white(),
        }
    }
}

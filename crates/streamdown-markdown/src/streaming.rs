//! The streaming reveal widget.
//!
//! [`RevealView`] wires a [`RevealSession`] to a [`MarkdownView`]: every time
//! the session discloses more of the payload, the view reparses the prefix;
//! while the session runs, a caret is drawn one cell past the end of the text;
//! hovering a `??text??` span shows its label in a popover. The widget stays
//! event-loop agnostic — the host forwards input, polls at the deadlines the
//! session reports, and redraws when either says so.

use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use streamdown_core::input::InputEvent;
use streamdown_core::input::KeyCode;
use streamdown_core::input::MouseEventKind;
use streamdown_core::overlay;
use streamdown_core::overlay::PopoverState;
use streamdown_core::theme::Theme;

use crate::reveal::RevealOptions;
use crate::reveal::RevealSession;
use crate::view::MarkdownView;
use crate::view::MarkdownViewOptions;

const CARET: &str = "▍";
const MOUSE_SCROLL_STEP: i32 = 3;

/// A markdown view that reveals its source incrementally.
#[derive(Clone, Debug, Default)]
pub struct RevealView {
    session: RevealSession,
    reveal_options: RevealOptions,
    view: MarkdownView,
    popover: PopoverState,
    /// When set, every prefix change scrolls to the newest line. Scrolling up
    /// clears it; `End`/`G` set it again.
    pub follow_tail: bool,
    started: bool,
}

impl RevealView {
    pub fn new() -> Self {
        Self {
            follow_tail: true,
            ..Default::default()
        }
    }

    pub fn with_options(reveal: RevealOptions, render: MarkdownViewOptions) -> Self {
        Self {
            session: RevealSession::new(),
            reveal_options: reveal,
            view: MarkdownView::with_options(render),
            popover: PopoverState::default(),
            follow_tail: true,
            started: false,
        }
    }

    /// Sets the payload, restarting the reveal from the beginning.
    ///
    /// Setting the same payload again is a no-op: an in-flight reveal keeps
    /// its position instead of flickering back to an empty view.
    pub fn set_source(&mut self, source: &str, now: Instant) {
        if self.started && source == self.session.source() {
            return;
        }
        self.start(source.to_string(), now);
    }

    /// Changes the reveal cadence. A different cadence restarts the reveal
    /// over the current payload; the same cadence is a no-op.
    pub fn set_reveal_options(&mut self, options: RevealOptions, now: Instant) {
        if options == self.reveal_options {
            return;
        }
        self.reveal_options = options;
        if self.started {
            let source = self.session.source().to_string();
            self.start(source, now);
        }
    }

    /// Restarts the reveal over the current payload from the beginning.
    pub fn restart(&mut self, now: Instant) {
        let source = self.session.source().to_string();
        self.start(source, now);
    }

    fn start(&mut self, source: String, now: Instant) {
        self.session.start(source, self.reveal_options, now);
        self.started = true;
        self.popover.hide();
        self.view.set_markdown(self.session.current_prefix());
        self.view.state.to_top();
        self.follow_tail = true;
    }

    /// Advances the reveal clocks. Returns `true` when a redraw is needed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let poll = self.session.poll(now);
        if poll.prefix_changed {
            self.view.set_markdown(self.session.current_prefix());
            if self.follow_tail {
                self.view.state.to_bottom();
            }
        }
        poll.changed()
    }

    /// The next instant [`Self::poll`] has work to do, or `None` once the
    /// reveal is complete.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.next_deadline()
    }

    /// True while the payload is still being disclosed.
    pub fn is_revealing(&self) -> bool {
        self.session.is_active()
    }

    pub fn source(&self) -> &str {
        self.session.source()
    }

    pub fn current_prefix(&self) -> &str {
        self.session.current_prefix()
    }

    pub fn view(&self) -> &MarkdownView {
        &self.view
    }

    /// Handles a key or mouse event for the given render area. Returns `true`
    /// when a redraw is needed.
    pub fn handle_event(&mut self, area: Rect, event: InputEvent) -> bool {
        match event {
            InputEvent::Key(key) => {
                match key.code {
                    KeyCode::End | KeyCode::Char('G') => self.follow_tail = true,
                    KeyCode::Up
                    | KeyCode::Char('k')
                    | KeyCode::PageUp
                    | KeyCode::Home
                    | KeyCode::Char('g') => self.follow_tail = false,
                    _ => {}
                }
                self.view.handle_key(key)
            }
            InputEvent::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => {
                    self.follow_tail = false;
                    self.view.state.scroll_y_by(-MOUSE_SCROLL_STEP);
                    true
                }
                MouseEventKind::ScrollDown => {
                    self.view.state.scroll_y_by(MOUSE_SCROLL_STEP);
                    true
                }
                MouseEventKind::Moved => {
                    let label = self
                        .view
                        .highlight_at(area, mouse.x, mouse.y)
                        .map(str::to_string);
                    match label {
                        Some(label) => self.popover.show(label, mouse.x, mouse.y),
                        None => self.popover.hide(),
                    }
                }
                MouseEventKind::Down(_) | MouseEventKind::Up(_) => false,
            },
        }
    }

    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        self.view.render_ref(area, buf, theme);

        if self.session.is_active() && self.session.caret_visible() {
            if let Some((x, y)) = self.view.caret_cell(area) {
                buf.set_stringn(x, y, CARET, 1, theme.caret);
            }
        }

        overlay::render_popover(area, buf, &self.popover, theme.popover);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use streamdown_core::input::KeyEvent;
    use streamdown_core::input::KeyModifiers;
    use streamdown_core::input::MouseEvent;

    use super::*;

    fn ticks(n: u32) -> Duration {
        RevealOptions::default().tick_interval * n
    }

    fn moved(x: u16, y: u16) -> InputEvent {
        InputEvent::Mouse(MouseEvent {
            x,
            y,
            kind: MouseEventKind::Moved,
            modifiers: KeyModifiers::none(),
        })
    }

    fn no_scrollbar() -> MarkdownViewOptions {
        MarkdownViewOptions {
            show_scrollbar: false,
            ..Default::default()
        }
    }

    #[test]
    fn reveal_grows_the_rendered_prefix() {
        let t0 = Instant::now();
        let mut rv = RevealView::new();
        rv.set_source("hello world", t0);
        assert!(rv.is_revealing());
        assert_eq!(rv.current_prefix(), "");

        assert!(rv.poll(t0 + ticks(1)));
        assert_eq!(rv.view().source(), "hello");

        rv.poll(t0 + ticks(3));
        assert_eq!(rv.view().source(), "hello world");
        assert!(!rv.is_revealing());
        assert_eq!(rv.next_deadline(), None);
    }

    #[test]
    fn same_source_does_not_restart() {
        let t0 = Instant::now();
        let mut rv = RevealView::new();
        rv.set_source("hello world", t0);
        rv.poll(t0 + ticks(1));
        assert_eq!(rv.current_prefix(), "hello");

        rv.set_source("hello world", t0 + ticks(1));
        assert_eq!(rv.current_prefix(), "hello");
    }

    #[test]
    fn changed_source_restarts_from_scratch() {
        let t0 = Instant::now();
        let mut rv = RevealView::new();
        rv.set_source("hello world", t0);
        rv.poll(t0 + ticks(1));

        rv.set_source("other text", t0 + ticks(1));
        assert_eq!(rv.current_prefix(), "");
        assert!(rv.is_revealing());
    }

    #[test]
    fn changed_cadence_restarts_same_cadence_does_not() {
        let t0 = Instant::now();
        let mut rv = RevealView::new();
        rv.set_source("hello world", t0);
        rv.poll(t0 + ticks(1));
        assert_eq!(rv.current_prefix(), "hello");

        rv.set_reveal_options(RevealOptions::default(), t0 + ticks(1));
        assert_eq!(rv.current_prefix(), "hello");

        let faster = RevealOptions {
            chunk_size: 2,
            tick_interval: Duration::from_millis(10),
        };
        rv.set_reveal_options(faster, t0 + ticks(1));
        assert_eq!(rv.current_prefix(), "");
        assert!(rv.is_revealing());
    }

    #[test]
    fn caret_is_drawn_while_revealing_and_gone_after() {
        let t0 = Instant::now();
        let mut rv = RevealView::with_options(RevealOptions::default(), no_scrollbar());
        rv.set_source("ab", t0);

        let area = Rect::new(0, 0, 20, 5);
        let theme = Theme::default();

        let mut buf = Buffer::empty(area);
        rv.render_ref(area, &mut buf, &theme);
        // Nothing revealed yet: the caret sits at the origin.
        assert_eq!(buf[(0, 0)].symbol(), CARET);

        rv.poll(t0 + ticks(1));
        assert!(!rv.is_revealing());
        let mut buf = Buffer::empty(area);
        rv.render_ref(area, &mut buf, &theme);
        assert_ne!(buf[(0, 0)].symbol(), CARET);
        assert_ne!(buf[(2, 0)].symbol(), CARET);
    }

    #[test]
    fn hover_shows_and_hides_popover() {
        let t0 = Instant::now();
        let mut rv = RevealView::with_options(RevealOptions::default(), no_scrollbar());
        rv.set_source("a ??b?? c", t0);
        rv.poll(t0 + Duration::from_secs(1));

        let area = Rect::new(0, 0, 40, 5);
        let theme = Theme::default();
        let mut buf = Buffer::empty(area);
        rv.render_ref(area, &mut buf, &theme);

        // Over the highlighted "b".
        assert!(rv.handle_event(area, moved(2, 0)));
        let mut buf = Buffer::empty(area);
        rv.render_ref(area, &mut buf, &theme);
        let row: String = (0..area.width).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(row.contains("This is highlighted text: \"b\""));

        // Same cell again: no change.
        assert!(!rv.handle_event(area, moved(2, 0)));

        // Off the highlight: popover goes away.
        assert!(rv.handle_event(area, moved(0, 0)));
        let mut buf = Buffer::empty(area);
        rv.render_ref(area, &mut buf, &theme);
        let row: String = (0..area.width).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(!row.contains("highlighted"));
    }

    #[test]
    fn scrolling_up_stops_following_the_tail() {
        let t0 = Instant::now();
        let doc: String = (0..40).map(|i| format!("line {i}\n\n")).collect();
        let mut rv = RevealView::with_options(RevealOptions::default(), no_scrollbar());
        rv.set_source(&doc, t0);
        assert!(rv.follow_tail);

        let area = Rect::new(0, 0, 20, 5);
        let theme = Theme::default();

        rv.poll(t0 + Duration::from_secs(60));
        let mut buf = Buffer::empty(area);
        rv.render_ref(area, &mut buf, &theme);
        let bottom = rv.view().state.y;
        assert!(bottom > 0);

        rv.handle_event(area, InputEvent::Key(KeyEvent::new(KeyCode::Up)));
        assert!(!rv.follow_tail);
        assert_eq!(rv.view().state.y, bottom - 1);

        rv.handle_event(area, InputEvent::Key(KeyEvent::new(KeyCode::End)));
        assert!(rv.follow_tail);
    }

    #[test]
    fn restart_rewinds_and_scrolls_to_top() {
        let t0 = Instant::now();
        let mut rv = RevealView::new();
        rv.set_source("hello world", t0);
        rv.poll(t0 + ticks(3));
        assert!(!rv.is_revealing());

        rv.restart(t0 + ticks(3));
        assert!(rv.is_revealing());
        assert_eq!(rv.current_prefix(), "");
        assert_eq!(rv.view().state.y, 0);
    }
}

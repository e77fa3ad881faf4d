use std::time::Duration;
use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use streamdown_core::input::InputEvent;
use streamdown_core::input::KeyModifiers;
use streamdown_core::input::MouseEvent;
use streamdown_core::input::MouseEventKind;
use streamdown_core::theme::Theme;
use streamdown_markdown::reveal::RevealOptions;
use streamdown_markdown::reveal::RevealSession;
use streamdown_markdown::streaming::RevealView;
use streamdown_markdown::view::MarkdownViewOptions;

const DOC: &str = "\
# Notes

Streaming text with a ??key idea?? inside.

- one
- two
";

fn no_scrollbar() -> MarkdownViewOptions {
    MarkdownViewOptions {
        show_scrollbar: false,
        ..Default::default()
    }
}

fn render(rv: &mut RevealView, area: Rect) -> Buffer {
    let mut buf = Buffer::empty(area);
    let theme = Theme::default();
    rv.render_ref(area, &mut buf, &theme);
    buf
}

fn row(buf: &Buffer, y: u16) -> String {
    (0..buf.area.width)
        .map(|x| buf[(x, y)].symbol())
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Driving the session at its own deadlines reveals everything, in order.
#[test]
fn session_converges_when_driven_by_its_deadlines() {
    let t0 = Instant::now();
    let mut s = RevealSession::new();
    s.start(DOC, RevealOptions::default(), t0);

    let mut prev_len = 0usize;
    let mut steps = 0u32;
    while let Some(deadline) = s.next_deadline() {
        s.poll(deadline);
        let len = s.current_prefix().len();
        assert!(len >= prev_len);
        prev_len = len;
        steps += 1;
        assert!(steps < 10_000, "reveal did not converge");
    }
    assert_eq!(s.current_prefix(), DOC);
    assert!(!s.is_active());
}

/// Half-revealed markdown still parses and renders; the document is simply
/// truncated mid-text.
#[test]
fn partial_prefix_renders_as_markdown() {
    let t0 = Instant::now();
    let mut rv = RevealView::with_options(RevealOptions::default(), no_scrollbar());
    rv.set_source(DOC, t0);
    rv.follow_tail = false;

    // 15 chars: "# Notes\n\nStream" — heading plus the start of the paragraph.
    rv.poll(t0 + RevealOptions::default().tick_interval * 3);
    let buf = render(&mut rv, Rect::new(0, 0, 60, 10));
    assert_eq!(row(&buf, 0), "Notes");
    assert_eq!(row(&buf, 2), "Stream▍");
}

#[test]
fn full_reveal_renders_highlight_and_list() {
    let t0 = Instant::now();
    let mut rv = RevealView::with_options(RevealOptions::default(), no_scrollbar());
    rv.set_source(DOC, t0);
    rv.follow_tail = false;
    rv.poll(t0 + Duration::from_secs(30));
    assert!(!rv.is_revealing());

    let area = Rect::new(0, 0, 60, 10);
    let buf = render(&mut rv, area);
    assert_eq!(row(&buf, 0), "Notes");
    assert_eq!(row(&buf, 2), "Streaming text with a key idea inside.");
    assert_eq!(row(&buf, 4), "• one");
    assert_eq!(row(&buf, 5), "• two");

    // The delimiters are gone and the span wears the highlight background.
    let theme = Theme::default();
    assert_eq!(buf[(22, 2)].style().bg, theme.highlight.bg);
    assert_ne!(buf[(21, 2)].style().bg, theme.highlight.bg);
}

#[test]
fn hovering_the_highlight_pops_the_label() {
    let t0 = Instant::now();
    let mut rv = RevealView::with_options(RevealOptions::default(), no_scrollbar());
    rv.set_source(DOC, t0);
    rv.follow_tail = false;
    rv.poll(t0 + Duration::from_secs(30));

    let area = Rect::new(0, 0, 60, 10);
    render(&mut rv, area);

    let hover = |x, y| {
        InputEvent::Mouse(MouseEvent {
            x,
            y,
            kind: MouseEventKind::Moved,
            modifiers: KeyModifiers::none(),
        })
    };

    // "key idea" occupies columns 22..30 of row 2.
    assert!(rv.handle_event(area, hover(25, 2)));
    let buf = render(&mut rv, area);
    assert!(row(&buf, 1).contains("This is highlighted text: \"key idea\""));

    assert!(rv.handle_event(area, hover(0, 0)));
    let buf = render(&mut rv, area);
    assert!(!row(&buf, 1).contains("highlighted"));
}

/// Replacing the payload mid-reveal abandons the old session outright: the
/// next poll reveals the new payload from the start, at the new cadence.
#[test]
fn replacing_the_payload_mid_reveal_is_atomic() {
    let t0 = Instant::now();
    let mut rv = RevealView::new();
    rv.set_source(DOC, t0);
    let tick = RevealOptions::default().tick_interval;
    rv.poll(t0 + tick);
    assert_eq!(rv.current_prefix(), "# Not");

    let t1 = t0 + tick;
    rv.set_source("fresh", t1);
    assert_eq!(rv.current_prefix(), "");

    // A wake-up scheduled for the old session's deadline polls early and
    // reveals nothing of the old payload.
    rv.poll(t1 + Duration::from_millis(1));
    assert_eq!(rv.current_prefix(), "");

    rv.poll(t1 + tick);
    assert_eq!(rv.current_prefix(), "fresh");
}

#[test]
fn deadline_is_the_earlier_of_the_two_clocks() {
    let t0 = Instant::now();
    let mut s = RevealSession::new();
    let opts = RevealOptions {
        chunk_size: 1,
        tick_interval: Duration::from_secs(2),
    };
    s.start("abc", opts, t0);

    // Blink (530ms) comes before the first reveal tick (2s).
    assert_eq!(
        s.next_deadline(),
        Some(t0 + streamdown_markdown::reveal::CARET_BLINK_INTERVAL)
    );
}

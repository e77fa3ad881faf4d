use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;

use crate::viewport::ViewportState;

/// Renders `spans` on one buffer row, skipping the first `start_col` cells and
/// clipping to `max_cols`.
///
/// Wide characters that would straddle either clip edge are dropped whole so a
/// double-width glyph never renders half a cell. Zero-width characters are
/// skipped. Text is expected to be tab-free (the markdown layer expands tabs).
pub fn render_spans_clipped(
    x: u16,
    y: u16,
    start_col: u32,
    max_cols: u16,
    buf: &mut Buffer,
    spans: &[Span<'_>],
    fallback_style: Style,
) {
    if max_cols == 0 {
        return;
    }

    let start_col = start_col as usize;
    let end_col = start_col + max_cols as usize;
    let mut col = 0usize;
    let mut dx = 0u16;
    let mut tmp = [0u8; 4];

    for span in spans {
        let style = if span.style == Style::default() {
            fallback_style
        } else {
            span.style
        };
        for ch in span.content.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if w == 0 {
                continue;
            }
            if col + w > end_col {
                return;
            }
            // A wide char overlapping the left clip edge is skipped entirely.
            if col < start_col {
                col += w;
                continue;
            }

            if let Some(cell) = buf.cell_mut((x + dx, y)) {
                cell.set_style(style);
                cell.set_symbol(ch.encode_utf8(&mut tmp));
            }
            dx += 1;
            col += w;

            if w == 2 {
                if let Some(cell) = buf.cell_mut((x + dx, y)) {
                    cell.set_style(style);
                    cell.set_symbol("");
                }
                dx += 1;
            }
        }
    }
}

/// Renders a one-column scrollbar track for `state` into `area`.
pub fn render_scrollbar(area: Rect, buf: &mut Buffer, state: &ViewportState, style: Style) {
    buf.set_style(area, style);
    if area.height == 0 {
        return;
    }
    if state.content_h == 0 || state.content_h <= state.viewport_h as u32 {
        for dy in 0..area.height {
            buf.set_stringn(area.x, area.y + dy, " ", 1, style);
        }
        return;
    }

    let track = area.height as f64;
    let thumb = ((state.viewport_h as f64 / state.content_h as f64) * track)
        .round()
        .clamp(1.0, track) as u16;
    let max_y = state
        .content_h
        .saturating_sub(state.viewport_h as u32)
        .max(1) as f64;
    let top = ((state.y as f64 / max_y) * (track - thumb as f64))
        .round()
        .clamp(0.0, (track - thumb as f64).max(0.0)) as u16;

    for dy in 0..area.height {
        let ch = if dy >= top && dy < top + thumb {
            "█"
        } else {
            " "
        };
        buf.set_stringn(area.x, area.y + dy, ch, 1, style);
    }
}

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

/// Transient popover state anchored near a pointer position.
///
/// Owned by the view instance that feeds it pointer events; there is no global
/// listener registry, so multiple views never collide.
#[derive(Clone, Debug, Default)]
pub struct PopoverState {
    content: Option<String>,
    x: u16,
    y: u16,
}

impl PopoverState {
    /// Shows `content` anchored at the pointer cell. Returns `true` when the
    /// visible state actually changed (content or anchor).
    pub fn show(&mut self, content: impl Into<String>, x: u16, y: u16) -> bool {
        let content = content.into();
        if self.content.as_deref() == Some(content.as_str()) && self.x == x && self.y == y {
            return false;
        }
        self.content = Some(content);
        self.x = x;
        self.y = y;
        true
    }

    /// Hides the popover. Returns `true` when it was visible.
    pub fn hide(&mut self) -> bool {
        self.content.take().is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.content.is_some()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn anchor(&self) -> (u16, u16) {
        (self.x, self.y)
    }
}

/// Renders `popover` as a one-line box near its anchor, clamped into `area`.
///
/// The box prefers the row above the anchor so it does not cover the hovered
/// cell, and falls back to the row below at the top edge.
pub fn render_popover(area: Rect, buf: &mut Buffer, popover: &PopoverState, style: Style) {
    let Some(content) = popover.content() else {
        return;
    };
    if area.width < 4 || area.height == 0 {
        return;
    }

    let (anchor_x, anchor_y) = popover.anchor();
    let max_w = area.width as usize;
    let text = clip_to_width(content, max_w.saturating_sub(2));
    let box_w = (UnicodeWidthStr::width(text.as_str()) + 2).min(max_w) as u16;

    let y = if anchor_y > area.y {
        anchor_y - 1
    } else {
        (anchor_y + 1).min(area.y + area.height - 1)
    };
    let x_max = area.x + area.width - box_w;
    let x = anchor_x
        .saturating_sub(box_w / 2)
        .clamp(area.x, x_max.max(area.x));

    let rect = Rect::new(x, y, box_w, 1);
    buf.set_style(rect, style);
    buf.set_stringn(x, y, " ", 1, style);
    buf.set_stringn(x + 1, y, &text, box_w.saturating_sub(2) as usize, style);
    buf.set_stringn(x + box_w.saturating_sub(1), y, " ", 1, style);
}

fn clip_to_width(s: &str, max_cols: usize) -> String {
    let mut out = String::new();
    let mut cols = 0usize;
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            break;
        }
        out.push(ch);
        cols += w;
    }
    out
}

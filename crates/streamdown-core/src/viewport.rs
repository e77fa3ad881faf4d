/// Scroll state for content larger than its viewport.
///
/// Offsets are kept in terminal cell units. Setting either the viewport or the
/// content size re-clamps the offsets, so callers can move first and let the
/// next layout pass settle the position (e.g. `y = u32::MAX` means "stick to
/// the bottom once the content height is known").
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewportState {
    pub x: u32,
    pub y: u32,
    pub viewport_w: u16,
    pub viewport_h: u16,
    pub content_w: u32,
    pub content_h: u32,
}

impl ViewportState {
    pub fn set_viewport(&mut self, w: u16, h: u16) {
        self.viewport_w = w;
        self.viewport_h = h;
        self.clamp();
    }

    pub fn set_content(&mut self, w: u32, h: u32) {
        self.content_w = w;
        self.content_h = h;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        self.x = self.x.min(self.max_x());
        self.y = self.y.min(self.max_y());
    }

    pub fn scroll_y_by(&mut self, delta: i32) {
        self.y = if delta < 0 {
            self.y.saturating_sub(delta.unsigned_abs())
        } else {
            self.y.saturating_add(delta as u32).min(self.max_y())
        };
    }

    pub fn scroll_x_by(&mut self, delta: i32) {
        self.x = if delta < 0 {
            self.x.saturating_sub(delta.unsigned_abs())
        } else {
            self.x.saturating_add(delta as u32).min(self.max_x())
        };
    }

    pub fn page_down(&mut self) {
        self.scroll_y_by(self.viewport_h.saturating_sub(1) as i32);
    }

    pub fn page_up(&mut self) {
        self.scroll_y_by(-(self.viewport_h.saturating_sub(1) as i32));
    }

    pub fn to_top(&mut self) {
        self.y = 0;
    }

    /// Requests the bottom of the content. The offset is left unclamped so
    /// that the next `set_viewport`/`set_content` pass lands on the true
    /// bottom even when more lines are about to be laid out.
    pub fn to_bottom(&mut self) {
        self.y = u32::MAX;
    }

    fn max_y(&self) -> u32 {
        self.content_h.saturating_sub(self.viewport_h as u32)
    }

    fn max_x(&self) -> u32 {
        self.content_w.saturating_sub(self.viewport_w as u32)
    }
}

use crate::animation::ElementRect;

/// Vertical scroll position over a virtual page taller than the window. The page is the
/// element the timeline trigger tracks.
#[derive(Debug, Clone)]
pub struct ScrollState {
    offset: f32,
    viewport_height: f32,
    height_in_viewports: f32,
}

impl ScrollState {
    pub fn new(height_in_viewports: f32) -> Self {
        Self {
            offset: 0.0,
            viewport_height: 0.0,
            height_in_viewports: height_in_viewports.max(1.0),
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn page_height(&self) -> f32 {
        self.viewport_height * self.height_in_viewports
    }

    pub fn page(&self) -> ElementRect {
        ElementRect {
            top: 0.0,
            height: self.page_height(),
        }
    }

    pub fn max_offset(&self) -> f32 {
        (self.page_height() - self.viewport_height).max(0.0)
    }

    /// Keeps the relative scroll position when the viewport changes size.
    pub fn set_viewport_height(&mut self, viewport_height: f32) {
        let fraction = if self.max_offset() > 0.0 {
            self.offset / self.max_offset()
        } else {
            0.0
        };

        self.viewport_height = viewport_height.max(0.0);
        self.offset = fraction * self.max_offset();
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll_to(self.offset + delta);
    }

    pub fn scroll_to(&mut self, offset: f32) {
        self.offset = offset.clamp(0.0, self.max_offset());
    }

    pub fn page_down(&mut self) {
        self.scroll_by(self.viewport_height);
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-self.viewport_height);
    }

    pub fn home(&mut self) {
        self.scroll_to(0.0);
    }

    pub fn end(&mut self) {
        self.scroll_to(self.max_offset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ScrollTrigger;

    #[test]
    fn offset_is_clamped_to_the_page() {
        let mut scroll = ScrollState::new(4.0);
        scroll.set_viewport_height(600.0);

        scroll.scroll_by(-100.0);
        assert_eq!(scroll.offset(), 0.0);

        scroll.scroll_by(10_000.0);
        assert_eq!(scroll.offset(), 1800.0);
    }

    #[test]
    fn paging_moves_one_viewport() {
        let mut scroll = ScrollState::new(4.0);
        scroll.set_viewport_height(600.0);

        scroll.page_down();
        scroll.page_down();
        assert_eq!(scroll.offset(), 1200.0);
        scroll.page_up();
        assert_eq!(scroll.offset(), 600.0);
        scroll.end();
        assert_eq!(scroll.offset(), 1800.0);
        scroll.home();
        assert_eq!(scroll.offset(), 0.0);
    }

    #[test]
    fn resizing_keeps_trigger_progress() {
        let trigger = ScrollTrigger::default();
        let mut scroll = ScrollState::new(4.0);
        scroll.set_viewport_height(600.0);
        scroll.scroll_to(900.0);

        let before = trigger.progress(scroll.page(), scroll.viewport_height(), scroll.offset());
        scroll.set_viewport_height(300.0);
        let after = trigger.progress(scroll.page(), scroll.viewport_height(), scroll.offset());

        assert_eq!(before, 0.5);
        assert_eq!(after, 0.5);
    }

    #[test]
    fn zero_height_viewport_cannot_scroll() {
        let mut scroll = ScrollState::new(4.0);
        scroll.scroll_by(50.0);
        assert_eq!(scroll.offset(), 0.0);
    }
}

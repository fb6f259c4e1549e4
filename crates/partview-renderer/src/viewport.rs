//! Viewport size tracking.

/// Render-surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build from a fractional container size, rounding to whole pixels.
    pub fn from_f32(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0).round() as u32,
            height: height.max(0.0).round() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, `None` for an empty viewport.
    pub fn aspect(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

/// Observes the container size and reports changes.
#[derive(Debug, Default)]
pub struct ViewportManager {
    size: Option<ViewportSize>,
    observing: bool,
}

impl ViewportManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing the container.
    pub fn attach(&mut self) {
        self.observing = true;
    }

    /// Stop observing; later size reports are ignored.
    pub fn detach(&mut self) {
        self.observing = false;
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Last size accepted from the container.
    pub fn size(&self) -> Option<ViewportSize> {
        self.size
    }

    /// Report the container size. Returns the new size if it changed and the
    /// manager is observing.
    pub fn observe(&mut self, size: ViewportSize) -> Option<ViewportSize> {
        if !self.observing || size.is_empty() || self.size == Some(size) {
            return None;
        }
        tracing::debug!("Viewport resized to {}x{}", size.width, size.height);
        self.size = Some(size);
        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_reports_changes_only() {
        let mut manager = ViewportManager::new();
        let size = ViewportSize::new(800, 600);
        assert_eq!(manager.observe(size), None);

        manager.attach();
        assert_eq!(manager.observe(size), Some(size));
        assert_eq!(manager.observe(size), None);
        assert_eq!(manager.observe(ViewportSize::new(0, 600)), None);
        assert_eq!(manager.size(), Some(size));

        manager.detach();
        assert_eq!(manager.observe(ViewportSize::new(1024, 768)), None);
    }

    #[test]
    fn test_aspect() {
        assert_eq!(ViewportSize::new(800, 400).aspect(), Some(2.0));
        assert_eq!(ViewportSize::new(0, 400).aspect(), None);
        assert_eq!(ViewportSize::from_f32(99.6, -3.0), ViewportSize::new(100, 0));
    }
}

//! Frame scheduling through egui repaint requests

use partview_renderer::FrameScheduler;

/// Requests repaints from egui until cancelled.
pub struct RepaintScheduler {
    request: Box<dyn Fn() + Send>,
    cancelled: bool,
}

impl RepaintScheduler {
    pub fn new(request: impl Fn() + Send + 'static) -> Self {
        Self {
            request: Box::new(request),
            cancelled: false,
        }
    }

    pub fn for_context(ctx: egui::Context) -> Self {
        Self::new(move || ctx.request_repaint())
    }
}

impl FrameScheduler for RepaintScheduler {
    fn schedule(&mut self) {
        if !self.cancelled {
            (self.request)();
        }
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }
}

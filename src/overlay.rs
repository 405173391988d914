use std::time::Duration;

use crate::geometry::Rect;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        use web_time::Instant;
    } else {
        use std::time::Instant;
    }
}

pub trait OverlayHost {
    // Viewport-relative; `None` while the target is not mounted.
    fn target_rect(&self) -> Option<Rect>;
    fn mount_overlay(&mut self, rect: Rect) -> anyhow::Result<()>;
    fn place_overlay(&mut self, rect: Rect);
    // Wipes the canvas pixels.
    fn resize_canvas(&mut self, width: u32, height: u32);
    fn unmount_overlay(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reposition {
    Detached,
    Unchanged,
    Moved,
    /// Canvas was resized and cleared; repaint now.
    Resized,
}

impl Reposition {
    pub fn needs_repaint(self) -> bool {
        self == Reposition::Resized
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    Repositioned(Reposition),
    /// Call [`OverlayManager::flush_scroll`] after `retry_in`.
    Deferred { retry_in: Duration },
    Dropped,
}

enum Gate {
    Run,
    Defer(Duration),
    Drop,
}

// Leading edge plus one trailing call.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: false,
        }
    }

    fn request(&mut self, now: Instant) -> Gate {
        match self.last_run {
            Some(last) if now.duration_since(last) < self.interval => {
                if self.pending {
                    Gate::Drop
                } else {
                    self.pending = true;
                    Gate::Defer(self.interval - now.duration_since(last))
                }
            }
            _ => {
                self.last_run = Some(now);
                self.pending = false;
                Gate::Run
            }
        }
    }

    fn take_pending(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.last_run = Some(now);
        true
    }
}

pub struct OverlayManager<H: OverlayHost> {
    host: H,
    rect: Option<Rect>,
    canvas_size: (u32, u32),
    scroll: Throttle,
}

impl<H: OverlayHost> OverlayManager<H> {
    pub fn new(host: H, scroll_throttle: Duration) -> Self {
        Self {
            host,
            rect: None,
            canvas_size: (0, 0),
            scroll: Throttle::new(scroll_throttle),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_attached(&self) -> bool {
        self.rect.is_some()
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.canvas_size
    }

    /// Returns `false` when the target is not mounted yet; retry later.
    pub fn attach(&mut self) -> bool {
        if self.is_attached() {
            return true;
        }
        let Some(rect) = self.host.target_rect() else {
            log::debug!("Overlay target not mounted yet");
            return false;
        };

        if let Err(e) = self.host.mount_overlay(rect) {
            log::error!("Failed to create overlay: {:#}", e);
            return false;
        }

        let (width, height) = rect.pixel_size();
        self.host.resize_canvas(width, height);
        self.canvas_size = (width, height);
        self.rect = Some(rect);
        log::info!("Overlay attached at {:?} ({}x{})", rect, width, height);
        true
    }

    pub fn reposition(&mut self) -> Reposition {
        if self.rect.is_none() {
            return Reposition::Detached;
        }
        let Some(rect) = self.host.target_rect() else {
            return Reposition::Detached;
        };

        let moved = self.rect != Some(rect);
        if moved {
            self.host.place_overlay(rect);
            self.rect = Some(rect);
        }

        let size = rect.pixel_size();
        if size != self.canvas_size {
            self.host.resize_canvas(size.0, size.1);
            self.canvas_size = size;
            log::info!("Overlay canvas resized to {}x{}", size.0, size.1);
            return Reposition::Resized;
        }

        if moved {
            Reposition::Moved
        } else {
            Reposition::Unchanged
        }
    }

    pub fn on_scroll(&mut self, now: Instant) -> ScrollAction {
        match self.scroll.request(now) {
            Gate::Run => ScrollAction::Repositioned(self.reposition()),
            Gate::Defer(retry_in) => ScrollAction::Deferred { retry_in },
            Gate::Drop => ScrollAction::Dropped,
        }
    }

    pub fn flush_scroll(&mut self, now: Instant) -> Option<Reposition> {
        self.scroll
            .take_pending(now)
            .then(|| self.reposition())
    }

    pub fn detach(&mut self) {
        if self.rect.take().is_some() {
            self.host.unmount_overlay();
            self.canvas_size = (0, 0);
            log::info!("Overlay detached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHost {
        target: Option<Rect>,
        mounted: bool,
        placed: Vec<Rect>,
        resizes: Vec<(u32, u32)>,
        unmounts: usize,
    }

    impl OverlayHost for FakeHost {
        fn target_rect(&self) -> Option<Rect> {
            self.target
        }
        fn mount_overlay(&mut self, _rect: Rect) -> anyhow::Result<()> {
            self.mounted = true;
            Ok(())
        }
        fn place_overlay(&mut self, rect: Rect) {
            self.placed.push(rect);
        }
        fn resize_canvas(&mut self, width: u32, height: u32) {
            self.resizes.push((width, height));
        }
        fn unmount_overlay(&mut self) {
            self.mounted = false;
            self.unmounts += 1;
        }
    }

    fn manager(target: Option<Rect>) -> OverlayManager<FakeHost> {
        OverlayManager::new(
            FakeHost {
                target,
                ..Default::default()
            },
            Duration::from_millis(16),
        )
    }

    #[test]
    fn test_attach_without_target_is_noop() {
        let mut overlay = manager(None);
        assert!(!overlay.attach());
        assert!(!overlay.host().mounted);
        assert_eq!(overlay.reposition(), Reposition::Detached);
    }

    #[test]
    fn test_attach_sizes_canvas_to_target() {
        let mut overlay = manager(Some(Rect::new(10.0, 20.0, 300.0, 200.0)));
        assert!(overlay.attach());
        assert!(overlay.host().mounted);
        assert_eq!(overlay.canvas_size(), (300, 200));
        assert_eq!(overlay.host().resizes, vec![(300, 200)]);
    }

    #[test]
    fn test_late_image_load_attaches_on_retry() {
        let mut overlay = manager(None);
        assert!(!overlay.attach());
        overlay.host_mut().target = Some(Rect::new(0.0, 0.0, 64.0, 48.0));
        assert!(overlay.attach());
    }

    #[test]
    fn test_reposition_moves_then_resizes() {
        let mut overlay = manager(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        overlay.attach();
        assert_eq!(overlay.reposition(), Reposition::Unchanged);

        overlay.host_mut().target = Some(Rect::new(0.0, -40.0, 100.0, 100.0));
        assert_eq!(overlay.reposition(), Reposition::Moved);

        overlay.host_mut().target = Some(Rect::new(0.0, -40.0, 150.0, 100.0));
        let result = overlay.reposition();
        assert_eq!(result, Reposition::Resized);
        assert!(result.needs_repaint());
        assert_eq!(overlay.host().resizes.last(), Some(&(150, 100)));
    }

    #[test]
    fn test_detach_is_idempotent() {
        let mut overlay = manager(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        overlay.attach();
        overlay.detach();
        overlay.detach();
        assert_eq!(overlay.host().unmounts, 1);
        assert!(!overlay.is_attached());
    }

    #[test]
    fn test_scroll_throttle_keeps_only_trailing_call() {
        let mut overlay = manager(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        overlay.attach();
        let t0 = Instant::now();

        assert_eq!(
            overlay.on_scroll(t0),
            ScrollAction::Repositioned(Reposition::Unchanged)
        );
        overlay.host_mut().target = Some(Rect::new(0.0, -10.0, 100.0, 100.0));
        assert!(matches!(
            overlay.on_scroll(t0 + Duration::from_millis(5)),
            ScrollAction::Deferred { .. }
        ));
        overlay.host_mut().target = Some(Rect::new(0.0, -20.0, 100.0, 100.0));
        assert_eq!(
            overlay.on_scroll(t0 + Duration::from_millis(8)),
            ScrollAction::Dropped
        );

        assert_eq!(
            overlay.flush_scroll(t0 + Duration::from_millis(16)),
            Some(Reposition::Moved)
        );
        assert_eq!(overlay.rect(), Some(Rect::new(0.0, -20.0, 100.0, 100.0)));
        assert_eq!(overlay.host().placed.len(), 1);
        assert_eq!(overlay.flush_scroll(t0 + Duration::from_millis(40)), None);
    }
}

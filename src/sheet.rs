//! Native stand-in for the page element: a sheet centered in the window.

use crate::color::Rgba;
use crate::geometry::Rect;
use crate::overlay::OverlayHost;

pub const SHEET_SIZE: (f64, f64) = (960.0, 640.0);
pub const SHEET_COLOR: Rgba = [1.0, 1.0, 1.0, 1.0];
const SHEET_MARGIN: f64 = 24.0;

/// Centered sheet rect for a window, shrunk to fit with a margin. `None` when
/// the window is too small to hold any sheet (e.g. minimized).
pub fn sheet_rect(window: (f64, f64)) -> Option<Rect> {
    let width = SHEET_SIZE.0.min(window.0 - SHEET_MARGIN * 2.0);
    let height = SHEET_SIZE.1.min(window.1 - SHEET_MARGIN * 2.0);
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Rect::new(
        ((window.0 - width) / 2.0).floor(),
        ((window.1 - height) / 2.0).floor(),
        width,
        height,
    ))
}

/// Scissor box `(x, y, width, height)` that clips drawing to the sheet,
/// clamped to the surface. `None` when nothing of the sheet is visible.
pub fn scissor_rect(sheet: Rect, surface: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let (sw, sh) = (surface.0 as f64, surface.1 as f64);
    let left = sheet.left.clamp(0.0, sw);
    let top = sheet.top.clamp(0.0, sh);
    let right = sheet.right().clamp(0.0, sw);
    let bottom = sheet.bottom().clamp(0.0, sh);

    let (x, y) = (left.floor() as u32, top.floor() as u32);
    let (w, h) = (right.ceil() as u32 - x, bottom.ceil() as u32 - y);
    (w > 0 && h > 0).then_some((x, y, w, h))
}

#[derive(Debug, Default)]
pub struct SheetHost {
    window_size: (f64, f64),
    mounted: bool,
}

impl SheetHost {
    pub fn new(window_size: (f64, f64)) -> Self {
        Self {
            window_size,
            mounted: false,
        }
    }

    pub fn set_window_size(&mut self, size: (f64, f64)) {
        self.window_size = size;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl OverlayHost for SheetHost {
    fn target_rect(&self) -> Option<Rect> {
        sheet_rect(self.window_size)
    }

    fn mount_overlay(&mut self, _rect: Rect) -> anyhow::Result<()> {
        self.mounted = true;
        Ok(())
    }

    fn place_overlay(&mut self, rect: Rect) {
        log::debug!("Sheet moved to {:?}", rect);
    }

    // The painter re-tessellates every frame, so there is no backing store.
    fn resize_canvas(&mut self, _width: u32, _height: u32) {}

    fn unmount_overlay(&mut self) {
        self.mounted = false;
    }
}

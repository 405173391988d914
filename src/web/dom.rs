use anyhow::anyhow;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlCanvasElement, HtmlElement};

use crate::geometry::Rect;
use crate::overlay::OverlayHost;
use crate::web::canvas2d::Canvas2dPainter;

const OVERLAY_Z_INDEX: &str = "1000";

/// Overlay host for a DOM element found by id. The element is looked up on
/// every measurement, so a target mounted later is picked up on retry.
pub struct DomHost {
    document: Document,
    target_id: String,
    overlay: Option<HtmlElement>,
    canvas: Option<HtmlCanvasElement>,
}

impl DomHost {
    pub fn new(document: Document, target_id: impl Into<String>) -> Self {
        Self {
            document,
            target_id: target_id.into(),
            overlay: None,
            canvas: None,
        }
    }

    pub fn target(&self) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(&self.target_id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .filter(|el| el.is_connected())
    }

    pub fn canvas(&self) -> Option<&HtmlCanvasElement> {
        self.canvas.as_ref()
    }

    pub fn painter(&self) -> Option<Canvas2dPainter> {
        let canvas = self.canvas.as_ref()?;
        match Canvas2dPainter::new(canvas) {
            Ok(painter) => Some(painter),
            Err(e) => {
                log::error!("No 2d context on overlay canvas: {:?}", e);
                None
            }
        }
    }

    fn create_element<T: JsCast>(&self, tag: &str) -> anyhow::Result<T> {
        self.document
            .create_element(tag)
            .map_err(|e| anyhow!("create_element({tag}) failed: {e:?}"))?
            .dyn_into::<T>()
            .map_err(|_| anyhow!("<{tag}> has an unexpected type"))
    }
}

fn set_style(el: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = el.style().set_property(property, value) {
        log::warn!("Failed to set {}: {:?}", property, e);
    }
}

fn place(el: &HtmlElement, rect: Rect) {
    set_style(el, "left", &format!("{}px", rect.left));
    set_style(el, "top", &format!("{}px", rect.top));
    set_style(el, "width", &format!("{}px", rect.width));
    set_style(el, "height", &format!("{}px", rect.height));
}

impl OverlayHost for DomHost {
    fn target_rect(&self) -> Option<Rect> {
        let bounds = self.target()?.get_bounding_client_rect();
        Some(Rect::new(
            bounds.left(),
            bounds.top(),
            bounds.width(),
            bounds.height(),
        ))
    }

    fn mount_overlay(&mut self, rect: Rect) -> anyhow::Result<()> {
        let overlay: HtmlElement = self.create_element("div")?;
        let canvas: HtmlCanvasElement = self.create_element("canvas")?;

        // Fixed coordinates are viewport-relative, matching getBoundingClientRect.
        set_style(&overlay, "position", "fixed");
        set_style(&overlay, "z-index", OVERLAY_Z_INDEX);
        set_style(&overlay, "pointer-events", "auto");
        set_style(&overlay, "touch-action", "none");
        place(&overlay, rect);

        set_style(&canvas, "display", "block");
        set_style(&canvas, "width", "100%");
        set_style(&canvas, "height", "100%");

        overlay
            .append_child(&canvas)
            .map_err(|e| anyhow!("Failed to append canvas: {e:?}"))?;
        self.document
            .body()
            .ok_or_else(|| anyhow!("Document has no body"))?
            .append_child(&overlay)
            .map_err(|e| anyhow!("Failed to append overlay: {e:?}"))?;

        self.overlay = Some(overlay);
        self.canvas = Some(canvas);
        Ok(())
    }

    fn place_overlay(&mut self, rect: Rect) {
        if let Some(overlay) = &self.overlay {
            place(overlay, rect);
        }
    }

    fn resize_canvas(&mut self, width: u32, height: u32) {
        if let Some(canvas) = &self.canvas {
            canvas.set_width(width);
            canvas.set_height(height);
        }
    }

    fn unmount_overlay(&mut self) {
        self.canvas = None;
        if let Some(overlay) = self.overlay.take() {
            overlay.remove();
        }
    }
}

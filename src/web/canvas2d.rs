//! [`Painter`] over a `CanvasRenderingContext2d`.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::color::Rgba;
use crate::geometry::{Point, Rect};
use crate::render::{Painter, Stroke};

pub struct Canvas2dPainter {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl Canvas2dPainter {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        ctx.set_line_cap("round");
        ctx.set_line_join("round");

        Ok(Self {
            ctx,
            width: canvas.width() as f64,
            height: canvas.height() as f64,
        })
    }

    fn apply_stroke(&self, stroke: &Stroke) {
        self.ctx.set_stroke_style_str(&css_color(stroke.color));
        self.ctx.set_line_width(stroke.width);

        let dashes = js_sys::Array::new();
        if let Some(dash) = stroke.dash {
            dashes.push(&JsValue::from_f64(dash));
            dashes.push(&JsValue::from_f64(dash));
        }
        if let Err(e) = self.ctx.set_line_dash(&dashes) {
            log::warn!("set_line_dash failed: {:?}", e);
        }
    }

    fn circle_path(&self, center: Point, radius: f64) -> bool {
        self.ctx.begin_path();
        match self.ctx.arc(center.x, center.y, radius.max(0.0), 0.0, TAU) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("arc failed: {:?}", e);
                false
            }
        }
    }
}

fn css_color(color: Rgba) -> String {
    format!(
        "rgba({}, {}, {}, {})",
        (color[0] * 255.0).round(),
        (color[1] * 255.0).round(),
        (color[2] * 255.0).round(),
        color[3]
    )
}

impl Painter for Canvas2dPainter {
    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.ctx.set_fill_style_str(&css_color(color));
        self.ctx.fill_rect(rect.left, rect.top, rect.width, rect.height);
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke) {
        self.apply_stroke(stroke);
        self.ctx.stroke_rect(rect.left, rect.top, rect.width, rect.height);
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        if self.circle_path(center, radius) {
            self.ctx.set_fill_style_str(&css_color(color));
            self.ctx.fill();
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: &Stroke) {
        if self.circle_path(center, radius) {
            self.apply_stroke(stroke);
            self.ctx.stroke();
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], stroke: &Stroke) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.apply_stroke(stroke);
        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for p in rest {
            self.ctx.line_to(p.x, p.y);
        }
        self.ctx.stroke();
    }
}

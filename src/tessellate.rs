//! Turns [`Painter`] calls into triangles for the wgpu pipeline.

use crate::color::Rgba;
use crate::geometry::{Point, Rect};
use crate::render::{Painter, Stroke};
use crate::vertex::Vertex;

const CIRCLE_SEGMENTS: u32 = 48;

/// Collects geometry for one frame. Shapes arrive in sheet-local pixels and
/// are offset by `origin` into window pixels.
pub struct GpuPainter {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    origin: Point,
    sheet: Option<(Rect, Rgba)>,
}

impl GpuPainter {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            origin: Point::new(0.0, 0.0),
            sheet: None,
        }
    }

    /// Sets where the sheet sits in the window and the color `clear` paints.
    pub fn set_sheet(&mut self, rect: Rect, color: Rgba) {
        self.origin = Point::new(rect.left, rect.top);
        self.sheet = Some((Rect::new(0.0, 0.0, rect.width, rect.height), color));
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn vertex(&self, p: Point, color: Rgba) -> Vertex {
        Vertex {
            position: [(p.x + self.origin.x) as f32, (p.y + self.origin.y) as f32],
            color,
        }
    }

    fn push_quad(&mut self, corners: [Point; 4], color: Rgba) {
        let base = self.vertices.len() as u32;
        for corner in corners {
            let v = self.vertex(corner, color);
            self.vertices.push(v);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// A thick line from `a` to `b`, extruded along its normal.
    fn push_segment(&mut self, a: Point, b: Point, width: f64, color: Rgba) {
        let (dx, dy) = a.delta_to(b);
        let len = (dx * dx + dy * dy).sqrt();
        if len <= 0.0 {
            return;
        }
        let nx = -dy / len * width * 0.5;
        let ny = dx / len * width * 0.5;

        self.push_quad(
            [
                a.offset(-nx, -ny),
                a.offset(nx, ny),
                b.offset(nx, ny),
                b.offset(-nx, -ny),
            ],
            color,
        );
    }

    /// Splits `a..b` into dashes of `dash` length with equal gaps.
    fn push_dashed_segment(&mut self, a: Point, b: Point, stroke: &Stroke, dash: f64) {
        let len = a.distance(b);
        if len <= 0.0 || dash <= 0.0 {
            return;
        }
        let (dx, dy) = a.delta_to(b);
        let (ux, uy) = (dx / len, dy / len);

        let mut start = 0.0;
        while start < len {
            let end = (start + dash).min(len);
            self.push_segment(
                a.offset(ux * start, uy * start),
                a.offset(ux * end, uy * end),
                stroke.width,
                stroke.color,
            );
            start += dash * 2.0;
        }
    }

    fn push_stroke_segment(&mut self, a: Point, b: Point, stroke: &Stroke) {
        match stroke.dash {
            Some(dash) => self.push_dashed_segment(a, b, stroke, dash),
            None => self.push_segment(a, b, stroke.width, stroke.color),
        }
    }

    fn circle_point(center: Point, radius: f64, i: u32) -> Point {
        let angle = i as f64 * std::f64::consts::TAU / CIRCLE_SEGMENTS as f64;
        center.offset(angle.cos() * radius, angle.sin() * radius)
    }
}

impl Default for GpuPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter for GpuPainter {
    fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        if let Some((sheet, color)) = self.sheet {
            self.fill_rect(sheet, color);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.push_quad(rect.corners(), color);
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke) {
        let corners = rect.corners();
        for i in 0..4 {
            self.push_stroke_segment(corners[i], corners[(i + 1) % 4], stroke);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let base = self.vertices.len() as u32;
        let v = self.vertex(center, color);
        self.vertices.push(v);
        for i in 0..CIRCLE_SEGMENTS {
            let v = self.vertex(Self::circle_point(center, radius, i), color);
            self.vertices.push(v);
        }
        for i in 0..CIRCLE_SEGMENTS {
            let next = (i + 1) % CIRCLE_SEGMENTS;
            self.indices
                .extend_from_slice(&[base, base + 1 + i, base + 1 + next]);
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: &Stroke) {
        for i in 0..CIRCLE_SEGMENTS {
            let a = Self::circle_point(center, radius, i);
            let b = Self::circle_point(center, radius, i + 1);
            self.push_stroke_segment(a, b, stroke);
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], stroke: &Stroke) {
        for pair in points.windows(2) {
            self.push_stroke_segment(pair[0], pair[1], stroke);
        }
    }
}

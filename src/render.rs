//! Scene painting against an abstract [`Painter`].
//!
//! Back to front: clear, committed shapes in collection order, selection
//! handles, then the live preview in the current tool settings.

use crate::color::{Rgba, parse_color_or_black, with_alpha};
use crate::config::AnnotatorConfig;
use crate::drawing::{Shape, ShapeKind, ShapeStyle};
use crate::geometry::{Point, Rect};
use crate::shape_model::ShapeModel;
use crate::state::Repaint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
    /// Dash length; `None` draws a solid line.
    pub dash: Option<f64>,
}

impl Stroke {
    pub fn solid(color: Rgba, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }
}

/// Drawing primitives in overlay-local pixels.
pub trait Painter {
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba);
    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: &Stroke);
    /// Open path through `points` with round joins and caps.
    fn stroke_polyline(&mut self, points: &[Point], stroke: &Stroke);
}

/// Scene-wide decoration settings derived from the config.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStyle {
    pub selection_color: Rgba,
    pub handle_size: f64,
    pub fill_alpha: f32,
}

impl From<&AnnotatorConfig> for SceneStyle {
    fn from(config: &AnnotatorConfig) -> Self {
        Self {
            selection_color: parse_color_or_black(&config.selection_color),
            handle_size: config.handle_size,
            fill_alpha: config.fill_alpha,
        }
    }
}

pub fn render_scene<P: Painter + ?Sized>(
    painter: &mut P,
    model: &ShapeModel,
    preview: Option<(&ShapeKind, &ShapeStyle)>,
    scene: &SceneStyle,
) {
    painter.clear();

    for shape in model.shapes() {
        paint_shape(painter, shape.kind(), &shape.style, scene.fill_alpha);
    }

    if let Some(selected) = model.selected() {
        paint_selection(painter, selected, scene);
    }

    if let Some((kind, style)) = preview {
        paint_shape(painter, kind, style, scene.fill_alpha);
    }
}

pub fn paint_shape<P: Painter + ?Sized>(
    painter: &mut P,
    kind: &ShapeKind,
    style: &ShapeStyle,
    fill_alpha: f32,
) {
    let color = with_alpha(parse_color_or_black(&style.color), style.opacity);
    let stroke = Stroke::solid(color, style.stroke_width as f64);
    let fill = with_alpha(color, fill_alpha);

    match kind {
        ShapeKind::Rectangle {
            x,
            y,
            width,
            height,
        } => {
            let rect = Rect::new(*x, *y, *width, *height);
            painter.fill_rect(rect, fill);
            painter.stroke_rect(rect, &stroke);
        }
        ShapeKind::Circle { x, y, radius } => {
            let center = Point::new(*x, *y);
            painter.fill_circle(center, *radius, fill);
            painter.stroke_circle(center, *radius, &stroke);
        }
        ShapeKind::Freehand { points } => match points.as_slice() {
            [] => {}
            [single] => painter.fill_circle(*single, stroke.width / 2.0, color),
            _ => painter.stroke_polyline(points, &stroke),
        },
    }
}

fn paint_selection<P: Painter + ?Sized>(painter: &mut P, shape: &Shape, scene: &SceneStyle) {
    let size = scene.handle_size;
    let outline = Stroke::solid(scene.selection_color, 1.5);
    let white = [1.0, 1.0, 1.0, 1.0];

    match shape.kind() {
        ShapeKind::Rectangle { .. } => {
            for corner in shape.bounds().corners() {
                let handle = Rect::new(corner.x - size / 2.0, corner.y - size / 2.0, size, size);
                painter.fill_rect(handle, white);
                painter.stroke_rect(handle, &outline);
            }
        }
        ShapeKind::Circle { x, y, radius } => {
            let cardinals = [
                Point::new(*x, y - radius),
                Point::new(x + radius, *y),
                Point::new(*x, y + radius),
                Point::new(x - radius, *y),
            ];
            for point in cardinals {
                painter.fill_circle(point, size / 2.0, white);
                painter.stroke_circle(point, size / 2.0, &outline);
            }
        }
        ShapeKind::Freehand { .. } => {
            let pad = shape.style.stroke_width as f64;
            let dashed = Stroke {
                dash: Some(4.0),
                ..outline
            };
            painter.stroke_rect(shape.bounds().inflate(pad), &dashed);
        }
    }
}

/// Applies a freehand ink hint on top of the current canvas content.
/// `Full` and `None` are left to the caller.
pub fn paint_incremental<P: Painter + ?Sized>(painter: &mut P, repaint: Repaint, style: &ShapeStyle) {
    let color = with_alpha(parse_color_or_black(&style.color), style.opacity);
    let width = style.stroke_width as f64;

    match repaint {
        Repaint::Segment { from, to } => {
            painter.stroke_polyline(&[from, to], &Stroke::solid(color, width));
        }
        Repaint::Dot { at } => painter.fill_circle(at, width / 2.0, color),
        Repaint::Full | Repaint::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::ToolSettings;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Clear,
        FillRect(Rect),
        StrokeRect(Rect, Option<f64>),
        FillCircle(Point, f64),
        StrokeCircle(Point, f64),
        Polyline(usize),
    }

    #[derive(Default)]
    struct RecordingPainter {
        calls: Vec<Call>,
    }

    impl Painter for RecordingPainter {
        fn clear(&mut self) {
            self.calls.push(Call::Clear);
        }
        fn fill_rect(&mut self, rect: Rect, _color: Rgba) {
            self.calls.push(Call::FillRect(rect));
        }
        fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke) {
            self.calls.push(Call::StrokeRect(rect, stroke.dash));
        }
        fn fill_circle(&mut self, center: Point, radius: f64, _color: Rgba) {
            self.calls.push(Call::FillCircle(center, radius));
        }
        fn stroke_circle(&mut self, center: Point, radius: f64, _stroke: &Stroke) {
            self.calls.push(Call::StrokeCircle(center, radius));
        }
        fn stroke_polyline(&mut self, points: &[Point], _stroke: &Stroke) {
            self.calls.push(Call::Polyline(points.len()));
        }
    }

    fn scene() -> SceneStyle {
        SceneStyle::from(&AnnotatorConfig::default())
    }

    #[test]
    fn test_shapes_painted_in_collection_order_after_clear() {
        let mut model = ShapeModel::new();
        let style = ToolSettings::default().style();
        model.add(Shape::new(
            ShapeKind::Circle {
                x: 5.0,
                y: 5.0,
                radius: 9.0,
            },
            style.clone(),
        ));
        model.add(Shape::new(
            ShapeKind::Freehand {
                points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
            },
            style,
        ));

        let mut painter = RecordingPainter::default();
        render_scene(&mut painter, &model, None, &scene());

        assert_eq!(
            painter.calls,
            vec![
                Call::Clear,
                Call::FillCircle(Point::new(5.0, 5.0), 9.0),
                Call::StrokeCircle(Point::new(5.0, 5.0), 9.0),
                Call::Polyline(2),
            ]
        );
    }

    #[test]
    fn test_selection_handles_then_preview_on_top() {
        let mut model = ShapeModel::new();
        let shape = Shape::new(
            ShapeKind::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 20.0,
                height: 10.0,
            },
            ToolSettings::default().style(),
        );
        let id = shape.id().clone();
        model.add(shape);
        model.select(Some(id));

        let preview = ShapeKind::Freehand {
            points: vec![Point::new(3.0, 3.0)],
        };
        let preview_style = ToolSettings::new("red", 1.0, 6).style();

        let mut painter = RecordingPainter::default();
        render_scene(&mut painter, &model, Some((&preview, &preview_style)), &scene());

        // clear + rect fill/stroke + 4 handles * 2 + preview dot
        assert_eq!(painter.calls.len(), 1 + 2 + 8 + 1);
        assert_eq!(painter.calls[3], Call::FillRect(Rect::new(-4.0, -4.0, 8.0, 8.0)));
        assert_eq!(painter.calls.last(), Some(&Call::FillCircle(Point::new(3.0, 3.0), 3.0)));
    }

    #[test]
    fn test_freehand_selection_is_dashed_box() {
        let mut model = ShapeModel::new();
        let shape = Shape::new(
            ShapeKind::Freehand {
                points: vec![Point::new(10.0, 10.0), Point::new(30.0, 20.0)],
            },
            ToolSettings::new("red", 1.0, 2).style(),
        );
        let id = shape.id().clone();
        model.add(shape);
        model.select(Some(id));

        let mut painter = RecordingPainter::default();
        render_scene(&mut painter, &model, None, &scene());
        assert_eq!(
            painter.calls.last(),
            Some(&Call::StrokeRect(Rect::new(8.0, 8.0, 24.0, 14.0), Some(4.0)))
        );
    }

    #[test]
    fn test_incremental_hints() {
        let style = ToolSettings::new("red", 1.0, 4).style();
        let mut painter = RecordingPainter::default();
        paint_incremental(
            &mut painter,
            Repaint::Segment {
                from: Point::new(0.0, 0.0),
                to: Point::new(1.0, 0.0),
            },
            &style,
        );
        paint_incremental(&mut painter, Repaint::Dot { at: Point::new(2.0, 2.0) }, &style);
        paint_incremental(&mut painter, Repaint::Full, &style);

        assert_eq!(
            painter.calls,
            vec![Call::Polyline(2), Call::FillCircle(Point::new(2.0, 2.0), 2.0)]
        );
    }
}

//! Point-in-shape tests. Collections are searched topmost (last added) first.

use crate::drawing::{Shape, ShapeKind};
use crate::geometry::{Point, point_to_segment_distance};

/// Minimum grab distance for freehand strokes, so thin strokes stay easy to
/// pick up or erase.
pub const DEFAULT_TOLERANCE_FLOOR: f64 = 10.0;

pub fn is_shape_at(shape: &Shape, pos: Point, tolerance_floor: f64) -> bool {
    match shape.kind() {
        ShapeKind::Rectangle {
            x,
            y,
            width,
            height,
        } => pos.x >= *x && pos.x <= x + width && pos.y >= *y && pos.y <= y + height,
        ShapeKind::Circle { x, y, radius } => pos.distance(Point::new(*x, *y)) <= *radius,
        ShapeKind::Freehand { points } => {
            let threshold = (shape.style.stroke_width as f64).max(tolerance_floor);
            points
                .windows(2)
                .any(|pair| point_to_segment_distance(pos, pair[0], pair[1]) <= threshold)
        }
    }
}

/// Index of the topmost shape under `pos`.
pub fn find_topmost(shapes: &[Shape], pos: Point, tolerance_floor: f64) -> Option<usize> {
    shapes
        .iter()
        .rposition(|shape| is_shape_at(shape, pos, tolerance_floor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::ToolSettings;

    fn rect(x: f64, y: f64, width: f64, height: f64) -> Shape {
        Shape::new(
            ShapeKind::Rectangle {
                x,
                y,
                width,
                height,
            },
            ToolSettings::default().style(),
        )
    }

    fn stroke(width: u32) -> Shape {
        Shape::new(
            ShapeKind::Freehand {
                points: vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            },
            ToolSettings::new("red", 1.0, width).style(),
        )
    }

    #[test]
    fn test_topmost_wins() {
        let shapes = vec![rect(0.0, 0.0, 50.0, 50.0), rect(20.0, 20.0, 50.0, 50.0)];
        assert_eq!(find_topmost(&shapes, Point::new(30.0, 30.0), 10.0), Some(1));
        assert_eq!(find_topmost(&shapes, Point::new(5.0, 5.0), 10.0), Some(0));
        assert_eq!(find_topmost(&shapes, Point::new(200.0, 5.0), 10.0), None);
    }

    #[test]
    fn test_rectangle_edges_are_inclusive() {
        let shape = rect(10.0, 10.0, 20.0, 20.0);
        assert!(is_shape_at(&shape, Point::new(10.0, 30.0), 10.0));
        assert!(!is_shape_at(&shape, Point::new(9.9, 15.0), 10.0));
    }

    #[test]
    fn test_circle_uses_euclidean_distance() {
        let shape = Shape::new(
            ShapeKind::Circle {
                x: 0.0,
                y: 0.0,
                radius: 10.0,
            },
            ToolSettings::default().style(),
        );
        assert!(is_shape_at(&shape, Point::new(6.0, 8.0), 10.0));
        assert!(!is_shape_at(&shape, Point::new(8.0, 8.0), 10.0));
    }

    #[test]
    fn test_freehand_tolerance_floor() {
        let thin = stroke(2);
        assert!(is_shape_at(&thin, Point::new(50.0, 2.0), 10.0));
        assert!(is_shape_at(&thin, Point::new(50.0, 10.0), 10.0));
        assert!(!is_shape_at(&thin, Point::new(50.0, 11.0), 10.0));
    }

    #[test]
    fn test_freehand_wide_stroke_beats_floor() {
        let wide = stroke(10);
        assert!(is_shape_at(&wide, Point::new(50.0, 10.0), 4.0));
        assert!(!is_shape_at(&wide, Point::new(50.0, 10.5), 4.0));
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

pub const MIN_OPACITY: f32 = 0.1;
pub const MAX_OPACITY: f32 = 1.0;
pub const MIN_STROKE_WIDTH: u32 = 1;
pub const MAX_STROKE_WIDTH: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Freehand,
    Rectangle,
    Circle,
    Eraser,
}

impl Tool {
    pub fn from_name(name: &str) -> Option<Tool> {
        match name.to_ascii_lowercase().as_str() {
            "select" => Some(Tool::Select),
            "freehand" | "pen" | "highlighter" => Some(Tool::Freehand),
            "rectangle" | "rect" => Some(Tool::Rectangle),
            "circle" => Some(Tool::Circle),
            "eraser" => Some(Tool::Eraser),
            _ => None,
        }
    }

    pub fn draws(self) -> bool {
        matches!(self, Tool::Freehand | Tool::Rectangle | Tool::Circle)
    }
}

/// Settings applied to previews and to shapes committed with the active tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolSettings {
    pub color: String,
    pub opacity: f32,
    pub stroke_width: u32,
}

impl ToolSettings {
    pub fn new(color: impl Into<String>, opacity: f32, stroke_width: u32) -> Self {
        Self {
            color: color.into(),
            opacity: clamp_opacity(opacity),
            stroke_width: clamp_stroke_width(stroke_width),
        }
    }

    /// Re-applies the range limits, e.g. after deserializing.
    pub fn clamped(self) -> Self {
        Self::new(self.color, self.opacity, self.stroke_width)
    }

    pub fn style(&self) -> ShapeStyle {
        ShapeStyle {
            color: self.color.clone(),
            opacity: self.opacity,
            stroke_width: self.stroke_width,
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::new("#ffeb3b", 0.5, 3)
    }
}

pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        return MAX_OPACITY;
    }
    opacity.clamp(MIN_OPACITY, MAX_OPACITY)
}

pub fn clamp_stroke_width(width: u32) -> u32 {
    width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH)
}

/// Opaque shape identifier; never reused within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub color: String,
    pub opacity: f32,
    pub stroke_width: u32,
}

/// Geometry, keyed by shape type. Only the fields of the matching variant exist.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
    },
    Freehand {
        points: Vec<Point>,
    },
}

impl ShapeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle { .. } => "rectangle",
            ShapeKind::Circle { .. } => "circle",
            ShapeKind::Freehand { .. } => "freehand",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    pub style: ShapeStyle,
}

impl Shape {
    /// Builds a shape with a fresh id. Geometry validation happens at commit
    /// time, see [`crate::event_handler`].
    pub fn new(kind: ShapeKind, style: ShapeStyle) -> Self {
        Self::with_id(ShapeId::generate(), kind, style)
    }

    pub fn with_id(id: ShapeId, kind: ShapeKind, style: ShapeStyle) -> Self {
        Self { id, kind, style }
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Anchor used for grab offsets: top-left for rectangles, the center for
    /// circles, the first point for freehand strokes.
    pub fn origin(&self) -> Point {
        match &self.kind {
            ShapeKind::Rectangle { x, y, .. } | ShapeKind::Circle { x, y, .. } => Point::new(*x, *y),
            ShapeKind::Freehand { points } => points.first().copied().unwrap_or_default(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match &self.kind {
            ShapeKind::Rectangle {
                x,
                y,
                width,
                height,
            } => Rect::new(*x, *y, *width, *height),
            ShapeKind::Circle { x, y, radius } => {
                Rect::new(x - radius, y - radius, radius * 2.0, radius * 2.0)
            }
            ShapeKind::Freehand { points } => Rect::bounding(points).unwrap_or_default(),
        }
    }

    /// Translates the geometry. The type, id and style never change here.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match &mut self.kind {
            ShapeKind::Rectangle { x, y, .. } | ShapeKind::Circle { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            ShapeKind::Freehand { points } => {
                for point in points.iter_mut() {
                    point.x += dx;
                    point.y += dy;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_are_clamped() {
        let settings = ToolSettings::new("red", 0.0, 42);
        assert_eq!(settings.opacity, MIN_OPACITY);
        assert_eq!(settings.stroke_width, MAX_STROKE_WIDTH);

        let settings = ToolSettings::new("red", 3.0, 0);
        assert_eq!(settings.opacity, MAX_OPACITY);
        assert_eq!(settings.stroke_width, MIN_STROKE_WIDTH);
    }

    #[test]
    fn test_translate_freehand_moves_every_point() {
        let mut shape = Shape::new(
            ShapeKind::Freehand {
                points: vec![Point::new(0.0, 0.0), Point::new(4.0, 2.0)],
            },
            ToolSettings::default().style(),
        );
        shape.translate(1.0, -1.0);
        assert_eq!(
            shape.kind(),
            &ShapeKind::Freehand {
                points: vec![Point::new(1.0, -1.0), Point::new(5.0, 1.0)],
            }
        );
        assert_eq!(shape.origin(), Point::new(1.0, -1.0));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ShapeId::generate(), ShapeId::generate());
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(Tool::from_name("Rectangle"), Some(Tool::Rectangle));
        assert_eq!(Tool::from_name("pen"), Some(Tool::Freehand));
        assert_eq!(Tool::from_name("arrow"), None);
        assert!(!Tool::Eraser.draws());
    }
}

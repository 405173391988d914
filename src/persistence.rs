//! JSON export/import of the shape collection.
//!
//! The file is a bare array of shape records:
//! `{"id","type","color","opacity","strokeWidth", ...geometry}` where geometry
//! is `x,y,width,height` (rectangle), `x,y,radius` (circle) or
//! `points:[{x,y}]` (freehand).

use std::collections::HashSet;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::drawing::{
    Shape, ShapeId, ShapeKind, ShapeStyle, ToolSettings, clamp_opacity, clamp_stroke_width,
};
use crate::geometry::Point;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShapeRecordOut<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    color: &'a str,
    opacity: f32,
    stroke_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    points: Option<&'a [Point]>,
}

impl<'a> From<&'a Shape> for ShapeRecordOut<'a> {
    fn from(shape: &'a Shape) -> Self {
        let mut record = ShapeRecordOut {
            id: shape.id().as_str(),
            kind: shape.type_name(),
            color: &shape.style.color,
            opacity: shape.style.opacity,
            stroke_width: shape.style.stroke_width,
            x: None,
            y: None,
            width: None,
            height: None,
            radius: None,
            points: None,
        };
        match shape.kind() {
            ShapeKind::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                record.x = Some(*x);
                record.y = Some(*y);
                record.width = Some(*width);
                record.height = Some(*height);
            }
            ShapeKind::Circle { x, y, radius } => {
                record.x = Some(*x);
                record.y = Some(*y);
                record.radius = Some(*radius);
            }
            ShapeKind::Freehand { points } => record.points = Some(points),
        }
        record
    }
}

/// Lenient input record: every field is optional and fields that do not
/// belong to the record's type are ignored.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ShapeRecordIn {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    color: Option<String>,
    opacity: Option<f32>,
    stroke_width: Option<f64>,
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    radius: Option<f64>,
    points: Option<Vec<Point>>,
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl ShapeRecordIn {
    fn into_kind(self) -> Result<ShapeKind, String> {
        let kind = self.kind.ok_or("missing type")?;
        match kind.as_str() {
            "rectangle" => match (self.x, self.y, self.width, self.height) {
                (Some(_), Some(_), Some(width), Some(height))
                    if !is_positive(width) || !is_positive(height) =>
                {
                    Err(format!("rectangle with non-positive size {width}x{height}"))
                }
                (Some(x), Some(y), Some(width), Some(height)) => Ok(ShapeKind::Rectangle {
                    x,
                    y,
                    width,
                    height,
                }),
                _ => Err("rectangle without x/y/width/height".into()),
            },
            "circle" => match (self.x, self.y, self.radius) {
                (Some(_), Some(_), Some(radius)) if !is_positive(radius) => {
                    Err(format!("circle with non-positive radius {radius}"))
                }
                (Some(x), Some(y), Some(radius)) => Ok(ShapeKind::Circle { x, y, radius }),
                _ => Err("circle without x/y/radius".into()),
            },
            "freehand" => match self.points {
                Some(points) if points.len() >= 2 => Ok(ShapeKind::Freehand { points }),
                _ => Err("freehand with fewer than two points".into()),
            },
            other => Err(format!("unknown type {other:?}")),
        }
    }
}

pub fn serialize(shapes: &[Shape]) -> anyhow::Result<String> {
    let records: Vec<ShapeRecordOut<'_>> = shapes.iter().map(ShapeRecordOut::from).collect();
    serde_json::to_string_pretty(&records).context("Failed to serialize shapes")
}

/// Parses an exported collection. A document that is not a JSON array is an
/// error; individual malformed entries are skipped with a warning.
pub fn deserialize(json: &str) -> anyhow::Result<Vec<Shape>> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(json).context("Import is not a JSON array of shapes")?;

    let defaults = ToolSettings::default();
    let mut seen = HashSet::new();
    let mut shapes = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let record = match ShapeRecordIn::deserialize(entry) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping shape #{}: {}", index, e);
                continue;
            }
        };

        let style = ShapeStyle {
            color: record.color.clone().unwrap_or_else(|| defaults.color.clone()),
            opacity: clamp_opacity(record.opacity.unwrap_or(defaults.opacity)),
            stroke_width: record
                .stroke_width
                .map(|w| clamp_stroke_width(w.round().max(0.0) as u32))
                .unwrap_or(defaults.stroke_width),
        };

        let id = match record.id.clone() {
            Some(id) if !seen.contains(&id) => ShapeId::from(id),
            Some(id) => {
                log::warn!("Duplicate shape id {} at #{}, assigning a new one", id, index);
                ShapeId::generate()
            }
            None => ShapeId::generate(),
        };

        match record.into_kind() {
            Ok(kind) => {
                seen.insert(id.as_str().to_string());
                shapes.push(Shape::with_id(id, kind, style));
            }
            Err(reason) => log::warn!("Skipping shape #{}: {}", index, reason),
        }
    }

    Ok(shapes)
}

pub fn export_file_name(timestamp_ms: u64) -> String {
    format!("annotations-{timestamp_ms}.json")
}

pub fn now_millis() -> u64 {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            js_sys::Date::now() as u64
        } else {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default()
        }
    }
}

//! Annotation primitives drawn on survey photos
//!
//! Coordinates are in source-image pixels. Primitives are stored in the order
//! they were drawn; that order is also their stacking order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Point in image pixel coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Shape of a primitive, with its kind-specific payload
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Arrow,
    Line,
    Rectangle,
    Circle,
    Text { label: String },
    Measure { distance: String },
    /// A kind this renderer does not know; kept so the list order survives
    Unsupported(String),
}

impl Shape {
    /// Number of points the shape needs before it can be drawn
    pub fn required_points(&self) -> usize {
        match self {
            Shape::Text { .. } => 1,
            Shape::Unsupported(_) => 0,
            _ => 2,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Shape::Arrow => "arrow",
            Shape::Line => "line",
            Shape::Rectangle => "rectangle",
            Shape::Circle => "circle",
            Shape::Text { .. } => "text",
            Shape::Measure { .. } => "measure",
            Shape::Unsupported(kind) => kind,
        }
    }
}

/// A single drawing instruction
///
/// Parsing never fails: an entry the editor wrote badly becomes
/// [`Shape::Unsupported`] so the rest of the list still renders.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct AnnotationPrimitive {
    pub shape: Shape,
    pub points: Vec<Point>,
    /// Palette color name, resolved at render time
    pub color: String,
}

impl AnnotationPrimitive {
    pub fn new(shape: Shape, points: &[(f32, f32)], color: &str) -> Self {
        Self {
            shape,
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            color: color.to_string(),
        }
    }
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_points(value: Option<&Value>) -> Option<Vec<Point>> {
    match value {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(points) => Vec::<Point>::deserialize(points).ok(),
    }
}

impl From<Value> for AnnotationPrimitive {
    fn from(raw: Value) -> Self {
        let kind = raw.get("type").and_then(Value::as_str).unwrap_or_default();
        let color = raw
            .get("color")
            .and_then(Value::as_str)
            .unwrap_or("red")
            .to_string();
        let Some(points) = parse_points(raw.get("points")) else {
            return Self {
                shape: Shape::Unsupported(format!("malformed {kind}")),
                points: Vec::new(),
                color,
            };
        };

        let shape = match kind {
            "arrow" => Shape::Arrow,
            "line" => Shape::Line,
            "rectangle" => Shape::Rectangle,
            "circle" => Shape::Circle,
            "text" => Shape::Text {
                label: scalar_text(raw.get("label")).unwrap_or_default(),
            },
            "measure" => Shape::Measure {
                distance: scalar_text(raw.get("measureDistance")).unwrap_or_default(),
            },
            other => Shape::Unsupported(other.to_string()),
        };
        Self { shape, points, color }
    }
}

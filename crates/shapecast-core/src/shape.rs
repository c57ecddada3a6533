//! Shape descriptors and their validation.
//!
//! A [`ShapeDescriptor`] is what the language model is asked to produce:
//!
//! ```json
//! { "kind": "Box", "parameters": [1, 1, 1], "color": "#ff0000" }
//! ```
//!
//! Validation is split in two stages. [`validate_shape`] checks the JSON
//! contract only (field presence and types, known kind). Parameter arity and
//! colour parsing are renderer concerns and live in [`ShapeDescriptor::geometry`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::{Result, ShapecastError};

/// The three primitives the renderer knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Box,
    Sphere,
    Cylinder,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Box, ShapeKind::Sphere, ShapeKind::Cylinder];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Box => "Box",
            Self::Sphere => "Sphere",
            Self::Cylinder => "Cylinder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Accepted parameter count, following the renderer's constructor signature.
    ///
    /// - Box: width, height, depth, then optional width/height/depth segments
    /// - Sphere: radius, then optional width/height segments and phi/theta ranges
    /// - Cylinder: radiusTop, radiusBottom, height, then optional radial/height
    ///   segments, openEnded and theta range
    pub fn arity(&self) -> std::ops::RangeInclusive<usize> {
        match self {
            Self::Box => 3..=6,
            Self::Sphere => 1..=7,
            Self::Cylinder => 3..=8,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated description of one 3D primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    pub parameters: Vec<f64>,
    pub color: String,
}

/// Parse raw model output and validate it as a shape descriptor.
///
/// Text that is not JSON fails with a format error carrying the raw text.
pub fn parse_shape_document(raw: &str) -> Result<ShapeDescriptor> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        ShapecastError::format(format!("Malformed JSON received from the model: {e}"), raw)
    })?;
    validate_shape(&value)
}

/// Check a parsed JSON value against the descriptor contract.
///
/// Checks run in order: kind, parameters, colour. No range checks are made
/// on the numbers.
pub fn validate_shape(value: &Value) -> Result<ShapeDescriptor> {
    let obj = value.as_object().ok_or_else(|| {
        ShapecastError::format("Shape document must be a JSON object", value.to_string())
    })?;

    let kind = match obj.get("kind") {
        Some(Value::String(s)) => {
            ShapeKind::parse(s).ok_or_else(|| ShapecastError::UnsupportedShape(s.clone()))?
        }
        Some(other) => return Err(ShapecastError::UnsupportedShape(other.to_string())),
        None => return Err(ShapecastError::UnsupportedShape("<missing>".into())),
    };

    let parameters = obj
        .get("parameters")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ShapecastError::format("'parameters' must be an array of numbers", value.to_string())
        })?
        .iter()
        .map(|p| {
            p.as_f64().ok_or_else(|| {
                ShapecastError::format(
                    format!("'parameters' contains a non-numeric value: {p}"),
                    value.to_string(),
                )
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    let color = obj
        .get("color")
        .and_then(Value::as_str)
        .ok_or_else(|| ShapecastError::format("'color' must be a string", value.to_string()))?
        .to_string();

    Ok(ShapeDescriptor {
        kind,
        parameters,
        color,
    })
}

/// Failure to turn a valid descriptor into something the renderer can build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("{kind} takes {min} to {max} parameters, got {got}")]
    Arity {
        kind: ShapeKind,
        min: usize,
        max: usize,
        got: usize,
    },

    #[error("{kind} parameter #{index} must be {expected}, got {value}")]
    Parameter {
        kind: ShapeKind,
        index: usize,
        expected: &'static str,
        value: f64,
    },

    #[error("invalid color: {0}")]
    Color(String),
}

/// Renderer-ready view of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub kind: ShapeKind,
    pub parameters: Vec<f64>,
    pub rgb: u32,
}

impl ShapeDescriptor {
    /// Apply the renderer's constructor rules to this descriptor.
    ///
    /// The generator is not trusted with arity, so a descriptor can pass
    /// [`validate_shape`] and still fail here. Failures are reported, never
    /// corrected.
    pub fn geometry(&self) -> std::result::Result<Geometry, RenderError> {
        let arity = self.kind.arity();
        let got = self.parameters.len();
        if !arity.contains(&got) {
            return Err(RenderError::Arity {
                kind: self.kind,
                min: *arity.start(),
                max: *arity.end(),
                got,
            });
        }

        for (index, &value) in self.parameters.iter().enumerate() {
            if let Some(expected) = self.check_parameter(index, value) {
                return Err(RenderError::Parameter {
                    kind: self.kind,
                    index,
                    expected,
                    value,
                });
            }
        }

        let rgb =
            parse_hex_color(&self.color).ok_or_else(|| RenderError::Color(self.color.clone()))?;

        Ok(Geometry {
            kind: self.kind,
            parameters: self.parameters.clone(),
            rgb,
        })
    }

    /// Returns the violated expectation for parameter `index`, if any.
    fn check_parameter(&self, index: usize, value: f64) -> Option<&'static str> {
        if !value.is_finite() {
            return Some("finite");
        }
        let rule = match (self.kind, index) {
            // Dimensions
            (ShapeKind::Box, 0..=2) | (ShapeKind::Sphere, 0) | (ShapeKind::Cylinder, 2) => {
                (value > 0.0).then_some(()).ok_or("positive")
            }
            // Cylinder radii; a zero top or bottom radius makes a cone
            (ShapeKind::Cylinder, 0..=1) => (value >= 0.0).then_some(()).ok_or("non-negative"),
            // Segment counts
            (ShapeKind::Box, 3..=5) | (ShapeKind::Sphere, 1..=2) | (ShapeKind::Cylinder, 3..=4) => {
                (value >= 1.0).then_some(()).ok_or("at least 1")
            }
            _ => Ok(()),
        };
        rule.err()
    }
}

/// Parse `#rgb` or `#rrggbb` into a packed 0xRRGGBB value.
pub fn parse_hex_color(s: &str) -> Option<u32> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => u32::from_str_radix(hex, 16).ok(),
        3 => {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            u32::from_str_radix(&expanded, 16).ok()
        }
        _ => None,
    }
}

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::animation::ParseError;

/// Transform component group a tween can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformProperty {
    Position,
    Rotation,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// A single animatable scalar, e.g. `position.x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyPath {
    pub property: TransformProperty,
    pub axis: Axis,
}

impl PropertyPath {
    pub const fn new(property: TransformProperty, axis: Axis) -> Self {
        Self { property, axis }
    }
}

impl fmt::Display for TransformProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformProperty::Position => "position",
            TransformProperty::Rotation => "rotation",
            TransformProperty::Scale => "scale",
        })
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.property, self.axis)
    }
}

impl FromStr for TransformProperty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "position" => Ok(TransformProperty::Position),
            "rotation" => Ok(TransformProperty::Rotation),
            "scale" => Ok(TransformProperty::Scale),
            other => Err(ParseError::UnknownProperty(other.to_string())),
        }
    }
}

impl FromStr for PropertyPath {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (property, axis) = s
            .split_once('.')
            .ok_or_else(|| ParseError::UnknownProperty(s.to_string()))?;

        let axis = match axis {
            "x" => Axis::X,
            "y" => Axis::Y,
            "z" => Axis::Z,
            _ => return Err(ParseError::UnknownProperty(s.to_string())),
        };

        Ok(PropertyPath::new(property.parse()?, axis))
    }
}

/// Per-axis end values of a tween. Only the axes that are present get animated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisValues {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl AxisValues {
    pub fn get(&self, axis: Axis) -> Option<f32> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, f32)> + '_ {
        Axis::ALL
            .into_iter()
            .filter_map(|axis| self.get(axis).map(|value| (axis, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_paths() {
        let path: PropertyPath = "rotation.y".parse().unwrap();
        assert_eq!(path, PropertyPath::new(TransformProperty::Rotation, Axis::Y));
        assert_eq!(path.to_string(), "rotation.y");
    }

    #[test]
    fn rejects_unknown_paths() {
        assert!("position".parse::<PropertyPath>().is_err());
        assert!("position.w".parse::<PropertyPath>().is_err());
        assert!("color.x".parse::<PropertyPath>().is_err());
    }

    #[test]
    fn axis_values_only_yield_named_axes() {
        let values: AxisValues = serde_json::from_str(r#"{ "x": 0.0, "z": 1.5 }"#).unwrap();
        let axes: Vec<_> = values.iter().collect();

        assert_eq!(axes, vec![(Axis::X, 0.0), (Axis::Z, 1.5)]);
        assert!(AxisValues::default().is_empty());
    }
}

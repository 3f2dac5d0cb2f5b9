//! Layer creation command
//!
//! Builds a configured [`SculptLayerNode`] from command flags. Flags accept
//! a long or a short name:
//!
//! | Long              | Short  | Value  | Default            |
//! |-------------------|--------|--------|--------------------|
//! | `-name`           | `-n`   | string | `SculptLayerNode`  |
//! | `-sculptStrength` | `-ss`  | float  | 1.0                |
//! | `-curveOffset`    | `-co`  | float  | 1.1                |
//! | `-maxProjection`  | `-mpd` | float  | 1000               |
//! | `-rebuildCurve`   | `-rb`  | bool   | false              |
//!
//! With `-rebuildCurve` the curve mask is resampled into a uniform polyline
//! before the layer reads it.

use tracing::info;

use crate::config::SculptLayerConfig;
use crate::error::{LayerError, Result};
use crate::geometry::curve::PolylineCurve;
use crate::geometry::query::CurveQuery;
use crate::layer::node::SculptLayerNode;
use crate::layer::sampler;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSculptLayer {
    pub name: String,
    pub sculpt_strength: f32,
    pub curve_offset: f32,
    pub max_projection: f32,
    pub rebuild_curve: bool,
}

impl Default for CreateSculptLayer {
    fn default() -> Self {
        let config = SculptLayerConfig::default();
        Self {
            name: "SculptLayerNode".to_string(),
            sculpt_strength: config.sculpt_strength,
            curve_offset: config.curve_offset,
            max_projection: config.max_projection_distance,
            rebuild_curve: false,
        }
    }
}

impl CreateSculptLayer {
    /// Parses `-flag value` pairs on top of the defaults.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut command = Self::default();
        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let flag = flag.as_ref();
            let value = args
                .next()
                .ok_or_else(|| LayerError::invalid_config("flags", format!("{flag} needs a value")))?;
            let value = value.as_ref();
            match flag {
                "-n" | "-name" => command.name = value.to_string(),
                "-ss" | "-sculptStrength" => command.sculpt_strength = parse_float("sculpt_strength", value)?,
                "-co" | "-curveOffset" => command.curve_offset = parse_float("curve_offset", value)?,
                "-mpd" | "-maxProjection" | "-maxProjectionDistance" => {
                    command.max_projection = parse_float("max_projection_distance", value)?
                }
                "-rb" | "-rebuildCurve" => command.rebuild_curve = parse_bool(value)?,
                other => {
                    return Err(LayerError::invalid_config("flags", format!("unknown flag {other}")));
                }
            }
        }
        Ok(command)
    }

    /// Node configuration these flags describe, on top of `base`.
    pub fn config(&self, base: &SculptLayerConfig) -> SculptLayerConfig {
        SculptLayerConfig {
            sculpt_strength: self.sculpt_strength,
            curve_offset: self.curve_offset,
            max_projection_distance: self.max_projection,
            ..base.clone()
        }
    }

    /// Creates the node, and the rebuilt curve when `rebuild_curve` is set.
    pub fn execute<C: CurveQuery + ?Sized>(
        &self,
        curve: &C,
    ) -> Result<(SculptLayerNode, Option<PolylineCurve>)> {
        let config = self.config(&SculptLayerConfig::default());
        config.validate()?;

        let rebuilt = if self.rebuild_curve {
            Some(PolylineCurve::rebuild(curve, sampler::default_sample_count(curve))?)
        } else {
            None
        };

        info!(
            name = %self.name,
            strength = self.sculpt_strength,
            offset = self.curve_offset,
            rebuilt = rebuilt.is_some(),
            "created sculpt layer"
        );
        Ok((SculptLayerNode::with_config(self.name.clone(), config), rebuilt))
    }
}

fn parse_float(field: &'static str, value: &str) -> Result<f32> {
    value
        .parse()
        .map_err(|_| LayerError::invalid_config(field, format!("`{value}` is not a number")))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => Err(LayerError::invalid_config("rebuild_curve", format!("`{value}` is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::curve::CircleCurve;
    use glam::Vec3;

    #[test]
    fn test_defaults_match_layer_defaults() {
        let command = CreateSculptLayer::default();
        assert_eq!(command.name, "SculptLayerNode");
        assert_eq!(command.curve_offset, 1.1);
        assert_eq!(command.max_projection, 1000.0);
        assert!(!command.rebuild_curve);
    }

    #[test]
    fn test_short_and_long_flags() {
        let command =
            CreateSculptLayer::from_args(["-n", "hills", "-ss", "0.5", "-curveOffset", "1.0", "-rb", "true"])
                .unwrap();
        assert_eq!(command.name, "hills");
        assert_eq!(command.sculpt_strength, 0.5);
        assert_eq!(command.curve_offset, 1.0);
        assert!(command.rebuild_curve);
    }

    #[test]
    fn test_bad_flags_are_rejected() {
        assert!(CreateSculptLayer::from_args(["-ss"]).is_err());
        assert!(CreateSculptLayer::from_args(["-ss", "lots"]).is_err());
        assert!(CreateSculptLayer::from_args(["-colour", "red"]).is_err());
    }

    #[test]
    fn test_execute_rebuilds_curve() {
        let circle = CircleCurve::horizontal(Vec3::ZERO, 2.0);
        let command = CreateSculptLayer {
            rebuild_curve: true,
            ..Default::default()
        };
        let (node, rebuilt) = command.execute(&circle).unwrap();
        assert_eq!(node.name(), "SculptLayerNode");
        let rebuilt = rebuilt.unwrap();
        assert!(rebuilt.is_closed());
        assert_eq!(rebuilt.control_point_count(), 16);
        for point in rebuilt.points() {
            assert!((point.length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_execute_validates_settings() {
        let circle = CircleCurve::horizontal(Vec3::ZERO, 2.0);
        let command = CreateSculptLayer {
            curve_offset: -1.0,
            ..Default::default()
        };
        assert!(command.execute(&circle).is_err());
    }
}

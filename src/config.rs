//! Presentation settings. Everything has a default, so a config file only needs the parts
//! it changes.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context};
use glam::Vec3;
use serde::Deserialize;

use crate::{
    animation::TimelineSpec,
    assets::{LoadFailurePolicy, LoadRequest},
};

pub const CONFIG_ENV_VAR: &str = "SCROLLSTAGE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "presentation.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresentationConfig {
    pub models: Vec<LoadRequest>,
    pub placements: Vec<Placement>,
    pub timeline: TimelineSpec,
    pub load_failure_policy: LoadFailurePolicy,
    pub page: PageConfig,
    pub stage: StageConfig,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            models: vec![
                LoadRequest::new("box", "assets/box.gltf"),
                LoadRequest::new("shoes", "assets/air.gltf"),
            ],
            placements: vec![
                Placement::at("box", [-6.0, 0.1, 0.0]),
                Placement::at("shoes", [-5.0, 0.2, 0.0]),
            ],
            timeline: TimelineSpec::default(),
            load_failure_policy: LoadFailurePolicy::default(),
            page: PageConfig::default(),
            stage: StageConfig::default(),
        }
    }
}

/// Transform a model gets right after loading, before the timeline reads its start values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Placement {
    pub name: String,
    #[serde(default)]
    pub position: Option<[f32; 3]>,
    #[serde(default)]
    pub rotation: Option<[f32; 3]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
}

impl Placement {
    pub fn at(name: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            position: Some(position),
            rotation: None,
            scale: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Height of the scrolled page as a multiple of the window height.
    pub height_in_viewports: f32,
    /// Logical pixels scrolled per mouse wheel line.
    pub wheel_line_pixels: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            height_in_viewports: 4.0,
            wheel_line_pixels: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    pub background: Color,
    pub fog: FogConfig,
    pub camera: CameraConfig,
    pub directional_light: DirectionalLightConfig,
    pub hemisphere_light: HemisphereLightConfig,
    pub floor: FloorConfig,
    /// Reinhard tone mapping exposure.
    pub exposure: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            fog: FogConfig::default(),
            camera: CameraConfig::default(),
            directional_light: DirectionalLightConfig::default(),
            hemisphere_light: HemisphereLightConfig::default(),
            floor: FloorConfig::default(),
            exposure: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FogConfig {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            near: 15.0,
            far: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 40.0,
            near: 0.1,
            far: 100.0,
            position: [0.0, 1.0, 3.0],
            target: [0.0, 0.5, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectionalLightConfig {
    pub color: Color,
    pub intensity: f32,
    pub position: [f32; 3],
    pub shadow: ShadowConfig,
}

impl Default for DirectionalLightConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 2.0,
            position: [2.0, 5.0, 3.0],
            shadow: ShadowConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadowConfig {
    pub map_size: u32,
    /// Far plane of the light's orthographic shadow camera.
    pub far: f32,
    pub normal_bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: 1024,
            far: 10.0,
            normal_bias: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HemisphereLightConfig {
    pub sky: Color,
    pub ground: Color,
    pub intensity: f32,
}

impl Default for HemisphereLightConfig {
    fn default() -> Self {
        Self {
            sky: Color::from_rgb8(0xaa, 0xaa, 0xff),
            ground: Color::from_rgb8(0x11, 0x11, 0x11),
            intensity: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FloorConfig {
    pub size: f32,
    pub color: Color,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            size: 100.0,
            color: Color::from_rgb8(0x11, 0x11, 0x11),
        }
    }
}

/// An sRGB color written as `#rrggbb`, `#rgb`, `white` or `black`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid color `{0}`")]
pub struct ColorParseError(String);

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
        }
    }

    /// Linear-light components for lighting math.
    pub fn to_linear(&self) -> Vec3 {
        fn decode(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        Vec3::new(decode(self.r), decode(self.g), decode(self.b))
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ColorParseError(s.to_string());

        match s {
            "white" => return Ok(Color::WHITE),
            "black" => return Ok(Color::BLACK),
            _ => {}
        }

        let hex = s.strip_prefix('#').ok_or_else(error)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(error());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| error());

        match hex.len() {
            6 => Ok(Color::from_rgb8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Color::from_rgb8(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(error()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl PresentationConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read presentation config {:?}", path))?;

        Self::from_json(&source).with_context(|| format!("Invalid presentation config {:?}", path))
    }

    pub fn from_json(source: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `SCROLLSTAGE_CONFIG`, else `presentation.json` if present,
    /// else the built-in presentation.
    pub fn from_environment() -> anyhow::Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.is_file()),
        };

        match path {
            Some(path) => {
                log::info!("Loading presentation config from {:?}", path);
                Self::load(&path)
            }
            None => {
                log::info!("No presentation config found, using the built-in presentation");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut names = HashSet::new();
        for request in &self.models {
            if request.name.is_empty() {
                bail!("Model {:?} has an empty name", request.path);
            }
            if !names.insert(request.name.as_str()) {
                bail!("Model name `{}` is requested more than once", request.name);
            }
        }

        for placement in &self.placements {
            if !names.contains(placement.name.as_str()) {
                bail!("Placement for unknown model `{}`", placement.name);
            }

            let values = [placement.position, placement.rotation, placement.scale];
            if values.iter().flatten().flatten().any(|v| !v.is_finite()) {
                bail!("Placement for `{}` has a non-finite value", placement.name);
            }
        }

        for (index, section) in self.timeline.sections.iter().enumerate() {
            for tween in &section.tweens {
                if !names.contains(tween.target.as_str()) {
                    bail!(
                        "Section {} animates `{}`, which is not in the model list",
                        index,
                        tween.target
                    );
                }
                if tween.to.iter().any(|(_, value)| !value.is_finite()) {
                    bail!("Section {} has a non-finite target for `{}`", index, tween.target);
                }
            }
        }

        if !self.timeline.scrub.is_finite() || self.timeline.scrub < 0.0 {
            bail!("Scrub lag must be a non-negative number of seconds");
        }
        if !(self.timeline.default_duration.is_finite() && self.timeline.default_duration >= 0.0) {
            bail!("Default section duration must be non-negative");
        }
        let fog = &self.stage.fog;
        if !(fog.near >= 0.0 && fog.far > fog.near) {
            bail!("Fog must end beyond where it starts");
        }
        if !(self.page.height_in_viewports > 1.0) {
            bail!("The page must be taller than one viewport");
        }

        Ok(())
    }
}

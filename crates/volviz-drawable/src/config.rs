//! Drawable configuration.
//!
//! Every field has a default, so a YAML file only lists what it changes:
//!
//! ```yaml
//! backend: cpu
//! combine_mode: max
//! extraction: surface_nets
//! max_steps: 256
//! render:
//!   density: 0.05
//!   brightness: 1.0
//!   max_projection: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use volviz_atlas::CombineMode;
use volviz_iso::ExtractionMethod;
use volviz_march::{Backend, MAX_STEPS, RenderSettings};

use crate::DrawableResult;

/// Default sample-rate ceiling.
pub const DEFAULT_MAX_STEPS: u32 = 256;

/// Construction-time settings of a [`VolumeDrawable`](crate::VolumeDrawable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawableConfig {
    /// Integrator backend.
    pub backend: Backend,
    /// Channel combine rule.
    pub combine_mode: CombineMode,
    /// Isosurface algorithm.
    pub extraction: ExtractionMethod,
    /// Sample-rate ceiling; `reset_sample_rate` uses half of it.
    pub max_steps: u32,
    /// Initial integrator settings.
    pub render: RenderSettings,
}

impl Default for DrawableConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            combine_mode: CombineMode::Max,
            extraction: ExtractionMethod::MarchingCubes,
            max_steps: DEFAULT_MAX_STEPS,
            render: RenderSettings::default(),
        }
    }
}

impl DrawableConfig {
    /// Defaults on the CPU backend.
    pub fn cpu() -> Self {
        Self { backend: Backend::Cpu, ..Self::default() }
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(yaml: &str) -> DrawableResult<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.max_steps = config.max_steps.clamp(1, MAX_STEPS);
        Ok(config)
    }

    /// Loads a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> DrawableResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> DrawableResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = DrawableConfig::from_yaml_str(
            "backend: cpu\nextraction: surface_nets\nrender:\n  density: 0.25\n",
        )
        .unwrap();
        assert_eq!(config.backend, Backend::Cpu);
        assert_eq!(config.extraction, ExtractionMethod::SurfaceNets);
        assert_eq!(config.combine_mode, CombineMode::Max);
        assert_eq!(config.render.density, 0.25);
        assert_eq!(config.render.steps, 128);
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
    }

    #[test]
    fn test_max_steps_clamped() {
        let config = DrawableConfig::from_yaml_str("max_steps: 100000").unwrap();
        assert_eq!(config.max_steps, MAX_STEPS);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = DrawableConfig { combine_mode: CombineMode::Average, ..DrawableConfig::cpu() };
        let back = DrawableConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_bad_yaml() {
        assert!(DrawableConfig::from_yaml_str("backend: [").is_err());
        assert!(DrawableConfig::from_yaml_str("combine_mode: median").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volviz.yaml");
        std::fs::write(&path, "combine_mode: average\n").unwrap();
        let config = DrawableConfig::from_file(&path).unwrap();
        assert_eq!(config.combine_mode, CombineMode::Average);
        assert!(DrawableConfig::from_file(dir.path().join("missing.yaml")).is_err());
    }
}

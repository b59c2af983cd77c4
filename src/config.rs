//! Viewer configuration
//!
//! Read from a RON file; every field has a default so a config file only
//! needs to name what it changes:
//!
//! ```ron
//! (
//!     camera: (fov: 45.0),
//!     debug: (enabled: true),
//!     params: [
//!         (name: "uIntensity", default: 1.0, options: (min: Some(0.0), max: Some(2.0))),
//!     ],
//! )
//! ```

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{gfx::color::Color, params::ParamDef};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerPreference {
    LowPower,
    HighPerformance,
}

impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(value: PowerPreference) -> Self {
        match value {
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub antialias: bool,
    pub power_preference: PowerPreference,
    /// Clear color as hex, e.g. `"#ffffff"`
    pub background: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            power_preference: PowerPreference::HighPerformance,
            background: "#ffffff".to_string(),
        }
    }
}

impl RendererConfig {
    /// Background color, white when the configured value does not parse
    pub fn background_color(&self) -> Color {
        self.background.parse().unwrap_or(Color::WHITE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub default_position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 30.0,
            near: 0.1,
            far: 1000.0,
            default_position: [0.0, 0.0, 6.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per frame while damping
    pub damping_factor: f32,
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: None,
            max_distance: None,
            rotate_speed: 0.005,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    /// Seconds between camera position log lines
    pub camera_log_interval: f32,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            camera_log_interval: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub root: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfiguratorConfig {
    pub renderer: RendererConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub debug: DebugConfig,
    pub assets: AssetsConfig,
    /// Extra parameters defined next to the built-in ones
    pub params: Vec<ParamDef>,
}

impl ConfiguratorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&contents)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }
}

/// Command line switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeFlags {
    /// Show the parameter debug panel regardless of the config file
    pub debug: bool,
    pub config_path: Option<PathBuf>,
    /// Arguments that were not recognised, kept in order
    pub ignored: Vec<String>,
}

impl RuntimeFlags {
    /// Parses `--debug` and `--config <path>`; anything else is logged and skipped
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--debug" => flags.debug = true,
                "--config" => match args.next() {
                    Some(path) => flags.config_path = Some(PathBuf::from(path)),
                    None => warn!("--config needs a path, ignoring it"),
                },
                other => match other.strip_prefix("--config=") {
                    Some(path) => flags.config_path = Some(PathBuf::from(path)),
                    None => {
                        warn!("Ignoring unknown argument '{}'", other);
                        flags.ignored.push(other.to_string());
                    }
                },
            }
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn defaults_round_trip_through_ron() {
        let config = ConfiguratorConfig::default();
        let text = config.to_ron_string().unwrap();
        let parsed = ConfiguratorConfig::from_ron_str(&text).unwrap();

        assert_eq!(parsed, config);
        assert_eq!(parsed.camera.fov, 30.0);
        assert_eq!(parsed.camera.default_position, [0.0, 0.0, 6.0]);
        assert_eq!(parsed.controls.damping_factor, 0.05);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ConfiguratorConfig::from_ron_str(
            r##"(
                camera: (fov: 45.0),
                debug: (enabled: true),
                params: [
                    (name: "uIntensity", default: 1.5, options: (min: Some(0.0), max: Some(2.0))),
                    (name: "uTint", default: "#ff0000"),
                ],
            )"##,
        )
        .unwrap();

        assert_eq!(config.camera.fov, 45.0);
        assert_eq!(config.camera.far, 1000.0);
        assert!(config.debug.enabled);
        assert_eq!(config.debug.camera_log_interval, 1.0);
        assert_eq!(config.params.len(), 2);
        assert_eq!(config.params[0].default, ParamValue::Number(1.5));
        assert_eq!(config.params[0].options.max, Some(2.0));
        assert_eq!(config.params[1].default, ParamValue::from("#ff0000"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = ConfiguratorConfig::from_ron_str("(camera: (fov: \"wide\"))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfiguratorConfig::load(dir.path().join("missing.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let path = dir.path().join("atelier.ron");
        std::fs::write(&path, "(assets: (root: \"public\"))").unwrap();
        let config = ConfiguratorConfig::load(&path).unwrap();
        assert_eq!(config.assets.root, PathBuf::from("public"));
    }

    #[test]
    fn parses_flags() {
        let args = ["--debug", "--config", "showroom.ron", "--verbose"].map(String::from);
        let flags = RuntimeFlags::from_args(args);
        assert!(flags.debug);
        assert_eq!(flags.config_path, Some(PathBuf::from("showroom.ron")));
        assert_eq!(flags.ignored, vec!["--verbose".to_string()]);

        let flags = RuntimeFlags::from_args(["--config=other.ron".to_string()]);
        assert!(!flags.debug);
        assert_eq!(flags.config_path, Some(PathBuf::from("other.ron")));
        assert!(flags.ignored.is_empty());
    }

    #[test]
    fn config_switch_takes_the_next_argument() {
        let args = ["--config", "--debug", "extra"].map(String::from);
        let flags = RuntimeFlags::from_args(args);

        assert_eq!(flags.config_path, Some(PathBuf::from("--debug")));
        assert!(!flags.debug);
        assert_eq!(flags.ignored, vec!["extra".to_string()]);

        let flags = RuntimeFlags::from_args(["--config".to_string()]);
        assert_eq!(flags.config_path, None);
        assert!(flags.ignored.is_empty());
    }

    #[test]
    fn unparsable_background_falls_back_to_white() {
        let renderer = RendererConfig {
            background: "teal".into(),
            ..Default::default()
        };
        assert_eq!(renderer.background_color(), Color::WHITE);
    }
}

//! Marker configuration loaded from `layerchop.toml`.
//!
//! [`Markers`] holds the comment prefixes that delimit the sections of a slicer
//! file and the commands injected into each sub-job. Every key defaults to what
//! Cura emits, so running without a file behaves exactly like the built-in setup.
//! The `LAYERCHOP_CONFIG` environment variable, and then `-config`, take
//! precedence over the file in the working directory.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level contents of `layerchop.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerchopConfig {
    #[serde(default)]
    pub markers: Markers,
}

/// Recognized comment prefixes and injected commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Body line starting a new layer, followed by the layer number.
    pub layer: String,
    /// Header line naming the slicer.
    pub generator: String,
    /// Last header line, followed by the total layer count.
    pub layer_count: String,
    /// First footer line.
    pub end_of_gcode: String,
    /// Display command used for `-msg`.
    pub status_command: String,
    /// Emitted before the footer so every sub-job leaves the printer idle.
    pub shutdown: Vec<String>,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            layer: ";LAYER:".to_string(),
            generator: ";Generated with".to_string(),
            layer_count: ";LAYER_COUNT:".to_string(),
            end_of_gcode: ";End of Gcode".to_string(),
            status_command: "M117".to_string(),
            shutdown: vec!["M107".to_string(), "M82".to_string(), "M104 S0".to_string()],
        }
    }
}

impl Markers {
    /// Empty prefixes would match every line.
    pub fn validate(&self) -> Result<()> {
        let prefixes = [
            ("layer", &self.layer),
            ("generator", &self.generator),
            ("layer_count", &self.layer_count),
            ("end_of_gcode", &self.end_of_gcode),
        ];
        for (key, value) in prefixes {
            if value.is_empty() {
                bail!("marker `{key}` must not be empty");
            }
        }
        Ok(())
    }

    /// The `M117 <message>` line for the printer display.
    pub fn status_line(&self, message: &str) -> String {
        format!("{} {message}", self.status_command)
    }
}

// Default location, relative to the working directory.
const DEFAULT_CONFIG_FILE: &str = "layerchop.toml";

impl LayerchopConfig {
    /// Load configuration, in order of precedence: `explicit`, `LAYERCHOP_CONFIG`,
    /// then `./layerchop.toml`. A missing default file yields defaults; a missing
    /// explicitly named file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os("LAYERCHOP_CONFIG")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str::<LayerchopConfig>(&contents)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.markers.validate()?;
        log::debug!("loaded markers from {}", path.display());
        Ok(config)
    }
}

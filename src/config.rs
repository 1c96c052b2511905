//! `config.json` loading.
//!
//! Every key has a default, so a partial (or missing) file is valid. Canvas
//! size and export directory can be overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::EngineSettings;
use crate::io::SaveFormat;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const ENV_WIDTH: &str = "AGENTCANVAS_WIDTH";
pub const ENV_HEIGHT: &str = "AGENTCANVAS_HEIGHT";
pub const ENV_EXPORT_DIR: &str = "AGENTCANVAS_EXPORT_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Root of `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "configVersion")]
    pub config_version: u32,
    pub settings: Settings,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub canvas_size: CanvasSize,
    /// Formats `export` may write.
    pub allowed_save_file_formats: Vec<SaveFormat>,
    /// Directory exports are written to. Current directory when unset.
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Per-action switches. Everything is allowed unless turned off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub draw: DrawPermissions,
    pub colour: bool,
    pub layers: bool,
    pub misc: MiscPermissions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawPermissions {
    pub line: bool,
    pub line_sequence: bool,
    pub curve: bool,
    pub circle: bool,
    pub triangle: bool,
    pub rectangle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscPermissions {
    pub bucket: bool,
    pub undo: bool,
    pub export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: 1,
            settings: Settings::default(),
            permissions: Permissions::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canvas_size: CanvasSize::default(),
            allowed_save_file_formats: SaveFormat::ALL.to_vec(),
            export_dir: None,
        }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self { width: 500, height: 500 }
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            draw: DrawPermissions::default(),
            colour: true,
            layers: true,
            misc: MiscPermissions::default(),
        }
    }
}

impl Default for DrawPermissions {
    fn default() -> Self {
        Self {
            line: true,
            line_sequence: true,
            curve: true,
            circle: true,
            triangle: true,
            rectangle: true,
        }
    }
}

impl Default for MiscPermissions {
    fn default() -> Self {
        Self { bucket: true, undo: true, export: true }
    }
}

impl Permissions {
    /// Look up a dotted permission key such as `draw.circle` or `misc.undo`.
    /// Unknown keys are denied.
    pub fn allows(&self, key: &str) -> bool {
        match key {
            "draw.line" => self.draw.line,
            "draw.line_sequence" => self.draw.line_sequence,
            "draw.curve" => self.draw.curve,
            "draw.circle" => self.draw.circle,
            "draw.triangle" => self.draw.triangle,
            "draw.rectangle" => self.draw.rectangle,
            "colour" => self.colour,
            "layers" => self.layers,
            "misc.bucket" => self.misc.bucket,
            "misc.undo" => self.misc.undo,
            "misc.export" => self.misc.export,
            _ => false,
        }
    }
}

impl Config {
    /// Parse a JSON config file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`load_from_file`](Self::load_from_file), but a missing file
    /// yields the defaults. A file that exists and fails to parse is still an
    /// error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load_from_file(path.as_ref()) {
            Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.as_ref().display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Apply `AGENTCANVAS_*` environment overrides.
    pub fn merge_with_env(&mut self) {
        self.merge_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Unparsable values are
    /// ignored with a warning.
    pub fn merge_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_WIDTH) {
            match val.trim().parse::<u32>() {
                Ok(width) => self.settings.canvas_size.width = width,
                Err(_) => warn!(var = ENV_WIDTH, value = %val, "ignoring non-numeric override"),
            }
        }
        if let Some(val) = lookup(ENV_HEIGHT) {
            match val.trim().parse::<u32>() {
                Ok(height) => self.settings.canvas_size.height = height,
                Err(_) => warn!(var = ENV_HEIGHT, value = %val, "ignoring non-numeric override"),
            }
        }
        if let Some(dir) = lookup(ENV_EXPORT_DIR) {
            if !dir.trim().is_empty() {
                self.settings.export_dir = Some(PathBuf::from(dir));
            }
        }
    }

    pub fn allows_format(&self, format: SaveFormat) -> bool {
        self.settings.allowed_save_file_formats.contains(&format)
    }

    /// Construction parameters for the engine: configured size, white
    /// background, thin black brush.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            width: self.settings.canvas_size.width,
            height: self.settings.canvas_size.height,
            ..EngineSettings::default()
        }
    }
}

//! World tuning files
//!
//! Settings that shape an area, such as the chunk tree limits, can be kept
//! next to the map in a small TOML or RON file. The file extension picks the
//! format; fields left out of the file take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

mod world_config;

pub use world_config::WorldConfig;

/// Text formats a settings file can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Ron,
}

impl FileFormat {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Settings that can be read from and written to a file
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read settings from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = FileFormat::of(path)?;
        let text = std::fs::read_to_string(path)?;

        match format {
            FileFormat::Toml => toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string())),
            FileFormat::Ron => ron::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Write settings to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = match FileFormat::of(path)? {
            FileFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            FileFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, text)?;
        log::debug!("Wrote settings to {}", path.display());
        Ok(())
    }
}

/// Errors reading, writing or checking settings
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or RON for these settings
    #[error("Parse error: {0}")]
    Parse(String),

    /// The settings could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// The file extension is neither `.toml` nor `.ron`
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A setting is outside its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

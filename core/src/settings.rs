//! Loader settings, read from `vitrine.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::material::color::DEFAULT_GAMMA;

/// Errors reading a settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Tunables for the translation pipeline.
///
/// ```toml
/// gamma = 2.2
/// generate_missing_normals = true
/// decode_textures = true
/// default_alpha_cutoff = 0.5
/// disabled_extensions = ["EPIC_hdri_backdrop"]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Display gamma used for color factors.
    pub gamma: f32,
    /// Synthesize normals for triangle primitives that have none.
    pub generate_missing_normals: bool,
    /// Decode embedded images. When off, texture slots stay empty.
    pub decode_textures: bool,
    /// Cutoff for `MASK` materials that do not declare one.
    pub default_alpha_cutoff: f32,
    /// Registered extensions to skip for this load.
    pub disabled_extensions: Vec<String>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            generate_missing_normals: true,
            decode_textures: true,
            default_alpha_cutoff: 0.5,
            disabled_extensions: Vec::new(),
        }
    }
}

impl LoaderSettings {
    /// Parse settings from TOML text. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Whether an extension is switched off.
    pub fn is_disabled(&self, extension: &str) -> bool {
        self.disabled_extensions.iter().any(|e| e == extension)
    }
}

/// Load settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<LoaderSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_owned(),
        source,
    })?;
    LoaderSettings::from_toml(&content).map_err(|source| SettingsError::Parse {
        path: path.to_owned(),
        source,
    })
}

/// Load settings, falling back to defaults if the file is missing or invalid.
pub fn load_or_default(path: &Path) -> LoaderSettings {
    match load_settings(path) {
        Ok(settings) => {
            log::info!("Loaded loader settings from {}", path.display());
            settings
        }
        Err(e) => {
            log::warn!("{e}, using default loader settings");
            LoaderSettings::default()
        }
    }
}

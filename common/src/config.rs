use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Settings for generating the support solid under a mesh.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SupportConfig {
    /// Faces tilted more than this many degrees past vertical (on the
    /// downward side) need support.
    pub overhang_angle: f32,
    /// Tolerance used for all "approximately zero" comparisons. When unset
    /// the precision of the mesh being supported is used.
    pub precision: Option<f32>,
}

impl SupportConfig {
    /// Normal z component at or below which a face needs support.
    pub fn support_threshold(&self) -> f32 {
        -self.overhang_angle.to_radians().sin()
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(if path.exists() {
            let file = fs::read(path)
                .with_context(|| format!("Failed to read config `{}`", path.display()))?;
            let string = String::from_utf8_lossy(&file);
            let config = toml::from_str(&string)
                .with_context(|| format!("Invalid config `{}`", path.display()))?;
            info!("Successfully loaded config file");
            config
        } else {
            info!("No config file found, using defaults");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let string = toml::to_string(self)?;
        fs::write(path, string)?;
        Ok(())
    }
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            overhang_angle: 30.0,
            precision: None,
        }
    }
}

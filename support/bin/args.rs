use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use common::config::SupportConfig;
use nalgebra::Vector3;

#[derive(Debug, Parser)]
/// Generates the support solid needed to print a model.
pub struct Args {
    /// Path to a .stl or .obj file. The build plate is at z = 0.
    pub mesh: PathBuf,

    #[arg(short, long)]
    /// File to save the support solid to, as a binary .stl.
    pub output: Option<PathBuf>,

    #[arg(short, long)]
    /// TOML file to load the support config from. Missing files fall back to
    /// the defaults.
    pub config: Option<PathBuf>,

    #[arg(long)]
    /// Save the effective config (after applying flags) to this file.
    pub save_config: Option<PathBuf>,

    #[arg(long)]
    /// Faces tilted more than this many degrees past vertical need support.
    pub overhang_angle: Option<f32>,

    #[arg(long)]
    /// Tolerance for treating values as zero, in model units. Derived from
    /// the size of the model by default.
    pub precision: Option<f32>,

    #[arg(long, value_parser = offset_parser)]
    /// Move the model by this offset (x, y, z) before generating supports.
    pub offset: Option<Vector3<f32>>,

    #[arg(long)]
    /// Warn if the model is not a closed, consistently wound mesh.
    pub check_manifold: bool,

    #[arg(short, long)]
    /// Print debug logs.
    pub verbose: bool,
}

impl Args {
    pub fn support_config(&self) -> Result<SupportConfig> {
        let mut config = match &self.config {
            Some(path) => SupportConfig::load(path)?,
            None => SupportConfig::default(),
        };

        if let Some(angle) = self.overhang_angle {
            config.overhang_angle = angle;
        }

        if let Some(precision) = self.precision {
            config.precision = Some(precision);
        }

        Ok(config)
    }
}

/// Parses `x,y,z` into an offset, whitespace around each part is ignored.
fn offset_parser(raw: &str) -> Result<Vector3<f32>> {
    let parts = (raw.split(','))
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid offset `{raw}`"))?;
    ensure!(
        parts.len() == 3,
        "Offset needs x, y and z, got {} values",
        parts.len()
    );
    Ok(Vector3::from_column_slice(&parts))
}

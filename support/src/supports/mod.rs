use std::time::Instant;

use anyhow::{ensure, Result};
use common::{config::SupportConfig, progress::Progress};
use tracing::{debug, info};

use crate::mesh::Mesh;

pub mod boundary;
pub mod overhangs;
pub mod solid;
pub mod volume;

use boundary::BoundaryEdges;
use overhangs::{detect_face_overhangs, OverhangClassifier};
pub use solid::SupportMesh;
use volume::support_volume;

/// Classify, find the boundary, measure and build.
const STAGES: u64 = 4;

/// Generates the solid support material between the overhanging faces of a
/// mesh and the build plate.
pub struct SupportGenerator {
    config: SupportConfig,
}

impl SupportGenerator {
    pub fn new(config: &SupportConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn generate(&self, mesh: &Mesh) -> Result<SupportMesh> {
        self.generate_with_progress(mesh, &Progress::new())
    }

    /// Like [`SupportGenerator::generate`], but reports each finished stage
    /// to `progress` and stops early if it gets cancelled.
    pub fn generate_with_progress(&self, mesh: &Mesh, progress: &Progress) -> Result<SupportMesh> {
        let start = Instant::now();
        mesh.validate()?;

        let precision = self.config.precision.unwrap_or_else(|| mesh.precision());
        ensure!(
            precision.is_finite() && precision >= 0.0,
            "Precision must be a non-negative number, got {precision}"
        );

        progress.set_total(STAGES);
        let checkpoint = || -> Result<()> {
            ensure!(!progress.is_cancelled(), "Support generation cancelled");
            progress.add_complete(1);
            debug!("Support generation {:.0}% done", progress.progress() * 100.0);
            Ok(())
        };

        let classifier = OverhangClassifier::from_config(&self.config, precision);
        let faces = detect_face_overhangs(mesh, &classifier);
        debug!("Found {} of {} faces needing support", faces.len(), mesh.face_count());
        checkpoint()?;

        let boundary = BoundaryEdges::from_faces(&faces).to_vec();
        debug!("Support boundary has {} edges", boundary.len());
        checkpoint()?;

        let vertices = mesh.vertices();
        let volume = support_volume(vertices, &faces);
        checkpoint()?;

        let solid = SupportMesh::build(vertices, &faces, &boundary, volume);
        checkpoint()?;

        info!(
            "Generated {} support triangles ({volume:.3} volume) in {:.1}ms",
            solid.triangle_count(),
            start.elapsed().as_secs_f32() * 1000.0
        );
        Ok(solid)
    }
}

/// Generates supports for a mesh with the given config.
pub fn generate_supports(mesh: &Mesh, config: &SupportConfig) -> Result<SupportMesh> {
    SupportGenerator::new(config).generate(mesh)
}

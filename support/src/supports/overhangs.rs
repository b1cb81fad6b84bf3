use common::config::SupportConfig;
use rayon::prelude::*;

use crate::{geometry::face_normal, mesh::Mesh, Pos};

/// A mesh face that needs support material under it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedFace {
    pub face: [u32; 3],
    /// The inverted face normal, used to shade the ceiling of the support.
    pub normal: Pos,
}

/// Decides which faces of a mesh hang over empty space.
#[derive(Debug, Clone, Copy)]
pub struct OverhangClassifier {
    /// Faces with a normal z component above this do not need support.
    threshold: f32,
    precision: f32,
}

impl OverhangClassifier {
    pub fn new(threshold: f32, precision: f32) -> Self {
        Self {
            threshold,
            precision,
        }
    }

    pub fn from_config(config: &SupportConfig, precision: f32) -> Self {
        Self::new(config.support_threshold(), precision)
    }

    /// Classifies a single face. All of the face's indices must be valid
    /// for `vertices`.
    pub fn classify(&self, vertices: &[Pos], face: [u32; 3]) -> Option<AcceptedFace> {
        let [a, b, c] = face.map(|idx| vertices[idx as usize]);

        // Zero area faces don't face anywhere, so they never need support
        let normal = face_normal(a, b, c)?;
        if normal.z > self.threshold {
            return None;
        }

        // Faces lying flat on the build plate are already supported
        if normal.z < -(1.0 - self.precision) && a.z < self.precision {
            return None;
        }

        Some(AcceptedFace {
            face,
            normal: -normal,
        })
    }
}

/// Finds every face of the mesh that needs support, in mesh order.
pub fn detect_face_overhangs(mesh: &Mesh, classifier: &OverhangClassifier) -> Vec<AcceptedFace> {
    let vertices = mesh.vertices();
    (mesh.faces().par_iter())
        .filter_map(|&face| classifier.classify(vertices, face))
        .collect()
}

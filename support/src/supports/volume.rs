use rayon::prelude::*;

use super::overhangs::AcceptedFace;
use crate::{
    geometry::{ground, polyhedron_volume},
    Pos,
};

/// The closed column of material between a face and its shadow on the build
/// plate. The caps face away from each other and each side is split into two
/// triangles, so neighboring columns have coincident sides with opposite
/// winding.
pub fn column_faces([a, b, c]: [Pos; 3]) -> [[Pos; 3]; 8] {
    let (ag, bg, cg) = (ground(a), ground(b), ground(c));
    [
        [c, b, a],
        [ag, bg, cg],
        [a, b, ag],
        [bg, ag, b],
        [b, c, bg],
        [cg, bg, c],
        [c, a, cg],
        [ag, cg, a],
    ]
}

/// Volume of the support column under a single accepted face.
pub fn column_volume(vertices: &[Pos], face: &AcceptedFace) -> f64 {
    let [a, b, c] = face.face.map(|idx| vertices[idx as usize]);
    polyhedron_volume(&column_faces([a, b, c]))
}

/// Total volume of support material under all the accepted faces. The sides
/// shared between columns cancel out, leaving the volume of the whole
/// support solid.
pub fn support_volume(vertices: &[Pos], faces: &[AcceptedFace]) -> f64 {
    // Columns are computed in parallel but summed in order so the result
    // does not depend on how the work was split.
    let columns = (faces.par_iter())
        .map(|face| column_volume(vertices, face))
        .collect::<Vec<_>>();
    // Float `Sum` starts from -0.0, no support should still report +0.0
    columns.iter().fold(0.0, |total, volume| total + volume)
}

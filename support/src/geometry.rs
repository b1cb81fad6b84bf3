use nalgebra::Vector3;

use crate::Pos;

/// Outward unit normal of the triangle `(a, b, c)`, following the winding
/// used by every mesh in this crate. Returns `None` for zero area (or non
/// finite) triangles, which have no meaningful facing.
pub fn face_normal(a: Pos, b: Pos, c: Pos) -> Option<Pos> {
    let edge1 = c - b;
    let edge2 = a - b;
    edge1
        .cross(&edge2)
        .try_normalize(0.0)
        .filter(|normal| normal.iter().all(|x| x.is_finite()))
}

/// Projects a point straight down onto the build plate.
#[inline]
pub fn ground(point: Pos) -> Pos {
    Pos::new(point.x, point.y, 0.0)
}

/// Six times the signed volume of the tetrahedron spanned by the triangle
/// and the origin. Summing this over every face of a closed, consistently
/// wound mesh (then dividing by six) gives the enclosed volume.
pub fn volume_term([f0, f1, f2]: [Pos; 3]) -> f64 {
    let (f0, f1, f2) = (
        f0.cast::<f64>(),
        f1.cast::<f64>(),
        f2.cast::<f64>(),
    );
    (f2 - f1).cross(&(f0 - f1)).dot(&f0)
}

/// Signed volume of a closed polyhedron made up of triangle faces.
pub fn polyhedron_volume(faces: &[[Pos; 3]]) -> f64 {
    faces.iter().map(|face| volume_term(*face)).sum::<f64>() / 6.0
}

/// Area of the triangle once projected onto the xy plane.
pub fn footprint_area(a: Pos, b: Pos, c: Pos) -> f32 {
    let (ab, ac) = ((b - a).xy(), (c - a).xy());
    (ab.x * ac.y - ab.y * ac.x).abs() / 2.0
}

pub fn down() -> Pos {
    -Vector3::z()
}

use std::{collections::HashMap, io::Write};

use anyhow::Result;
use nalgebra::Vector3;
use rayon::prelude::*;
use stl_io::{Normal, Triangle, Vertex};

use super::overhangs::AcceptedFace;
use crate::{
    geometry::{down, face_normal, footprint_area, ground},
    mesh::Mesh,
    Pos,
};

/// Floats used by one triangle in the output buffers (3 vertices x 3 components).
pub const FLOATS_PER_TRIANGLE: usize = 9;
/// Each accepted face and each boundary edge produces two triangles.
const FLOATS_PER_PAIR: usize = 2 * FLOATS_PER_TRIANGLE;

/// Flat shaded triangle soup of the support solid along with the volume of
/// material it encloses.
///
/// Triangles are laid out as the ceiling and floor of every accepted face
/// (in that order, face by face) followed by the two wall triangles of every
/// boundary edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportMesh {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub volume: f64,

    face_count: usize,
    boundary_count: usize,
}

impl SupportMesh {
    /// Builds the surface of the support solid. Both buffers are allocated
    /// once at their final size and every triangle is written to its own
    /// slot.
    pub fn build(
        vertices: &[Pos],
        faces: &[AcceptedFace],
        boundary: &[[u32; 2]],
        volume: f64,
    ) -> Self {
        let len = (faces.len() + boundary.len()) * FLOATS_PER_PAIR;
        let mut positions = vec![0.0; len];
        let mut normals = vec![0.0; len];

        let split = faces.len() * FLOATS_PER_PAIR;
        let (cap_positions, wall_positions) = positions.split_at_mut(split);
        let (cap_normals, wall_normals) = normals.split_at_mut(split);

        (cap_positions.par_chunks_mut(FLOATS_PER_PAIR))
            .zip(cap_normals.par_chunks_mut(FLOATS_PER_PAIR))
            .zip(faces.par_iter())
            .for_each(|((positions, normals), face)| {
                let [a, b, c] = face.face.map(|idx| vertices[idx as usize]);

                // The ceiling is seen from below, so its winding is flipped
                let ceiling = [c, b, a];
                let floor = [ground(a), ground(b), ground(c)];
                write_pair(positions, normals, [(ceiling, face.normal), (floor, down())]);
            });

        (wall_positions.par_chunks_mut(FLOATS_PER_PAIR))
            .zip(wall_normals.par_chunks_mut(FLOATS_PER_PAIR))
            .zip(boundary.par_iter())
            .for_each(|((positions, normals), &[from, to])| {
                let (p0, p1) = (vertices[from as usize], vertices[to as usize]);
                let upper = [p0, p1, ground(p0)];
                let lower = [ground(p1), ground(p0), p1];
                write_pair(
                    positions,
                    normals,
                    [(upper, wall_normal(upper)), (lower, wall_normal(lower))],
                );
            });

        Self {
            vertices: positions,
            normals,
            volume,
            face_count: faces.len(),
            boundary_count: boundary.len(),
        }
    }

    /// Number of faces of the input mesh that needed support.
    pub fn face_count(&self) -> usize {
        self.face_count
    }

    /// Number of edges on the silhouette of the supported faces.
    pub fn boundary_count(&self) -> usize {
        self.boundary_count
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_TRIANGLE
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Area of the build plate covered by the support, summed over the floor
    /// triangles.
    pub fn footprint(&self) -> f64 {
        (self.triangles().take(2 * self.face_count))
            .skip(1)
            .step_by(2)
            .map(|([a, b, c], _normal)| footprint_area(a, b, c) as f64)
            .fold(0.0, |total, area| total + area)
    }

    /// Iterates every triangle of the solid along with its normal.
    pub fn triangles(&self) -> impl ExactSizeIterator<Item = ([Pos; 3], Pos)> + '_ {
        (self.vertices.chunks_exact(FLOATS_PER_TRIANGLE))
            .zip(self.normals.chunks_exact(FLOATS_PER_TRIANGLE))
            .map(|(vertices, normals)| {
                let vertex = |i: usize| Pos::from_column_slice(&vertices[i * 3..i * 3 + 3]);
                (
                    [vertex(0), vertex(1), vertex(2)],
                    Pos::from_column_slice(&normals[..3]),
                )
            })
    }

    /// Welds the triangle soup back into an indexed mesh, merging vertices
    /// with bit-identical positions.
    pub fn to_mesh(&self) -> Mesh {
        let mut index = HashMap::<Vector3<u32>, u32>::new();
        let mut vertices = Vec::new();

        let faces = self
            .triangles()
            .map(|(triangle, _normal)| {
                triangle.map(|vertex| {
                    *index.entry(vertex.map(f32::to_bits)).or_insert_with(|| {
                        vertices.push(vertex);
                        (vertices.len() - 1) as u32
                    })
                })
            })
            .collect();

        Mesh::new(vertices, faces)
    }

    /// Writes the solid as a binary STL file.
    pub fn write_stl<W: Write>(&self, writer: &mut W) -> Result<()> {
        let triangles = self.triangles().map(|(vertices, normal)| Triangle {
            normal: Normal::new(normal.into()),
            vertices: vertices.map(|v| Vertex::new(v.into())),
        });
        stl_io::write_stl(writer, triangles)?;
        Ok(())
    }
}

fn wall_normal([a, b, c]: [Pos; 3]) -> Pos {
    // Zero length edges give zero area walls, shade those with a zero normal
    // rather than NaN.
    face_normal(a, b, c).unwrap_or_else(Vector3::zeros)
}

/// Writes two triangles to an 18 float slot.
fn write_pair(positions: &mut [f32], normals: &mut [f32], triangles: [([Pos; 3], Pos); 2]) {
    let slots = (positions.chunks_exact_mut(FLOATS_PER_TRIANGLE))
        .zip(normals.chunks_exact_mut(FLOATS_PER_TRIANGLE));
    for ((positions, normals), (triangle, normal)) in slots.zip(triangles) {
        for (i, vertex) in triangle.iter().enumerate() {
            positions[i * 3..i * 3 + 3].copy_from_slice(vertex.as_slice());
            normals[i * 3..i * 3 + 3].copy_from_slice(normal.as_slice());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use common::progress::Progress;

    use super::*;
    use crate::{geometry::polyhedron_volume, supports::boundary::BoundaryEdges};

    fn downward_triangle() -> (Vec<Pos>, Vec<AcceptedFace>) {
        let vertices = vec![
            Pos::new(0.0, 0.0, 1.0),
            Pos::new(0.0, 1.0, 1.0),
            Pos::new(1.0, 0.0, 1.0),
        ];
        let faces = vec![AcceptedFace {
            face: [0, 1, 2],
            normal: Pos::z(),
        }];
        (vertices, faces)
    }

    fn build(vertices: &[Pos], faces: &[AcceptedFace]) -> SupportMesh {
        let boundary = BoundaryEdges::from_faces(faces).to_vec();
        SupportMesh::build(vertices, faces, &boundary, 0.0)
    }

    #[test]
    fn buffers_are_exactly_sized() {
        let (vertices, faces) = downward_triangle();
        let solid = build(&vertices, &faces);

        assert_eq!(solid.triangle_count(), 8);
        assert_eq!(solid.vertices.len(), 8 * FLOATS_PER_TRIANGLE);
        assert_eq!(solid.normals.len(), solid.vertices.len());
        assert_eq!((solid.face_count(), solid.boundary_count()), (1, 3));
        assert_eq!(solid.footprint(), 0.5);
    }

    #[test]
    fn caps_are_flipped_and_projected() {
        let (vertices, faces) = downward_triangle();
        let triangles = build(&vertices, &faces).triangles().collect::<Vec<_>>();

        let (ceiling, ceiling_normal) = triangles[0];
        assert_eq!(ceiling, [vertices[2], vertices[1], vertices[0]]);
        assert_eq!(ceiling_normal, Pos::z());

        let (floor, floor_normal) = triangles[1];
        assert_eq!(floor, [ground(vertices[0]), ground(vertices[1]), ground(vertices[2])]);
        assert_eq!(floor_normal, -Pos::z());
    }

    #[test]
    fn walls_face_outward() {
        let (vertices, faces) = downward_triangle();
        let solid = build(&vertices, &faces);
        let center = Pos::new(1.0 / 3.0, 1.0 / 3.0, 0.5);

        for (triangle, normal) in solid.triangles().skip(2) {
            assert_eq!(normal.z, 0.0);
            assert!((normal.norm() - 1.0).abs() < 1e-6);
            let mid = (triangle[0] + triangle[1] + triangle[2]) / 3.0;
            assert!((mid - center).dot(&normal) > 0.0);
        }
    }

    #[test]
    fn surface_encloses_column_volume() {
        let (vertices, faces) = downward_triangle();
        let solid = build(&vertices, &faces);
        let surface = solid.triangles().map(|(t, _)| t).collect::<Vec<_>>();
        assert!((polyhedron_volume(&surface) - 0.5).abs() < 1e-6);
        assert!(solid.to_mesh().is_manifold(Progress::new()));
    }

    #[test]
    fn zero_length_edge_gets_zero_normal() {
        let vertices = vec![Pos::new(1.0, 1.0, 1.0)];
        let solid = SupportMesh::build(&vertices, &[], &[[0, 0]], 0.0);
        assert_eq!(solid.triangle_count(), 2);
        assert!(solid.normals.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn empty_input_builds_empty_solid() {
        let solid = SupportMesh::build(&[], &[], &[], 0.0);
        assert!(solid.is_empty());
        assert_eq!(solid.triangles().count(), 0);
        assert_eq!(solid.footprint(), 0.0);
    }

    #[test]
    fn writes_binary_stl() {
        let (vertices, faces) = downward_triangle();
        let solid = build(&vertices, &faces);

        let mut out = Cursor::new(Vec::new());
        solid.write_stl(&mut out).unwrap();
        assert_eq!(out.get_ref().len(), 84 + 50 * 8);

        out.set_position(0);
        let read = stl_io::read_stl(&mut out).unwrap();
        assert_eq!(read.faces.len(), 8);
    }
}

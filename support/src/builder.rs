use std::f32::consts::TAU;

use nalgebra::Vector2;

use crate::{mesh::Mesh, Pos};

/// Incrementally assembles an outward wound triangle mesh.
pub struct MeshBuilder {
    vertices: Vec<Pos>,
    faces: Vec<[u32; 3]>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    pub fn add_vertex(&mut self, vertex: Pos) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    pub fn add_face(&mut self, face: [u32; 3]) {
        self.faces.push(face);
    }

    /// Adds the parallelogram `q0, q1, q3, q2`, facing along
    /// `(q1 - q0) x (q2 - q0)`.
    pub fn add_quad(&mut self, quad: [u32; 4]) {
        self.add_face([quad[0], quad[1], quad[2]]);
        self.add_face([quad[2], quad[1], quad[3]]);
    }

    pub fn build(self) -> Mesh {
        Mesh::new(self.vertices, self.faces)
    }
}

impl MeshBuilder {
    /// Adds an axis aligned box spanning `min` to `max`.
    pub fn add_cuboid(&mut self, min: Pos, max: Pos) {
        // Corner `i` takes the max of the axes whose bit is set (x = 1, y = 2, z = 4).
        let mut v = [0; 8];
        for (i, v) in v.iter_mut().enumerate() {
            let pick = |bit: usize, axis: usize| if i & bit != 0 { max[axis] } else { min[axis] };
            *v = self.add_vertex(Pos::new(pick(1, 0), pick(2, 1), pick(4, 2)));
        }

        self.add_quad([v[0b000], v[0b010], v[0b001], v[0b011]]); // bottom
        self.add_quad([v[0b100], v[0b101], v[0b110], v[0b111]]); // top
        self.add_quad([v[0b000], v[0b001], v[0b100], v[0b101]]); // -y
        self.add_quad([v[0b010], v[0b110], v[0b011], v[0b111]]); // +y
        self.add_quad([v[0b000], v[0b100], v[0b010], v[0b110]]); // -x
        self.add_quad([v[0b001], v[0b011], v[0b101], v[0b111]]); // +x
    }

    /// Extrudes a convex polygon (counter clockwise when seen from above)
    /// vertically between the heights `bottom` and `top`.
    pub fn add_prism(&mut self, outline: &[Vector2<f32>], (bottom, top): (f32, f32)) {
        if outline.len() < 3 {
            return;
        }

        let lower = (outline.iter())
            .map(|p| self.add_vertex(Pos::new(p.x, p.y, bottom)))
            .collect::<Vec<_>>();
        let upper = (outline.iter())
            .map(|p| self.add_vertex(Pos::new(p.x, p.y, top)))
            .collect::<Vec<_>>();

        for i in 1..outline.len() - 1 {
            self.add_face([lower[0], lower[i + 1], lower[i]]);
            self.add_face([upper[0], upper[i], upper[i + 1]]);
        }

        for i in 0..outline.len() {
            let j = (i + 1) % outline.len();
            self.add_quad([lower[i], lower[j], upper[i], upper[j]]);
        }
    }

    /// Adds a prism over a regular polygon, a cylinder for large `sides`.
    pub fn add_regular_prism(
        &mut self,
        center: Vector2<f32>,
        radius: f32,
        sides: u32,
        heights: (f32, f32),
    ) {
        let outline = (0..sides)
            .map(|i| {
                let angle = TAU * (i as f32) / (sides as f32);
                center + Vector2::new(angle.cos(), angle.sin()) * radius
            })
            .collect::<Vec<_>>();
        self.add_prism(&outline, heights);
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use common::progress::Progress;

    use super::*;
    use crate::geometry::polyhedron_volume;

    fn volume(mesh: &Mesh) -> f64 {
        let faces = (0..mesh.face_count())
            .filter_map(|i| mesh.face_verts(i))
            .collect::<Vec<_>>();
        polyhedron_volume(&faces)
    }

    #[test]
    fn cuboid_is_closed_and_outward() {
        let mut builder = MeshBuilder::new();
        builder.add_cuboid(Pos::new(1.0, 1.0, 1.0), Pos::new(3.0, 2.0, 4.0));
        let mesh = builder.build();

        assert_eq!(mesh.face_count(), 12);
        assert!(mesh.is_manifold(Progress::new()));
        assert!((volume(&mesh) - 6.0).abs() < 1e-5);
    }

    #[test]
    fn prism_is_closed_and_outward() {
        let mut builder = MeshBuilder::new();
        builder.add_regular_prism(Vector2::new(5.0, 5.0), 2.0, 4, (1.0, 3.0));
        let mesh = builder.build();

        // A square with a diagonal of 4 has an area of 8.
        assert!(mesh.is_manifold(Progress::new()));
        assert!((volume(&mesh) - 16.0).abs() < 1e-4);
        assert_eq!(mesh.normal(0).map(|n| n.z), Some(-1.0));
    }

    #[test]
    fn degenerate_outline_adds_nothing() {
        let mut builder = MeshBuilder::new();
        builder.add_prism(&[Vector2::zeros(), Vector2::x()], (0.0, 1.0));
        assert_eq!(builder.build().face_count(), 0);
    }
}

use std::{
    collections::HashMap,
    io::{BufReader, Read, Seek},
    sync::Arc,
};

use anyhow::{bail, ensure, Context, Result};
use common::progress::Progress;
use obj::{Obj, Position};
use tracing::debug;

use crate::{geometry::face_normal, Pos};

/// A triangle mesh in build plate space. Faces are wound so that
/// `cross(v2 - v1, v0 - v1)` points out of the solid.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    inner: Arc<MeshInner>,
}

#[derive(Debug, Default)]
struct MeshInner {
    vertices: Box<[Pos]>,
    faces: Box<[[u32; 3]]>,
}

impl Mesh {
    /// Creates a new mesh from the given vertices and faces. Indices are not
    /// checked here, see [`Mesh::validate`].
    pub fn new(vertices: Vec<Pos>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            inner: Arc::new(MeshInner {
                vertices: vertices.into_boxed_slice(),
                faces: faces.into_boxed_slice(),
            }),
        }
    }

    pub fn vertices(&self) -> &[Pos] {
        self.inner.vertices.as_ref()
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        self.inner.faces.as_ref()
    }

    pub fn face(&self, index: usize) -> Option<&[u32; 3]> {
        self.faces().get(index)
    }

    pub fn face_verts(&self, index: usize) -> Option<[Pos; 3]> {
        let face = self.face(index)?;
        let vertices = self.vertices();
        let mut out = [Pos::zeros(); 3];
        for (out, &idx) in out.iter_mut().zip(face) {
            *out = *vertices.get(idx as usize)?;
        }
        Some(out)
    }

    /// Outward unit normal of a face, or `None` if the face is out of range
    /// or has no area.
    pub fn normal(&self, index: usize) -> Option<Pos> {
        let [a, b, c] = self.face_verts(index)?;
        face_normal(a, b, c)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    pub fn face_count(&self) -> usize {
        self.faces().len()
    }

    /// Checks that every face only references existing vertices and that no
    /// vertex position is NaN or infinite.
    pub fn validate(&self) -> Result<()> {
        let count = self.vertex_count();
        for (idx, face) in self.faces().iter().enumerate() {
            if let Some(vertex) = face.iter().find(|&&v| v as usize >= count) {
                bail!("Face {idx} references vertex {vertex}, but the mesh only has {count} vertices");
            }
        }

        if let Some(idx) = (self.vertices().iter()).position(|v| v.iter().any(|x| !x.is_finite())) {
            bail!("Vertex {idx} has a non finite position");
        }

        Ok(())
    }

    /// A closed mesh has every directed edge exactly once, and the reverse of
    /// every edge belongs to a neighboring face.
    pub fn is_manifold(&self, progress: Progress) -> bool {
        progress.set_total(self.face_count() as u64);
        let mut edges = HashMap::<(u32, u32), u8>::new();

        for [a, b, c] in self.faces() {
            for (a, b) in [(*a, *b), (*b, *c), (*c, *a)] {
                *edges.entry((a, b)).or_default() += 1;
            }
            progress.add_complete(1);
        }

        let manifold = (edges.iter())
            .all(|(&(a, b), &count)| count == 1 && edges.get(&(b, a)) == Some(&1));

        progress.set_finished();
        debug!("Checked {} directed edges, manifold: {manifold}", edges.len());
        manifold
    }

    /// Returns a copy of the mesh moved by `offset`.
    pub fn translate(&self, offset: Pos) -> Self {
        let vertices = self.vertices().iter().map(|v| v + offset).collect();
        Self::new(vertices, self.faces().to_vec())
    }

    /// Get the minimum and maximum of each component of every vertex in the
    /// model. These points define the bounding box of the model.
    pub fn bounds(&self) -> (Pos, Pos) {
        vertex_bounds(self.vertices())
    }

    /// Default tolerance for "approximately zero" comparisons, scaled to the
    /// magnitude of the coordinates in the mesh.
    pub fn precision(&self) -> f32 {
        if self.vertices().is_empty() {
            return f32::EPSILON;
        }

        let (min, max) = self.bounds();
        let scale = min.abs().sup(&max.abs()).max();
        (scale * f32::EPSILON * 16.0).max(f32::EPSILON)
    }
}

/// Loads a mesh from a reader. Supported formats include `.stl` and `.obj`.
pub fn load_mesh<T: Read + Seek>(reader: &mut T, format: &str) -> Result<Mesh> {
    let format = format.to_ascii_lowercase();
    let mesh = match format.as_str() {
        "stl" => {
            let model = stl_io::read_stl(reader).context("Failed to parse stl")?;
            let vertices = (model.vertices.iter())
                .map(|v| Pos::new(v[0], v[1], v[2]))
                .collect();
            let faces: Vec<[u32; 3]> = (model.faces.iter())
                .map(|f| -> Result<[u32; 3]> {
                    let [a, b, c] = f.vertices;
                    Ok([a.try_into()?, b.try_into()?, c.try_into()?])
                })
                .collect::<Result<_>>()?;
            Mesh::new(vertices, faces)
        }
        "obj" => {
            let model: Obj<Position, u32> =
                obj::load_obj(BufReader::new(reader)).context("Failed to parse obj")?;
            ensure!(
                model.indices.len() % 3 == 0,
                "Obj index count is not a multiple of three"
            );

            let vertices = (model.vertices.iter())
                .map(|v| Pos::from(v.position))
                .collect();
            let faces = (model.indices.chunks_exact(3))
                .map(|f| [f[0], f[1], f[2]])
                .collect();
            Mesh::new(vertices, faces)
        }
        _ => bail!("Unsupported format: {format}"),
    };

    debug!(
        "Loaded {format} mesh. {{ vert: {}, face: {} }}",
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(mesh)
}

fn vertex_bounds(vertices: &[Pos]) -> (Pos, Pos) {
    vertices.iter().fold(
        (Pos::repeat(f32::MAX), Pos::repeat(f32::MIN)),
        |(min, max), v| (min.inf(v), max.sup(v)),
    )
}

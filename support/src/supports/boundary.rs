use std::collections::{hash_map::Entry, HashMap};

use super::overhangs::AcceptedFace;

/// The open boundary of a patch of faces. Edges are toggled in as faces are
/// added: an edge whose reverse is already present is shared by two faces of
/// the patch and cancels out, so only the silhouette survives.
#[derive(Debug, Clone, Default)]
pub struct BoundaryEdges {
    /// Packed edge key to its slot in `edges`.
    slots: HashMap<u64, usize>,
    /// Surviving edges in insertion order, removed edges leave a `None`.
    edges: Vec<Option<[u32; 2]>>,
    len: usize,
}

#[inline]
fn edge_key(from: u32, to: u32) -> u64 {
    (from as u64) << 32 | to as u64
}

impl BoundaryEdges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity),
            edges: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Builds the boundary of all the given faces.
    pub fn from_faces(faces: &[AcceptedFace]) -> Self {
        let mut boundary = Self::with_capacity(faces.len() * 3);
        for face in faces {
            boundary.add_face(face.face);
        }
        boundary
    }

    pub fn add_face(&mut self, [a, b, c]: [u32; 3]) {
        for (from, to) in [(a, b), (b, c), (c, a)] {
            self.toggle(from, to);
        }
    }

    /// Removes the reverse of this edge if it is present, otherwise inserts
    /// the edge. Inserting an edge that is already present does nothing.
    pub fn toggle(&mut self, from: u32, to: u32) {
        if let Some(slot) = self.slots.remove(&edge_key(to, from)) {
            self.edges[slot] = None;
            self.len -= 1;
            return;
        }

        if let Entry::Vacant(entry) = self.slots.entry(edge_key(from, to)) {
            entry.insert(self.edges.len());
            self.edges.push(Some([from, to]));
            self.len += 1;
        }
    }

    #[cfg(test)]
    fn contains(&self, from: u32, to: u32) -> bool {
        self.slots.contains_key(&edge_key(from, to))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates the surviving directed edges in the order they were first
    /// inserted.
    pub fn iter(&self) -> impl Iterator<Item = [u32; 2]> + '_ {
        self.edges.iter().flatten().copied()
    }

    pub fn to_vec(&self) -> Vec<[u32; 2]> {
        let mut out = Vec::with_capacity(self.len);
        out.extend(self.iter());
        out
    }
}

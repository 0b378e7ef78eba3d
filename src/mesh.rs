use crate::{
    error::{MarchingCubesError, Result},
    types::{Point, Value, Vector},
};

/// Most vertices a mesh can hold while every index still fits in a `u32`.
pub const MAX_VERTICES: usize = u32::MAX as usize;

/// Index of the first of `added` new vertices appended after `len` existing ones.
#[inline]
fn index_base(len: usize, added: usize) -> Result<u32> {
    match len.checked_add(added) {
        Some(total) if total <= MAX_VERTICES => Ok(len as u32),
        _ => Err(MarchingCubesError::MeshTooLarge {
            vertices: len.saturating_add(added),
        }),
    }
}

/// Triangle soup produced by one extraction pass.
///
/// Vertices are never shared: triangle `t` owns vertices `3t`, `3t + 1` and
/// `3t + 2`, and `indices` is the sequence `0, 1, 2, ...`. Each index triple
/// is wound counter-clockwise when viewed from outside the surface. At most
/// [`MAX_VERTICES`] vertices fit; growing past that fails with
/// [`MarchingCubesError::MeshTooLarge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Flat list of vertex positions.
    pub vertices: Vec<Point>,

    /// Triangle indices into `vertices`, three per triangle.
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    /// Creates an empty mesh with no vertices or triangles.
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(3 * triangles),
            indices: Vec::with_capacity(3 * triangles),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends a triangle as three fresh vertices.
    #[inline]
    pub fn push_triangle(&mut self, [a, b, c]: [Point; 3]) -> Result<()> {
        let base = index_base(self.vertices.len(), 3)?;
        self.vertices.extend([a, b, c]);
        self.indices.extend([base, base + 1, base + 2]);
        Ok(())
    }

    /// Moves every triangle of `other` onto the end of this mesh, rebasing its indices.
    pub fn append(&mut self, other: &mut SurfaceMesh) -> Result<()> {
        let base = index_base(self.vertices.len(), other.vertices.len())?;
        self.vertices.append(&mut other.vertices);
        self.indices.extend(other.indices.drain(..).map(|i| i + base));
        Ok(())
    }

    /// Concatenates meshes in order.
    pub fn concat(parts: Vec<SurfaceMesh>) -> Result<SurfaceMesh> {
        let triangles = parts.iter().map(SurfaceMesh::triangle_count).sum();
        let mut out = SurfaceMesh::with_capacity(triangles);
        for mut part in parts {
            out.append(&mut part)?;
        }
        Ok(out)
    }

    /// Returns the three vertex positions of triangle `tri`.
    pub fn tri_coords(&self, tri: usize) -> [Point; 3] {
        let i = &self.indices[3 * tri..3 * tri + 3];
        [
            self.vertices[i[0] as usize],
            self.vertices[i[1] as usize],
            self.vertices[i[2] as usize],
        ]
    }

    /// Iterates the vertex positions of every triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [Point; 3]> + '_ {
        (0..self.triangle_count()).map(|tri| self.tri_coords(tri))
    }

    /// Computes the unit face normal for triangle `tri`.
    ///
    /// Returns the zero vector if the triangle is degenerate.
    pub fn tri_normal(&self, tri: usize) -> Vector {
        let [a, b, c] = self.tri_coords(tri);
        let cross = (b - a).cross(&(c - b));

        let nrm = cross.norm();
        if nrm == 0.0 {
            Vector::zeros()
        } else {
            cross / nrm
        }
    }

    /// Face normals repeated once per vertex, ready for a flat-shaded vertex buffer.
    pub fn flat_normals(&self) -> Vec<[Value; 3]> {
        let mut normals = vec![[0.0; 3]; self.vertices.len()];
        for tri in 0..self.triangle_count() {
            let n = self.tri_normal(tri);
            for &i in &self.indices[3 * tri..3 * tri + 3] {
                normals[i as usize] = [n.x, n.y, n.z];
            }
        }
        normals
    }

    /// Signed volume enclosed by the triangles (divergence theorem).
    ///
    /// Positive for a closed surface whose triangles face outward.
    pub fn signed_volume(&self) -> Value {
        self.triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)))
            .sum::<Value>()
            / 6.0
    }

    /// Total triangle area.
    pub fn area(&self) -> Value {
        self.triangles()
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() / 2.0)
            .sum()
    }

    /// Vertex positions as plain arrays, for engines that want `[f32; 3]` buffers.
    pub fn positions(&self) -> Vec<[Value; 3]> {
        self.vertices.iter().map(|p| [p.x, p.y, p.z]).collect()
    }
}

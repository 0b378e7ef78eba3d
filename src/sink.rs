use crate::{
    config::ExtractionRequest,
    error::Result,
    extract::{PassStats, extract_with_stats},
    field::ScalarField,
    mesh::SurfaceMesh,
};

/// Receives each finished mesh, e.g. to upload it to a renderer.
///
/// The mesh is moved in; the sink owns it from then on.
pub trait MeshSink {
    fn accept(&mut self, mesh: SurfaceMesh);
}

impl<S> MeshSink for S
where
    S: FnMut(SurfaceMesh),
{
    fn accept(&mut self, mesh: SurfaceMesh) {
        self(mesh)
    }
}

/// Runs one pass and hands the mesh to `sink` if it succeeds.
///
/// On failure the sink is not called, so whatever it showed before stays in place.
pub fn extract_into<F, S>(request: &ExtractionRequest<F>, sink: &mut S) -> Result<PassStats>
where
    F: ScalarField,
    S: MeshSink + ?Sized,
{
    let (mesh, stats) = extract_with_stats(request)?;
    sink.accept(mesh);
    Ok(stats)
}

/// Sink that keeps the most recent mesh.
#[derive(Debug, Clone, Default)]
pub struct LatestMesh {
    mesh: Option<SurfaceMesh>,
    generation: u64,
}

impl LatestMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&SurfaceMesh> {
        self.mesh.as_ref()
    }

    pub fn take(&mut self) -> Option<SurfaceMesh> {
        self.mesh.take()
    }

    /// How many meshes have been accepted so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl MeshSink for LatestMesh {
    fn accept(&mut self, mesh: SurfaceMesh) {
        self.mesh = Some(mesh);
        self.generation += 1;
    }
}

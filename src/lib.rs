//! Marching Cubes extraction of implicit surfaces.
//!
//! Sample a [`ScalarField`] on a regular grid inside [`Bounds`], classify each
//! cube against the iso level, interpolate crossings along its edges and emit
//! the triangles of its case into a [`SurfaceMesh`].
//!
//! ```rust,ignore
//! use implicit_cubes::{ExtractionRequest, Resolution, extract, field::orbiting_pair};
//!
//! let request = ExtractionRequest::new(orbiting_pair(0.0)).with_resolution(Resolution::uniform(25));
//! let mesh = extract(&request)?;
//! ```

pub mod cancel;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod field;
pub mod grid;
pub mod interp;
pub mod lattice;
pub mod mesh;
#[cfg(feature = "plugin")]
pub mod plugin;
pub mod sink;
pub mod tables;
pub mod triangulate;
pub mod types;

pub use cancel::CancelToken;
pub use config::{ExtractionOptions, ExtractionRequest, MissingCrossingPolicy, Parallelism, Sampling};
pub use error::{MarchingCubesError, Result};
pub use extract::{PassStats, extract, extract_with_stats, extract_with_table};
pub use field::ScalarField;
pub use grid::{Bounds, CubeGrid, Resolution};
pub use mesh::SurfaceMesh;
#[cfg(feature = "plugin")]
pub use plugin::{ImplicitSurface, ImplicitSurfacePlugin, ImplicitSurfaceSet, RemeshMode};
pub use sink::{LatestMesh, MeshSink, extract_into};

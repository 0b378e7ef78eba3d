use std::sync::Arc;

use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};

use crate::{
    cancel::CancelToken,
    config::{ExtractionOptions, ExtractionRequest},
    error::{MarchingCubesError, Result},
    extract::extract,
    field::ScalarField,
    grid::{Bounds, Resolution},
    mesh::SurfaceMesh,
    types::{Point, Value},
};

/// A scalar field that also depends on time (seconds since startup).
pub type TimedField = dyn Fn(Point, Value) -> Value + Send + Sync;

/// System sets for the surface pipeline.
///
/// Use these to order your own systems relative to mesh extraction:
///
/// ```rust,ignore
/// // Runs after geometry is ready but before it is uploaded, e.g. to build colliders:
/// app.add_systems(Update, build_collider.after(ImplicitSurfaceSet::Generate)
///                                       .before(ImplicitSurfaceSet::Upload));
/// ```
///
/// ```text
/// ImplicitSurfaceSet::Spawn  →  [async compute]  →  ImplicitSurfaceSet::Generate  →  [your systems]  →  ImplicitSurfaceSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImplicitSurfaceSet {
    /// Queues surfaces and spawns an async extraction pass for each.
    Spawn,
    /// Polls passes and inserts [`ExtractedSurface`] on completion.
    Generate,
    /// Uploads [`ExtractedSurface`] into a Bevy [`Mesh3d`] and removes it.
    Upload,
}

/// When a surface is re-extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemeshMode {
    /// When the component is added or changed.
    #[default]
    Once,
    /// Every frame, sampling the field at the current time.
    EveryFrame,
}

/// An implicit surface to be meshed: the zero level set of `field` at the current time.
///
/// ```rust,ignore
/// commands.spawn((
///     ImplicitSurface::new(|p, t| 1.0 / p.coords.norm_squared() - 1.0 - 0.5 * t.sin())
///         .with_bounds(Bounds::cube(4.0))
///         .with_resolution(Resolution::uniform(25))
///         .with_mode(RemeshMode::EveryFrame),
///     MeshMaterial3d(material),
/// ));
/// ```
#[derive(Component, Clone)]
#[require(Transform)]
pub struct ImplicitSurface {
    pub field: Arc<TimedField>,
    pub bounds: Bounds,
    pub resolution: Resolution,
    pub options: ExtractionOptions,
    pub mode: RemeshMode,
}

impl ImplicitSurface {
    pub fn new<F>(field: F) -> Self
    where
        F: Fn(Point, Value) -> Value + Send + Sync + 'static,
    {
        Self {
            field: Arc::new(field),
            bounds: Bounds::default(),
            resolution: Resolution::default(),
            options: ExtractionOptions::default(),
            mode: RemeshMode::default(),
        }
    }

    /// A surface whose field ignores time.
    pub fn from_field<F>(field: F) -> Self
    where
        F: ScalarField + Send + 'static,
    {
        Self::new(move |p, _| field.evaluate(p))
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_mode(mut self, mode: RemeshMode) -> Self {
        self.mode = mode;
        self
    }

    /// Freezes the field at `time` into a request that can run on another thread.
    pub fn request_at(&self, time: Value) -> ExtractionRequest<impl ScalarField + Send + 'static> {
        let field = Arc::clone(&self.field);
        ExtractionRequest::new(move |p: Point| field(p, time))
            .with_bounds(self.bounds)
            .with_resolution(self.resolution)
            .with_options(self.options.clone())
    }
}

/// Marker component added to [`ImplicitSurface`] entities that need a new pass.
///
/// Removed once the pass has been spawned.
#[derive(Component)]
pub struct QueuedSurface;

/// Holds the in-flight extraction pass for an [`ImplicitSurface`].
#[derive(Component)]
pub struct ComputeTask {
    task: Task<Result<SurfaceMesh>>,
    cancel: CancelToken,
}

/// A freshly extracted mesh, waiting to be uploaded.
///
/// Inserted by [`ImplicitSurfaceSet::Generate`], removed by [`ImplicitSurfaceSet::Upload`].
#[derive(Component)]
pub struct ExtractedSurface(pub SurfaceMesh);

/// Runtime configuration for the surface pipeline.
///
/// ```rust,ignore
/// fn my_system(mut config: ResMut<ImplicitSurfaceConfig>) {
///     config.max_tasks_per_frame = 1;
/// }
/// ```
#[derive(Resource)]
pub struct ImplicitSurfaceConfig {
    /// Maximum number of extraction passes spawned per frame. Default: `4`.
    pub max_tasks_per_frame: usize,
}

impl Default for ImplicitSurfaceConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 4,
        }
    }
}

/// Bevy plugin that keeps [`Mesh3d`]s in sync with [`ImplicitSurface`]s.
///
/// Passes run on Bevy's `AsyncComputeTaskPool` so the main thread is never blocked:
///
/// ```text
/// ImplicitSurface added / changed / EveryFrame
///   → QueuedSurface inserted
///   → ComputeTask spawned          (ImplicitSurfaceSet::Spawn, one per entity at a time)
///   → [async compute runs]
///   → ExtractedSurface inserted    (ImplicitSurfaceSet::Generate)
///   → Mesh3d inserted              (ImplicitSurfaceSet::Upload)
/// ```
///
/// Changing the component while a pass is in flight cancels that pass. A pass
/// that fails leaves the previous `Mesh3d` in place.
pub struct ImplicitSurfacePlugin {
    /// Initial value for [`ImplicitSurfaceConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
}

impl Default for ImplicitSurfacePlugin {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: ImplicitSurfaceConfig::default().max_tasks_per_frame,
        }
    }
}

impl Plugin for ImplicitSurfacePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ImplicitSurfaceConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
        })
        .configure_sets(
            Update,
            (
                ImplicitSurfaceSet::Spawn,
                ImplicitSurfaceSet::Generate,
                ImplicitSurfaceSet::Upload,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                (queue_changed_surfaces, queue_animated_surfaces, spawn_surface_tasks)
                    .chain()
                    .in_set(ImplicitSurfaceSet::Spawn),
                poll_surface_tasks.in_set(ImplicitSurfaceSet::Generate),
                upload_surface.in_set(ImplicitSurfaceSet::Upload),
            ),
        );
    }
}

/// Queues added or changed surfaces, abandoning any pass that is now stale.
fn queue_changed_surfaces(
    mut commands: Commands,
    query: Query<(Entity, Option<&ComputeTask>), Changed<ImplicitSurface>>,
) {
    for (entity, in_flight) in query.iter() {
        let mut entity_commands = commands.entity(entity);
        if let Some(task) = in_flight {
            task.cancel.cancel();
            entity_commands.remove::<ComputeTask>();
        }
        entity_commands.insert(QueuedSurface);
    }
}

/// Queues every [`RemeshMode::EveryFrame`] surface.
fn queue_animated_surfaces(
    mut commands: Commands,
    query: Query<(Entity, &ImplicitSurface), Without<QueuedSurface>>,
) {
    for (entity, surface) in query.iter() {
        if surface.mode == RemeshMode::EveryFrame {
            commands.entity(entity).insert(QueuedSurface);
        }
    }
}

/// Spawns passes for queued surfaces that have none in flight, up to
/// [`ImplicitSurfaceConfig::max_tasks_per_frame`] per frame.
fn spawn_surface_tasks(
    mut commands: Commands,
    config: Res<ImplicitSurfaceConfig>,
    time: Res<Time>,
    query: Query<(Entity, &ImplicitSurface), (With<QueuedSurface>, Without<ComputeTask>)>,
) {
    let task_pool = AsyncComputeTaskPool::get();
    let now = time.elapsed_secs();

    for (entity, surface) in query.iter().take(config.max_tasks_per_frame) {
        let cancel = CancelToken::new();
        let mut request = surface.request_at(now);
        request.options.cancel = Some(cancel.clone());

        let task = task_pool.spawn(async move { extract(&request) });

        commands
            .entity(entity)
            .insert(ComputeTask { task, cancel })
            .remove::<QueuedSurface>();
    }
}

/// Polls in-flight passes each frame and inserts [`ExtractedSurface`] on success.
///
/// Non-blocking: passes that haven't finished are skipped and retried next frame.
fn poll_surface_tasks(mut commands: Commands, mut query: Query<(Entity, &mut ComputeTask)>) {
    for (entity, mut compute_task) in query.iter_mut() {
        let Some(result) = block_on(future::poll_once(&mut compute_task.task)) else {
            continue;
        };

        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<ComputeTask>();
        match result {
            Ok(mesh) => {
                entity_commands.insert(ExtractedSurface(mesh));
            }
            Err(MarchingCubesError::Cancelled) => {
                debug!(?entity, "surface pass cancelled");
            }
            Err(error) => {
                warn!(?entity, %error, "surface pass failed; keeping previous mesh");
            }
        }
    }
}

/// Uploads an [`ExtractedSurface`] into a Bevy [`Mesh3d`] with flat normals, then removes it.
fn upload_surface(
    mut commands: Commands,
    query: Query<(Entity, &ExtractedSurface)>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, extracted) in query.iter() {
        let mesh = &extracted.0;
        let mut bevy_mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        );

        bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, mesh.positions());
        bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, mesh.flat_normals());
        bevy_mesh.insert_indices(Indices::U32(mesh.indices.clone()));

        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(bevy_mesh)))
            .remove::<ExtractedSurface>();
    }
}

use bevy::{pbr::wireframe::WireframeConfig, prelude::*};
use implicit_cubes::{
    Bounds, ImplicitSurface, ImplicitSurfacePlugin, RemeshMode, Resolution,
    field::{ORBITING_PAIR_AMPLITUDE, ORBITING_PAIR_THRESHOLD, PointSource},
    types::{Point, Value},
};

/// Same field as `field::orbiting_pair(time)`, without building a `Metaballs` per sample.
fn orbiting_pair(p: Point, time: Value) -> Value {
    let fixed = PointSource::new(Point::origin());
    let moving = PointSource::new(Point::new(ORBITING_PAIR_AMPLITUDE * time.sin(), 0.0, 0.0));
    fixed.potential(p) + moving.potential(p) - ORBITING_PAIR_THRESHOLD
}

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            #[cfg(not(target_arch = "wasm32"))]
            bevy::pbr::wireframe::WireframePlugin::default(),
            ImplicitSurfacePlugin::default(),
        ))
        .insert_resource(WireframeConfig {
            global: true,
            ..Default::default()
        })
        .add_systems(Startup, setup)
        .run();
}

fn setup(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    bevy::log::info!("Metaballs Example");

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 4.0, 9.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight::default(),
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // One source stays at the origin, the other swings through it along x.
    commands.spawn((
        ImplicitSurface::new(orbiting_pair)
            .with_bounds(Bounds::cube(4.0))
            .with_resolution(Resolution::uniform(25))
            .with_mode(RemeshMode::EveryFrame),
        MeshMaterial3d(materials.add(Color::srgb(0.8, 0.3, 0.2))),
    ));
}

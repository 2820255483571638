//! Main-screen 3D viewport: fixed per-frame pass ordering and HUD overlays.
//!
//! Pass order per frame: skybox (clears color/depth) -> engine particle
//! spawning -> shared camera uniform -> ship hulls -> particle draw ->
//! space dust -> targeting reticle -> text overlays. The overlay pass runs
//! at full surface size, which also restores the default viewport for any
//! UI drawn after the frame.

use crate::state::GameState;
use anyhow::Result;
use engine_core::{
    vec2_from_angle, CallSign, EngineEmitter, ImpulseEngine, Physics, ShipHull, Target, Transform,
    Zone,
};
use glam::{Vec2, Vec3};
use hecs::{Entity, World};
use renderer::{
    select_local_skybox, InstanceData, OverlayTextBuilder, ParticleSim, Rect, ScreenProjector,
    TextAlign,
};

/// Minimum gap between engine-particle batches per ship, in seconds.
const ENGINE_PARTICLE_INTERVAL: f32 = 0.1;
/// Engine-trail particle lifetime in seconds.
const ENGINE_PARTICLE_LIFETIME: f32 = 5.0;
/// Callsigns are culled beyond this camera-space depth.
const CALLSIGN_DRAW_DISTANCE: f32 = 10_000.0;
/// Heading labels sit on a ring of this radius around the ship.
const HEADING_RING_RADIUS: f32 = 2_500.0;
/// Bounding radius assumed for ships without physics.
const DEFAULT_RADIUS: f32 = 300.0;

/// Viewport flags and the rectangle the 3D view occupies, in pixels.
pub struct Viewport3d {
    pub rect: Rect,
    pub show_callsigns: bool,
    pub show_headings: bool,
    pub show_spacedust: bool,
}

impl Viewport3d {
    pub fn new(show_callsigns: bool, show_headings: bool, show_spacedust: bool) -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            show_callsigns,
            show_headings,
            show_spacedust,
        }
    }
}

/// Run all main-screen passes for one frame.
pub fn run(state: &mut GameState) -> Result<()> {
    let size = state.renderer.window.inner_size();
    state.viewport.rect = Rect::new(0.0, 0.0, size.width as f32, size.height as f32);
    let rect = state.viewport.rect;
    if rect.size.x == 0.0 {
        // One-frame layout race while the window is resized to nothing;
        // drawing into an empty viewport is the only thing worth skipping.
        return Ok(());
    }

    let (output, mut encoder) = state.renderer.begin_frame()?;
    let target = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let camera = state.camera;
    let aspect = rect.aspect();
    let projection = camera.projection_matrix(aspect);
    let view_matrix = camera.view_matrix();

    // ---- Skybox: global blended toward the zone the camera is inside ----
    let camera_ground = Vec2::new(camera.position.x, camera.position.y);
    let global_name = format!("skybox/{}", state.config.default_skybox);
    let (local_name, box_lerp) = {
        let mut query = state.world.query::<(&Zone, &Transform)>();
        select_local_skybox(
            query.iter().map(|(_, (zone, t))| (zone, t)),
            camera_ground,
            &global_name,
        )
    };
    state.skybox.render(
        &state.renderer.device,
        &state.renderer.queue,
        &mut encoder,
        &target,
        state.renderer.depth_texture_view(),
        rect,
        projection,
        view_matrix,
        &global_name,
        &local_name,
        box_lerp,
    );
    log::trace!(
        "skybox {} -> {} (lerp {:.2}), {} cubemaps cached",
        global_name,
        local_name,
        box_lerp,
        state.skybox.cached_cubemaps()
    );

    // ---- Engine particle spawning (logic only, no draw) ----
    emit_engine_particles(
        &mut state.world,
        state.time.elapsed_seconds(),
        &mut state.particles.sim,
    );

    // ---- Publish camera matrices for all world-space passes ----
    state.renderer.update_camera(&camera, aspect);

    // ---- Ship hulls ----
    let mut instances = Vec::new();
    for (_, (transform, hull)) in state.world.query::<(&Transform, &ShipHull)>().iter() {
        instances.push(InstanceData::new(
            transform.to_matrix_scaled(hull.scale).to_cols_array_2d(),
            hull.color,
        ));
    }
    state
        .renderer
        .render_ships(&mut encoder, &target, rect, &instances);

    // ---- Engine-trail particles ----
    state.particles.render(
        &state.renderer.queue,
        &mut encoder,
        &target,
        state.renderer.depth_texture_view(),
        rect,
        projection,
        view_matrix,
    );

    // ---- Space dust around the player ship ----
    if state.viewport.show_spacedust && state.my_ship.is_some() {
        let (center, velocity) = dust_frame_inputs(&state.world, state.my_ship, camera.position);
        state.spacedust.update(center, &mut rand::thread_rng());
        state.spacedust.render(
            &state.renderer.queue,
            &mut encoder,
            &target,
            state.renderer.depth_texture_view(),
            rect,
            projection,
            view_matrix,
            velocity,
        );
    }

    // ---- Targeting reticle over the locked target ----
    if let Some((position, radius)) = locked_target(&state.world, state.my_ship) {
        state.reticle.render(
            &state.renderer.device,
            &state.renderer.queue,
            &mut encoder,
            &target,
            rect,
            state.renderer.camera_bind_group(),
            position,
            radius,
        );
    }

    // ---- HUD overlays ----
    let projector = ScreenProjector {
        view: view_matrix,
        projection,
        rect,
    };
    let mut tb = OverlayTextBuilder::new(rect.size.x, rect.size.y);
    if state.viewport.show_callsigns {
        build_callsigns(&state.world, state.my_ship, &projector, &mut tb);
    }
    if state.viewport.show_headings {
        if let Some(ship) = state.my_ship {
            build_heading_ring(&state.world, ship, &projector, &mut tb);
        }
    }
    state
        .renderer
        .render_overlay(&mut encoder, &target, &tb.vertices, &tb.indices);

    state.renderer.end_frame(output, encoder);
    Ok(())
}

/// Spawn one particle per emitter point for every ship under power, at most
/// once per [`ENGINE_PARTICLE_INTERVAL`] per ship. A ship with zero actual
/// throttle emits nothing no matter how long it has been idle.
pub fn emit_engine_particles(world: &mut World, elapsed: f32, particles: &mut ParticleSim) {
    for (_, (emitter, transform, impulse)) in
        world.query_mut::<(&mut EngineEmitter, &Transform, &ImpulseEngine)>()
    {
        if impulse.actual == 0.0 {
            continue;
        }
        let engine_scale = impulse.actual.abs();
        if elapsed - emitter.last_particle_time > ENGINE_PARTICLE_INTERVAL {
            for spec in &emitter.emitters {
                let pos2d = transform.local_to_world(Vec2::new(spec.offset.x, spec.offset.y));
                let pos3d = Vec3::new(pos2d.x, pos2d.y, spec.offset.z);
                particles.spawn(
                    pos3d,
                    pos3d,
                    spec.color,
                    spec.color,
                    spec.scale * engine_scale,
                    0.0,
                    ENGINE_PARTICLE_LIFETIME,
                );
            }
            emitter.last_particle_time = elapsed;
        }
    }
}

/// Dust recycles around the ship's plane position (camera when shipless);
/// streak stretch comes from the planar velocity scaled down by 100.
fn dust_frame_inputs(world: &World, my_ship: Option<Entity>, camera_position: Vec3) -> (Vec3, Vec2) {
    let Some(ship) = my_ship else {
        return (camera_position, Vec2::ZERO);
    };
    let center = world
        .get::<&Transform>(ship)
        .map(|t| Vec3::new(t.position().x, t.position().y, 0.0))
        .unwrap_or(camera_position);
    let velocity = world
        .get::<&Physics>(ship)
        .map(|p| p.velocity / 100.0)
        .unwrap_or(Vec2::ZERO);
    (center, velocity)
}

/// Resolve the player's lock to a world position and bounding radius.
fn locked_target(world: &World, my_ship: Option<Entity>) -> Option<(Vec2, f32)> {
    let ship = my_ship?;
    let target = world.get::<&Target>(ship).ok()?.entity?;
    let position = world.get::<&Transform>(target).ok()?.position();
    let radius = world
        .get::<&Physics>(target)
        .map(|p| p.size)
        .unwrap_or(DEFAULT_RADIUS);
    Some((position, radius))
}

/// Text height and alpha for a callsign at camera-space depth `depth`.
/// None when the label is behind the camera or past the draw distance.
fn callsign_fade(depth: f32) -> Option<(f32, f32)> {
    if depth < 0.0 || depth > CALLSIGN_DRAW_DISTANCE {
        return None;
    }
    let factor = 1.0 - depth / CALLSIGN_DRAW_DISTANCE;
    Some((20.0 * factor, 128.0 / 255.0 * factor))
}

fn build_callsigns(
    world: &World,
    my_ship: Option<Entity>,
    projector: &ScreenProjector,
    tb: &mut OverlayTextBuilder,
) {
    for (entity, (callsign, transform)) in world.query::<(&CallSign, &Transform)>().iter() {
        if Some(entity) == my_ship {
            continue;
        }
        let radius = world
            .get::<&Physics>(entity)
            .map(|p| p.size)
            .unwrap_or(DEFAULT_RADIUS);
        let screen = projector.world_to_screen(Vec3::new(
            transform.position().x,
            transform.position().y,
            radius,
        ));
        let Some((height, alpha)) = callsign_fade(screen.z) else {
            continue;
        };
        tb.add_text_aligned(
            screen.x,
            screen.y,
            &callsign.callsign,
            height,
            TextAlign::Center,
            [1.0, 1.0, 1.0, alpha],
        );
    }
}

/// World point for a heading label. Heading 0 is "up" on the radar, which
/// is why the angle-to-vector conversion carries a -90 degree offset.
fn heading_point(ship: Vec2, heading: f32) -> Vec2 {
    ship + vec2_from_angle(heading - 90.0) * HEADING_RING_RADIUS
}

fn build_heading_ring(
    world: &World,
    ship: Entity,
    projector: &ScreenProjector,
    tb: &mut OverlayTextBuilder,
) {
    let Ok(transform) = world.get::<&Transform>(ship) else {
        return;
    };
    for heading in (0..360).step_by(30) {
        let world_pos = heading_point(transform.position(), heading as f32);
        let screen = projector.world_to_screen(Vec3::new(world_pos.x, world_pos.y, 0.0));
        // In front of the camera is the only cut; headings have no
        // distance fade, unlike callsigns.
        if screen.z > 0.0 {
            tb.add_text_aligned(
                screen.x,
                screen.y,
                &heading.to_string(),
                30.0,
                TextAlign::Center,
                [1.0, 1.0, 1.0, 128.0 / 255.0],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{EmitterSpec, EngineEmitter};

    fn powered_ship(world: &mut World, throttle: f32, emitter_count: usize) -> Entity {
        let emitters = (0..emitter_count)
            .map(|i| EmitterSpec {
                offset: Vec3::new(-100.0, i as f32 * 20.0, 8.0),
                color: Vec3::new(0.3, 0.5, 1.0),
                scale: 6.0,
            })
            .collect();
        world.spawn((
            Transform::new(Vec2::ZERO),
            EngineEmitter::new(emitters),
            ImpulseEngine {
                request: throttle,
                actual: throttle,
            },
        ))
    }

    #[test]
    fn zero_throttle_never_emits() {
        let mut world = World::new();
        powered_ship(&mut world, 0.0, 2);
        let mut particles = ParticleSim::new();
        for step in 0..50 {
            emit_engine_particles(&mut world, step as f32, &mut particles);
        }
        assert!(particles.is_empty());
    }

    #[test]
    fn emission_throttled_to_one_batch_per_window() {
        let mut world = World::new();
        powered_ship(&mut world, 0.7, 1);
        let mut particles = ParticleSim::new();

        emit_engine_particles(&mut world, 1.0, &mut particles);
        assert_eq!(particles.len(), 1);
        // Within the same 0.1 s window: nothing.
        emit_engine_particles(&mut world, 1.05, &mut particles);
        emit_engine_particles(&mut world, 1.09, &mut particles);
        assert_eq!(particles.len(), 1);
        // Past the window: one more batch.
        emit_engine_particles(&mut world, 1.2, &mut particles);
        assert_eq!(particles.len(), 2);
    }

    #[test]
    fn one_particle_per_emitter_point() {
        let mut world = World::new();
        powered_ship(&mut world, 1.0, 3);
        let mut particles = ParticleSim::new();
        emit_engine_particles(&mut world, 1.0, &mut particles);
        assert_eq!(particles.len(), 3);
    }

    #[test]
    fn particle_scale_follows_absolute_throttle() {
        let mut world = World::new();
        // Reverse thrust still emits, scaled by |throttle|.
        powered_ship(&mut world, -0.5, 1);
        let mut particles = ParticleSim::new();
        emit_engine_particles(&mut world, 1.0, &mut particles);
        let instances = particles.instances();
        assert_eq!(instances.len(), 1);
        // Emitter scale 6.0 x |-0.5| = 3.0; sprites start at half size.
        assert!((instances[0].size - 1.5).abs() < 1e-4);
    }

    #[test]
    fn callsign_fade_endpoints() {
        // At depth 0: full 20 px and alpha 128/255.
        let (height, alpha) = callsign_fade(0.0).unwrap();
        assert!((height - 20.0).abs() < 1e-5);
        assert!((alpha - 128.0 / 255.0).abs() < 1e-5);
        // At the draw distance the label fades to nothing but still draws.
        let (height, alpha) = callsign_fade(CALLSIGN_DRAW_DISTANCE).unwrap();
        assert!(height.abs() < 1e-3);
        assert!(alpha.abs() < 1e-6);
        // Beyond it, and behind the camera: not drawn at all.
        assert!(callsign_fade(CALLSIGN_DRAW_DISTANCE + 1.0).is_none());
        assert!(callsign_fade(-1.0).is_none());
    }

    #[test]
    fn heading_zero_is_radar_up() {
        let p = heading_point(Vec2::ZERO, 0.0);
        assert!((p - Vec2::new(0.0, -HEADING_RING_RADIUS)).length() < 1e-2);
        let p = heading_point(Vec2::ZERO, 90.0);
        assert!((p - Vec2::new(HEADING_RING_RADIUS, 0.0)).length() < 1e-2);
    }

    #[test]
    fn locked_target_resolves_position_and_radius() {
        let mut world = World::new();
        let hostile = world.spawn((Transform::new(Vec2::new(500.0, 200.0)), Physics::new(110.0)));
        let player = world.spawn((
            Transform::new(Vec2::ZERO),
            Target {
                entity: Some(hostile),
            },
        ));
        let (pos, radius) = locked_target(&world, Some(player)).unwrap();
        assert_eq!(pos, Vec2::new(500.0, 200.0));
        assert_eq!(radius, 110.0);
        assert!(locked_target(&world, None).is_none());
    }

    #[test]
    fn locked_target_without_physics_uses_default_radius() {
        let mut world = World::new();
        let hostile = world.spawn((Transform::new(Vec2::ZERO),));
        let player = world.spawn((
            Transform::new(Vec2::ZERO),
            Target {
                entity: Some(hostile),
            },
        ));
        let (_, radius) = locked_target(&world, Some(player)).unwrap();
        assert_eq!(radius, DEFAULT_RADIUS);
    }

    #[test]
    fn dust_inputs_fall_back_to_camera_without_ship() {
        let world = World::new();
        let cam = Vec3::new(10.0, 20.0, 30.0);
        let (center, velocity) = dust_frame_inputs(&world, None, cam);
        assert_eq!(center, cam);
        assert_eq!(velocity, Vec2::ZERO);
    }

    #[test]
    fn dust_inputs_use_ship_plane_position_and_scaled_velocity() {
        let mut world = World::new();
        let mut physics = Physics::new(120.0);
        physics.velocity = Vec2::new(200.0, -50.0);
        let ship = world.spawn((Transform::new(Vec2::new(1.0, 2.0)), physics));
        let (center, velocity) = dust_frame_inputs(&world, Some(ship), Vec3::ZERO);
        assert_eq!(center, Vec3::new(1.0, 2.0, 0.0));
        assert!((velocity - Vec2::new(2.0, -0.5)).length() < 1e-6);
    }
}

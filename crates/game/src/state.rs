//! Game state: entity world, camera, render passes, and per-frame update.

use crate::config::GameConfig;
use crate::scenario::{self, Autopilot};
use crate::viewport::{self, Viewport3d};
use anyhow::Result;
use engine_core::{vec2_from_angle, CallSign, ImpulseEngine, Physics, Target, Time, Transform};
use glam::{Vec2, Vec3};
use hecs::{Entity, World};
use input::InputState;
use renderer::{Camera, ParticleEngine, Renderer, ReticleRenderer, SkyboxRenderer, SpacedustField};
use std::sync::Arc;
use winit::event::WindowEvent;
use winit::keyboard::PhysicalKey;
use winit::window::Window;

/// Impulse spool rate toward the requested throttle, per second.
const IMPULSE_SPOOL_RATE: f32 = 0.6;
/// Top speed at full impulse, world units per second.
const MAX_IMPULSE_SPEED: f32 = 90.0;
/// Helm turn rate at full rudder, degrees per second.
const TURN_RATE: f32 = 25.0;
/// Bridge camera: distance behind the ship and altitude above the plane.
const CAMERA_DISTANCE: f32 = 280.0;
const CAMERA_HEIGHT: f32 = 100.0;

pub struct GameState {
    pub renderer: Renderer,
    pub skybox: SkyboxRenderer,
    pub particles: ParticleEngine,
    pub spacedust: SpacedustField,
    pub reticle: ReticleRenderer,
    pub viewport: Viewport3d,
    pub world: World,
    pub camera: Camera,
    pub time: Time,
    pub input: InputState,
    pub config: GameConfig,
    pub my_ship: Option<Entity>,
    /// View offset relative to the ship heading, degrees (arrow keys).
    view_yaw_offset: f32,
    view_pitch: f32,
    pub running: bool,
}

impl GameState {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let config = GameConfig::load();
        let renderer = Renderer::new(window, config.vsync).await?;
        let skybox = SkyboxRenderer::new(&renderer.device, &renderer.config);
        let particles = ParticleEngine::new(&renderer.device, &renderer.config);
        let spacedust = SpacedustField::new(&renderer.device, &renderer.config);
        let reticle = ReticleRenderer::new(
            &renderer.device,
            &renderer.config,
            renderer.camera_bind_group_layout(),
        );

        let mut world = World::new();
        let player = scenario::populate(&mut world);

        let camera = Camera {
            fov: config.main_screen_fov,
            ..Default::default()
        };
        let viewport = Viewport3d::new(
            config.show_callsigns,
            config.show_headings,
            config.show_spacedust,
        );

        Ok(Self {
            renderer,
            skybox,
            particles,
            spacedust,
            reticle,
            viewport,
            world,
            camera,
            time: Time::new(),
            input: InputState::new(),
            config,
            my_ship: Some(player),
            view_yaw_offset: 0.0,
            view_pitch: 10.0,
            running: true,
        })
    }

    /// Process a window event. Returns true when the app should exit.
    pub fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => self.quit(),
            WindowEvent::Resized(size) => self.renderer.resize(size),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.input.process_keyboard(code, event.state);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.process_cursor_position((position.x, position.y));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.process_mouse_button(button, state);
            }
            WindowEvent::RedrawRequested => {
                self.time.update();
                self.update(self.time.delta_seconds());
                if let Err(e) = viewport::run(self) {
                    log::error!("render error: {e:#}");
                }
                self.input.begin_frame();
                self.renderer.window.request_redraw();
            }
            _ => {}
        }
        !self.running
    }

    /// Persist the overlay toggles and stop the frame loop.
    fn quit(&mut self) {
        self.config.show_callsigns = self.viewport.show_callsigns;
        self.config.show_headings = self.viewport.show_headings;
        self.config.show_spacedust = self.viewport.show_spacedust;
        self.config.save();
        self.running = false;
    }

    fn update(&mut self, dt: f32) {
        if self.input.is_quit_pressed() {
            self.quit();
        }
        if self.input.is_toggle_callsigns_pressed() {
            self.viewport.show_callsigns = !self.viewport.show_callsigns;
        }
        if self.input.is_toggle_headings_pressed() {
            self.viewport.show_headings = !self.viewport.show_headings;
        }
        if self.input.is_toggle_spacedust_pressed() {
            self.viewport.show_spacedust = !self.viewport.show_spacedust;
        }
        if self.input.is_cycle_target_pressed() {
            self.cycle_target();
        }

        // Helm input to the player ship.
        if let Some(ship) = self.my_ship {
            if let Ok(mut impulse) = self.world.get::<&mut ImpulseEngine>(ship) {
                impulse.request = self.input.impulse_input();
            }
            if let Ok(mut transform) = self.world.get::<&mut Transform>(ship) {
                transform.rotate(self.input.rudder_input() * TURN_RATE * dt);
            }
        }

        // Standing orders for AI ships.
        for (_, (autopilot, impulse, transform)) in self
            .world
            .query_mut::<(&Autopilot, &mut ImpulseEngine, &mut Transform)>()
        {
            impulse.request = autopilot.throttle;
            transform.rotate(autopilot.rudder * dt);
        }

        advance_ships(&mut self.world, dt);

        // Bridge camera: behind the ship, looking along its heading plus
        // the arrow-key view offset.
        let look = self.input.look_input();
        self.view_yaw_offset += look.x * 60.0 * dt;
        self.view_pitch = (self.view_pitch - look.y * 40.0 * dt).clamp(-30.0, 75.0);
        if let Some(ship) = self.my_ship {
            if let Ok(transform) = self.world.get::<&Transform>(ship) {
                let bearing = 90.0 - transform.rotation() + self.view_yaw_offset;
                let dir = Vec2::new(bearing.to_radians().sin(), bearing.to_radians().cos());
                let pos = transform.position() - dir * CAMERA_DISTANCE;
                self.camera.position = Vec3::new(pos.x, pos.y, CAMERA_HEIGHT);
                self.camera.yaw = bearing;
                self.camera.pitch = self.view_pitch;
            }
        }
        self.camera.fov = self.config.main_screen_fov;

        self.particles.update(dt);
    }

    fn cycle_target(&mut self) {
        let Some(ship) = self.my_ship else {
            return;
        };
        let current = self
            .world
            .get::<&Target>(ship)
            .ok()
            .and_then(|t| t.entity);
        if let Some(next) = next_target(&self.world, self.my_ship, current) {
            if let Ok(mut target) = self.world.get::<&mut Target>(ship) {
                target.entity = Some(next);
            }
        }
    }
}

/// Spool impulse toward the request and integrate planar motion.
pub(crate) fn advance_ships(world: &mut World, dt: f32) {
    for (_, (transform, physics, impulse)) in
        world.query_mut::<(&mut Transform, &mut Physics, &mut ImpulseEngine)>()
    {
        let step = (impulse.request - impulse.actual)
            .clamp(-IMPULSE_SPOOL_RATE * dt, IMPULSE_SPOOL_RATE * dt);
        impulse.actual = (impulse.actual + step).clamp(-1.0, 1.0);
        physics.velocity =
            vec2_from_angle(transform.rotation()) * impulse.actual * MAX_IMPULSE_SPEED;
        let delta = physics.velocity * dt;
        transform.translate(delta);
    }
}

/// Next callsign-bearing entity after `current`, skipping the player ship.
pub(crate) fn next_target(
    world: &World,
    my_ship: Option<Entity>,
    current: Option<Entity>,
) -> Option<Entity> {
    let candidates: Vec<Entity> = world
        .query::<(&CallSign, &Transform)>()
        .iter()
        .map(|(e, _)| e)
        .filter(|e| Some(*e) != my_ship)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    match current.and_then(|cur| candidates.iter().position(|&e| e == cur)) {
        Some(i) => Some(candidates[(i + 1) % candidates.len()]),
        None => Some(candidates[0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_spools_toward_request() {
        let mut world = World::new();
        let ship = world.spawn((
            Transform::new(Vec2::ZERO),
            Physics::new(100.0),
            ImpulseEngine {
                request: 1.0,
                actual: 0.0,
            },
        ));
        advance_ships(&mut world, 0.5);
        let impulse = world.get::<&ImpulseEngine>(ship).unwrap();
        assert!((impulse.actual - 0.3).abs() < 1e-5);
    }

    #[test]
    fn ships_move_along_their_heading() {
        let mut world = World::new();
        // Facing +Y (rotation 90), full throttle already reached.
        let ship = world.spawn((
            Transform::with_rotation(Vec2::ZERO, 90.0),
            Physics::new(100.0),
            ImpulseEngine {
                request: 1.0,
                actual: 1.0,
            },
        ));
        advance_ships(&mut world, 1.0);
        let t = world.get::<&Transform>(ship).unwrap();
        assert!(t.position().x.abs() < 1e-3);
        assert!((t.position().y - MAX_IMPULSE_SPEED).abs() < 1e-3);
    }

    #[test]
    fn next_target_cycles_and_skips_player() {
        let mut world = World::new();
        let a = world.spawn((Transform::new(Vec2::ZERO), CallSign::new("A")));
        let b = world.spawn((Transform::new(Vec2::ZERO), CallSign::new("B")));
        let player = world.spawn((Transform::new(Vec2::ZERO), CallSign::new("ME")));

        let first = next_target(&world, Some(player), None).unwrap();
        assert_ne!(first, player);
        let second = next_target(&world, Some(player), Some(first)).unwrap();
        assert_ne!(second, player);
        assert_ne!(second, first);
        // Wraps around the two candidates.
        let third = next_target(&world, Some(player), Some(second)).unwrap();
        assert_eq!(third, first);
        let _ = (a, b);
    }
}

//! ECS components for ships, zones, and the viewport's inputs.

use glam::{Vec2, Vec3};

/// Radio callsign shown above a ship on the main screen.
#[derive(Debug, Clone)]
pub struct CallSign {
    pub callsign: String,
}

impl CallSign {
    pub fn new(callsign: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
        }
    }
}

/// Impulse drive state. `request` is what the helm asked for, `actual` is the
/// current throttle in [-1, 1] after spool-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpulseEngine {
    pub request: f32,
    pub actual: f32,
}

/// One engine nozzle: local offset from the ship origin (Z = altitude above
/// the hull plane), trail color, and base particle scale.
#[derive(Debug, Clone, Copy)]
pub struct EmitterSpec {
    pub offset: Vec3,
    pub color: Vec3,
    pub scale: f32,
}

/// Engine-trail emitter set for one ship. Emission is throttled per entity
/// by the timestamp of the last spawned batch.
#[derive(Debug, Clone, Default)]
pub struct EngineEmitter {
    pub emitters: Vec<EmitterSpec>,
    /// Game time (seconds) of the last particle batch.
    pub last_particle_time: f32,
}

impl EngineEmitter {
    pub fn new(emitters: Vec<EmitterSpec>) -> Self {
        Self {
            emitters,
            last_particle_time: 0.0,
        }
    }
}

/// Planar velocity and bounding radius.
#[derive(Debug, Clone, Copy)]
pub struct Physics {
    pub velocity: Vec2,
    /// Bounding radius in world units; drives reticle size and callsign height.
    pub size: f32,
}

impl Physics {
    pub fn new(size: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            size,
        }
    }
}

/// Weapons lock held by a ship.
#[derive(Debug, Clone, Copy, Default)]
pub struct Target {
    pub entity: Option<hecs::Entity>,
}

/// A designated region of space with environment overrides. The outline is a
/// polygon on the game plane, relative to the zone's transform.
#[derive(Debug, Clone, Default)]
pub struct Zone {
    pub outline: Vec<Vec2>,
    /// Skybox drawn while inside this zone; empty means no override.
    pub skybox: String,
    /// Distance from the zone edge over which the local skybox fades in.
    /// Zero or negative means no fade (full strength everywhere inside).
    pub skybox_fade_distance: f32,
}

/// Visual hull: which generated mesh to draw and how to tint it.
#[derive(Debug, Clone, Copy)]
pub struct ShipHull {
    pub color: [f32; 4],
    pub scale: f32,
}

impl ShipHull {
    pub fn new(color: [f32; 4], scale: f32) -> Self {
        Self { color, scale }
    }
}

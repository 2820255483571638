//! Demo scenario: a player ship, escorts, hostiles, a station, and two
//! nebula zones with local skyboxes.

use engine_core::{
    CallSign, EmitterSpec, EngineEmitter, ImpulseEngine, Physics, ShipHull, Target, Transform,
    Zone,
};
use glam::{Vec2, Vec3};
use hecs::{Entity, World};

/// Simple standing orders for AI ships: hold a rudder and throttle.
pub struct Autopilot {
    pub rudder: f32,
    pub throttle: f32,
}

fn twin_emitters(offset_x: f32, spread: f32, color: Vec3, scale: f32) -> EngineEmitter {
    EngineEmitter::new(vec![
        EmitterSpec {
            offset: Vec3::new(offset_x, spread, 8.0),
            color,
            scale,
        },
        EmitterSpec {
            offset: Vec3::new(offset_x, -spread, 8.0),
            color,
            scale,
        },
    ])
}

fn hex_outline(radius: f32) -> Vec<Vec2> {
    (0..6)
        .map(|i| {
            let a = (i as f32) * std::f32::consts::TAU / 6.0;
            Vec2::new(a.cos(), a.sin()) * radius
        })
        .collect()
}

/// Populate the world and return the player ship entity.
pub fn populate(world: &mut World) -> Entity {
    let blue = Vec3::new(0.25, 0.55, 1.0);
    let red = Vec3::new(1.0, 0.35, 0.15);

    // Escorts running parallel to the player.
    for (callsign, offset) in [("VS-21", Vec2::new(-600.0, 450.0)), ("VS-22", Vec2::new(-600.0, -450.0))] {
        world.spawn((
            Transform::with_rotation(offset, 0.0),
            Physics::new(90.0),
            ImpulseEngine {
                request: 0.3,
                actual: 0.3,
            },
            twin_emitters(-95.0, 28.0, blue, 6.0),
            ShipHull::new([0.55, 0.62, 0.72, 1.0], 90.0),
            CallSign::new(callsign),
            Autopilot {
                rudder: 0.0,
                throttle: 0.3,
            },
        ));
    }

    // A freighter lumbering across the bow.
    world.spawn((
        Transform::with_rotation(Vec2::new(4_000.0, 2_500.0), -120.0),
        Physics::new(160.0),
        ImpulseEngine {
            request: 0.15,
            actual: 0.15,
        },
        twin_emitters(-150.0, 45.0, Vec3::new(0.9, 0.7, 0.3), 10.0),
        ShipHull::new([0.5, 0.45, 0.38, 1.0], 160.0),
        CallSign::new("FT-09"),
        Autopilot {
            rudder: 0.0,
            throttle: 0.15,
        },
    ));

    // Hostiles circling at range.
    let mut first_hostile = None;
    for (callsign, pos, heading) in [
        ("KX-311", Vec2::new(6_000.0, -1_500.0), 90.0),
        ("KX-314", Vec2::new(7_500.0, 500.0), 150.0),
    ] {
        let hostile = world.spawn((
            Transform::with_rotation(pos, heading),
            Physics::new(110.0),
            ImpulseEngine {
                request: 0.5,
                actual: 0.5,
            },
            twin_emitters(-100.0, 32.0, red, 7.0),
            ShipHull::new([0.6, 0.3, 0.25, 1.0], 110.0),
            CallSign::new(callsign),
            Autopilot {
                rudder: 6.0,
                throttle: 0.5,
            },
        ));
        first_hostile.get_or_insert(hostile);
    }

    // Deep-space station; no drive, no emitters.
    world.spawn((
        Transform::with_rotation(Vec2::new(-3_000.0, 6_000.0), 40.0),
        Physics::new(400.0),
        ShipHull::new([0.45, 0.5, 0.55, 1.0], 400.0),
        CallSign::new("DS-4"),
    ));

    // A nebula with a soft edge and a dense core with a hard edge.
    world.spawn((
        Transform::new(Vec2::new(12_000.0, 6_000.0)),
        Zone {
            outline: hex_outline(7_000.0),
            skybox: "nebula".to_string(),
            skybox_fade_distance: 2_500.0,
        },
    ));
    world.spawn((
        Transform::new(Vec2::new(12_000.0, 6_000.0)),
        Zone {
            outline: hex_outline(2_000.0),
            skybox: "nebula-core".to_string(),
            skybox_fade_distance: 0.0,
        },
    ));
    // Marked hazard region with no environment override.
    world.spawn((
        Transform::new(Vec2::new(-9_000.0, -4_000.0)),
        Zone {
            outline: hex_outline(3_000.0),
            skybox: String::new(),
            skybox_fade_distance: 0.0,
        },
    ));

    // The player ship, locked onto the first hostile.
    world.spawn((
        Transform::with_rotation(Vec2::ZERO, 0.0),
        Physics::new(120.0),
        ImpulseEngine::default(),
        twin_emitters(-110.0, 35.0, blue, 8.0),
        ShipHull::new([0.6, 0.68, 0.8, 1.0], 120.0),
        CallSign::new("BC-304"),
        Target {
            entity: first_hostile,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_ship_has_target_lock() {
        let mut world = World::new();
        let player = populate(&mut world);
        let target = world.get::<&Target>(player).unwrap();
        assert!(target.entity.is_some());
    }

    #[test]
    fn scenario_has_zones_with_and_without_skyboxes() {
        let mut world = World::new();
        populate(&mut world);
        let mut with = 0;
        let mut without = 0;
        for (_, zone) in world.query::<&Zone>().iter() {
            if zone.skybox.is_empty() {
                without += 1;
            } else {
                with += 1;
            }
        }
        assert!(with >= 2);
        assert!(without >= 1);
    }
}

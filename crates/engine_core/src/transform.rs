//! Planar transform for space entities.
//!
//! The game world is a flat X/Y plane with Z as altitude. Ships live on the
//! plane; only visual offsets (engine emitters, camera) leave it.

use glam::{Mat4, Vec2, Vec3};

/// Position on the game plane plus a facing angle in degrees
/// (math convention: 0 = +X, counterclockwise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    position: Vec2,
    rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

impl Transform {
    /// Create a transform at the given plane position, facing +X.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }

    /// Create a transform with position and facing angle (degrees).
    pub fn with_rotation(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Facing angle in degrees.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    /// Translate along the plane.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Turn by `delta` degrees.
    pub fn rotate(&mut self, delta: f32) {
        self.rotation += delta;
    }

    /// Map a local plane offset into world space (rotated by the facing angle).
    pub fn local_to_world(&self, offset: Vec2) -> Vec2 {
        self.position + rotate_vec2(offset, self.rotation)
    }

    /// Model matrix at altitude zero: rotation about Z, then translation.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.position.x, self.position.y, 0.0))
            * Mat4::from_rotation_z(self.rotation.to_radians())
    }

    /// Model matrix with a uniform scale, for hull rendering.
    pub fn to_matrix_scaled(&self, scale: f32) -> Mat4 {
        self.to_matrix() * Mat4::from_scale(Vec3::splat(scale))
    }
}

/// Unit vector for an angle in degrees (math convention: 0 = +X).
pub fn vec2_from_angle(degrees: f32) -> Vec2 {
    let r = degrees.to_radians();
    Vec2::new(r.cos(), r.sin())
}

/// Rotate a plane vector by an angle in degrees.
pub fn rotate_vec2(v: Vec2, degrees: f32) -> Vec2 {
    let r = degrees.to_radians();
    let (s, c) = r.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec2_from_angle_cardinal_directions() {
        assert!((vec2_from_angle(0.0) - Vec2::X).length() < 1e-6);
        assert!((vec2_from_angle(90.0) - Vec2::Y).length() < 1e-6);
        assert!((vec2_from_angle(180.0) + Vec2::X).length() < 1e-6);
    }

    #[test]
    fn local_to_world_rotates_offset() {
        let t = Transform::with_rotation(Vec2::new(100.0, 50.0), 90.0);
        // A +X local offset on a ship facing +Y points along +Y in the world.
        let p = t.local_to_world(Vec2::new(10.0, 0.0));
        assert!((p - Vec2::new(100.0, 60.0)).length() < 1e-4);
    }

    #[test]
    fn to_matrix_places_origin_at_position() {
        let t = Transform::with_rotation(Vec2::new(3.0, -7.0), 42.0);
        let p = t.to_matrix().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(3.0, -7.0, 0.0)).length() < 1e-5);
    }
}

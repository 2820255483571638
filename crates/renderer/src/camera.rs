//! Main-screen camera: projection/view matrices and world-to-screen mapping.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// Near clipping plane in world units.
pub const CAMERA_NEAR: f32 = 1.0;
/// Far clipping plane in world units.
pub const CAMERA_FAR: f32 = 25_000.0;

/// Axis-aligned viewport rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.size.x / self.size.y
    }
}

/// Main-screen camera state. Position is in world units (Z = altitude),
/// yaw is a compass-style bearing in degrees (0 looks along +Y, 90 along
/// +X), pitch in degrees tilts the view down for positive values. The FOV
/// is vertical, in degrees, and must stay inside (0, 180): the projection
/// is singular at 180.
///
/// Camera state is externally driven and sampled as-is each frame; no
/// smoothing happens here.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            fov: 60.0,
        }
    }
}

impl Camera {
    /// Perspective projection for the given viewport aspect ratio. Depth
    /// maps near to 0 and far to 1 (wgpu clip space). Rebuilt every frame
    /// from the current aspect; never cached across resizes.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        debug_assert!(self.fov > 0.0 && self.fov < 180.0, "fov out of (0, 180)");
        Mat4::perspective_rh(self.fov.to_radians(), aspect, CAMERA_NEAR, CAMERA_FAR)
    }

    /// World-to-view transform. The composition order is load-bearing:
    ///  1. 90° rotation about X, taking the renderer's Y-up convention to
    ///     the game world's Z-up;
    ///  2. a Z mirror to restore handedness after that rotation;
    ///  3. pitch about the lateral axis;
    ///  4. yaw about the vertical axis — the `- 180` folds the compass
    ///     bearing into a math angle together with the 90° offset that
    ///     aligns "forward" with the bearing;
    ///  5. translation by the negated camera position.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(90f32.to_radians())
            * Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0))
            * Mat4::from_rotation_x(-self.pitch.to_radians())
            * Mat4::from_rotation_z((self.yaw - 180.0).to_radians())
            * Mat4::from_translation(-self.position)
    }
}

/// Frame-scoped world-to-screen mapping. Built from the camera matrices and
/// the active viewport rectangle; pure math, no GPU state, so the HUD and
/// UI hit-testing can both use it.
#[derive(Debug, Clone, Copy)]
pub struct ScreenProjector {
    pub view: Mat4,
    pub projection: Mat4,
    pub rect: Rect,
}

impl ScreenProjector {
    pub fn new(camera: &Camera, rect: Rect) -> Self {
        Self {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(rect.aspect()),
            rect,
        }
    }

    /// Project a world point into viewport pixels. The returned Z is the
    /// camera-space depth (positive = in front of the camera), not NDC
    /// depth; callers use it to cull points behind the camera and to fade
    /// overlays with distance.
    pub fn world_to_screen(&self, world: Vec3) -> Vec3 {
        let view_pos = self.view * world.extend(1.0);
        let clip = self.projection * view_pos;
        let ndc = clip / clip.w;

        // Map [-1, 1] clip to [0, 1], flipping Y: screen Y grows downward.
        let x = ndc.x * 0.5 + 0.5;
        let y = ndc.y * 0.5 + 0.5;
        Vec3::new(
            self.rect.position.x + self.rect.size.x * x,
            self.rect.position.y + self.rect.size.y * (1.0 - y),
            -view_pos.z,
        )
    }

    /// Invert `world_to_screen`: a screen point plus its camera-space depth
    /// back to world space.
    pub fn screen_to_world(&self, screen: Vec3) -> Vec3 {
        let u = (screen.x - self.rect.position.x) / self.rect.size.x;
        let v = 1.0 - (screen.y - self.rect.position.y) / self.rect.size.y;
        let ndc = Vec2::new(u * 2.0 - 1.0, v * 2.0 - 1.0);

        let depth = screen.z;
        let view_pos = Vec3::new(
            ndc.x * depth / self.projection.x_axis.x,
            ndc.y * depth / self.projection.y_axis.y,
            -depth,
        );
        self.view.inverse().transform_point3(view_pos)
    }
}

/// Camera matrices for GPU upload. Shared by every pass that draws in world
/// space, so all draws in one frame agree on the camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }

    pub fn update(&mut self, projection: Mat4, view: Mat4) {
        self.projection = projection.to_cols_array_2d();
        self.view = view.to_cols_array_2d();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn ndc_depth(projection: Mat4, view_z: f32) -> f32 {
        let clip = projection * Vec4::new(0.0, 0.0, view_z, 1.0);
        clip.z / clip.w
    }

    #[test]
    fn projection_maps_near_to_zero_and_far_to_one() {
        let camera = Camera::default();
        let proj = camera.projection_matrix(800.0 / 600.0);
        assert!(ndc_depth(proj, -CAMERA_NEAR).abs() < 1e-5);
        assert!((ndc_depth(proj, -CAMERA_FAR) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn projection_finite_across_valid_fov_range() {
        for fov in [1.0, 60.0, 120.0, 179.0] {
            let camera = Camera {
                fov,
                ..Default::default()
            };
            let proj = camera.projection_matrix(1.0);
            assert!(proj.is_finite(), "projection not finite at fov {fov}");
        }
    }

    #[test]
    fn forward_point_projects_to_viewport_center() {
        // Camera at origin, yaw 0, pitch 0, FOV 60, viewport 800x600:
        // (0, 1000, 0) is dead ahead and lands at the exact center.
        let camera = Camera::default();
        let proj = ScreenProjector::new(&camera, Rect::new(0.0, 0.0, 800.0, 600.0));
        let screen = proj.world_to_screen(Vec3::new(0.0, 1000.0, 0.0));
        assert!((screen.x - 400.0).abs() < 1e-2);
        assert!((screen.y - 300.0).abs() < 1e-2);
        assert!((screen.z - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn point_behind_camera_has_negative_depth() {
        let camera = Camera::default();
        let proj = ScreenProjector::new(&camera, Rect::new(0.0, 0.0, 800.0, 600.0));
        let screen = proj.world_to_screen(Vec3::new(0.0, -1000.0, 0.0));
        assert!(screen.z < 0.0);
    }

    #[test]
    fn world_to_screen_respects_viewport_offset() {
        let camera = Camera::default();
        let proj = ScreenProjector::new(&camera, Rect::new(100.0, 50.0, 800.0, 600.0));
        let screen = proj.world_to_screen(Vec3::new(0.0, 1000.0, 0.0));
        assert!((screen.x - 500.0).abs() < 1e-2);
        assert!((screen.y - 350.0).abs() < 1e-2);
    }

    #[test]
    fn screen_round_trip_recovers_world_point() {
        let camera = Camera {
            position: Vec3::new(120.0, -340.0, 25.0),
            yaw: 37.0,
            pitch: 12.0,
            fov: 60.0,
        };
        let proj = ScreenProjector::new(&camera, Rect::new(0.0, 0.0, 1280.0, 720.0));

        // A point well in front of the camera, slightly off-axis.
        let forward = Vec2::new(37f32.to_radians().sin(), 37f32.to_radians().cos());
        let ahead = camera.position
            + Vec3::new(forward.x, forward.y, 0.0) * 2000.0
            + Vec3::new(150.0, -80.0, 40.0);

        let screen = proj.world_to_screen(ahead);
        assert!(screen.z > 0.0, "test point must be in front of the camera");

        let world = proj.screen_to_world(screen);
        assert!((world - ahead).length() < 0.1, "round trip drifted: {world:?}");
    }

    #[test]
    fn yaw_rotates_view_toward_bearing() {
        // Bearing 90 looks along +X.
        let camera = Camera {
            yaw: 90.0,
            ..Default::default()
        };
        let proj = ScreenProjector::new(&camera, Rect::new(0.0, 0.0, 800.0, 600.0));
        let screen = proj.world_to_screen(Vec3::new(1000.0, 0.0, 0.0));
        assert!((screen.x - 400.0).abs() < 1e-2);
        assert!(screen.z > 0.0);
    }
}

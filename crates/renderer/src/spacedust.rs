//! Space-dust field: motion-streak particles recycled around the ship.

use crate::camera::Rect;
use crate::pipeline::{create_spacedust_bind_group_layout, create_spacedust_pipeline};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use rand::Rng;
use wgpu::util::DeviceExt;

/// Number of dust streaks. Fixed at construction; the arena never grows.
pub const SPACEDUST_PARTICLE_COUNT: usize = 1024;

/// Dust farther than this from the dust center respawns.
const MAX_DUST_DIST: f32 = 500.0;
/// Dust closer than this respawns too, so streaks never sit on the camera.
const MIN_DUST_DIST: f32 = 100.0;

/// CPU side of the dust field. Two position entries per particle — the
/// endpoints of one streak — kept coincident; the shader separates them
/// with the per-vertex sign attribute. Separate from the GPU resources so
/// the recycling rules are testable headless.
pub struct DustSim {
    positions: Vec<Vec3>,
}

impl Default for DustSim {
    fn default() -> Self {
        Self::new()
    }
}

impl DustSim {
    /// All particles start at the origin and recycle on the first update.
    pub fn new() -> Self {
        Self {
            positions: vec![Vec3::ZERO; 2 * SPACEDUST_PARTICLE_COUNT],
        }
    }

    /// Recycle every pair that left the [min, max] shell around `center`.
    /// Returns whether anything moved, which is exactly when the GPU buffer
    /// needs a re-upload.
    pub fn update(&mut self, center: Vec3, rng: &mut impl Rng) -> bool {
        let mut changed = false;
        for n in (0..self.positions.len()).step_by(2) {
            let dist_sq = (self.positions[n] - center).length_squared();
            if dist_sq > MAX_DUST_DIST * MAX_DUST_DIST || dist_sq < MIN_DUST_DIST * MIN_DUST_DIST {
                changed = true;
                // Re-roll until the pair lands inside the shell; a visited
                // particle is never left outside it.
                let fresh = loop {
                    let p = center
                        + Vec3::new(
                            rng.gen_range(-MAX_DUST_DIST..MAX_DUST_DIST),
                            rng.gen_range(-MAX_DUST_DIST..MAX_DUST_DIST),
                            rng.gen_range(-MAX_DUST_DIST..MAX_DUST_DIST),
                        );
                    let d = (p - center).length_squared();
                    if (MIN_DUST_DIST * MIN_DUST_DIST..=MAX_DUST_DIST * MAX_DUST_DIST).contains(&d)
                    {
                        break p;
                    }
                };
                self.positions[n] = fresh;
                self.positions[n + 1] = fresh;
            }
        }
        changed
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DustUniform {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    velocity: [f32; 2],
    _pad: [f32; 2],
}

/// GPU side of the dust field. The sign buffer is written once at
/// construction and never touched again; the position buffer is re-uploaded
/// only on frames where the simulation recycled at least one pair.
pub struct SpacedustField {
    sim: DustSim,
    dirty: bool,
    position_buffer: wgpu::Buffer,
    sign_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    uploads: u64,
}

impl SpacedustField {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let layout = create_spacedust_bind_group_layout(device);
        let pipeline = create_spacedust_pipeline(device, config, &layout);

        let sim = DustSim::new();
        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Spacedust Position Buffer"),
            contents: bytemuck::cast_slice(sim.positions()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        // Alternating stream endpoints: -1 trails, +1 leads. Stable for the
        // buffer's whole lifetime.
        let signs: Vec<f32> = (0..2 * SPACEDUST_PARTICLE_COUNT)
            .map(|n| if n % 2 == 0 { -1.0 } else { 1.0 })
            .collect();
        let sign_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Spacedust Sign Buffer"),
            contents: bytemuck::cast_slice(&signs),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Spacedust Uniform"),
            contents: bytemuck::cast_slice(&[DustUniform {
                projection: Mat4::IDENTITY.to_cols_array_2d(),
                view: Mat4::IDENTITY.to_cols_array_2d(),
                velocity: [0.0; 2],
                _pad: [0.0; 2],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Spacedust Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            sim,
            dirty: false,
            position_buffer,
            sign_buffer,
            uniform_buffer,
            bind_group,
            pipeline,
            uploads: 0,
        }
    }

    /// Recycle dust around the current center (ship position on the game
    /// plane, or the camera when there is no ship).
    pub fn update(&mut self, center: Vec3, rng: &mut impl Rng) {
        if self.sim.update(center, rng) {
            self.dirty = true;
        }
    }

    /// Draw the streaks. Uploads positions only when the last update
    /// recycled something.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        rect: Rect,
        projection: Mat4,
        view: Mat4,
        velocity: Vec2,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[DustUniform {
                projection: projection.to_cols_array_2d(),
                view: view.to_cols_array_2d(),
                velocity: velocity.to_array(),
                _pad: [0.0; 2],
            }]),
        );
        if self.dirty {
            queue.write_buffer(
                &self.position_buffer,
                0,
                bytemuck::cast_slice(self.sim.positions()),
            );
            self.uploads += 1;
            self.dirty = false;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Spacedust Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_viewport(
            rect.position.x,
            rect.position.y,
            rect.size.x,
            rect.size.y,
            0.0,
            1.0,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.position_buffer.slice(..));
        pass.set_vertex_buffer(1, self.sign_buffer.slice(..));
        pass.draw(0..(2 * SPACEDUST_PARTICLE_COUNT) as u32, 0..1);
    }

    /// How many times the position buffer has been uploaded.
    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(7)
    }

    #[test]
    fn first_update_recycles_everything_into_the_shell() {
        let mut sim = DustSim::new();
        let mut rng = rng();
        let center = Vec3::new(1000.0, -2000.0, 0.0);
        assert!(sim.update(center, &mut rng), "zeroed field must recycle");
        for p in sim.positions() {
            let d = (*p - center).length();
            assert!((MIN_DUST_DIST..=MAX_DUST_DIST).contains(&d), "dust at distance {d}");
        }
    }

    #[test]
    fn settled_field_reports_no_change() {
        let mut sim = DustSim::new();
        let mut rng = rng();
        let center = Vec3::ZERO;
        assert!(sim.update(center, &mut rng));
        // Center unchanged: everything is inside the shell, nothing to do.
        assert!(!sim.update(center, &mut rng));
        assert!(!sim.update(center, &mut rng));
    }

    #[test]
    fn moving_center_far_recycles_again() {
        let mut sim = DustSim::new();
        let mut rng = rng();
        sim.update(Vec3::ZERO, &mut rng);
        let far = Vec3::new(10_000.0, 0.0, 0.0);
        assert!(sim.update(far, &mut rng));
        for p in sim.positions() {
            let d = (*p - far).length();
            assert!((MIN_DUST_DIST..=MAX_DUST_DIST).contains(&d));
        }
    }

    #[test]
    fn pair_endpoints_stay_coincident() {
        let mut sim = DustSim::new();
        let mut rng = rng();
        sim.update(Vec3::new(50.0, 60.0, 0.0), &mut rng);
        for pair in sim.positions().chunks_exact(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }

    #[test]
    fn particle_count_is_fixed() {
        let sim = DustSim::new();
        assert_eq!(sim.positions().len(), 2 * SPACEDUST_PARTICLE_COUNT);
    }
}

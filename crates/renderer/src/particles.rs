//! Engine-trail particle engine: transient billboards spawned by ship
//! drives and drawn additively.

use crate::camera::Rect;
use crate::pipeline::{create_particle_bind_group_layout, create_particle_pipeline};
use crate::vertex::ParticleInstance;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

/// Particle arena capacity. When full, the oldest spawn is recycled.
pub const MAX_PARTICLES: usize = 2048;

#[derive(Debug, Clone, Copy)]
struct Particle {
    start_pos: Vec3,
    end_pos: Vec3,
    start_color: Vec3,
    end_color: Vec3,
    scale: f32,
    /// Seconds since spawn; negative while the start delay runs down.
    age: f32,
    lifetime: f32,
}

/// CPU particle state: spawning, aging, and per-frame instance building.
/// Kept apart from the GPU resources so emission logic tests run headless.
#[derive(Default)]
pub struct ParticleSim {
    particles: Vec<Particle>,
    cursor: usize,
}

impl ParticleSim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one particle. `start_time` delays its appearance; position and
    /// color interpolate from start to end over `lifetime` seconds.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        start_pos: Vec3,
        end_pos: Vec3,
        start_color: Vec3,
        end_color: Vec3,
        scale: f32,
        start_time: f32,
        lifetime: f32,
    ) {
        let particle = Particle {
            start_pos,
            end_pos,
            start_color,
            end_color,
            scale,
            age: -start_time,
            lifetime,
        };
        if self.particles.len() < MAX_PARTICLES {
            self.particles.push(particle);
        } else {
            self.particles[self.cursor] = particle;
            self.cursor = (self.cursor + 1) % MAX_PARTICLES;
        }
    }

    /// Age everything and drop expired particles.
    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.age += dt;
        }
        self.particles.retain(|p| p.age < p.lifetime);
        self.cursor = self.cursor.min(self.particles.len().saturating_sub(1));
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Billboard instances for the current frame. Particles travel from
    /// start to end, swell as they age, and fade out.
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.particles
            .iter()
            .filter(|p| p.age >= 0.0)
            .map(|p| {
                let t = (p.age / p.lifetime).clamp(0.0, 1.0);
                let pos = p.start_pos.lerp(p.end_pos, t);
                let color = p.start_color.lerp(p.end_color, t);
                ParticleInstance {
                    position: pos.to_array(),
                    size: p.scale * (0.5 + 0.5 * t),
                    color: [color.x, color.y, color.z, 1.0 - t],
                }
            })
            .collect()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ParticleUniform {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
}

/// GPU half of the particle engine.
pub struct ParticleEngine {
    pub sim: ParticleSim,
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl ParticleEngine {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let layout = create_particle_bind_group_layout(device);
        let pipeline = create_particle_pipeline(device, config, &layout);
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Instance Buffer"),
            size: (std::mem::size_of::<ParticleInstance>() * MAX_PARTICLES) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniform"),
            contents: bytemuck::cast_slice(&[ParticleUniform {
                projection: Mat4::IDENTITY.to_cols_array_2d(),
                view: Mat4::IDENTITY.to_cols_array_2d(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        Self {
            sim: ParticleSim::new(),
            instance_buffer,
            uniform_buffer,
            bind_group,
            pipeline,
        }
    }

    /// See [`ParticleSim::spawn`].
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        start_pos: Vec3,
        end_pos: Vec3,
        start_color: Vec3,
        end_color: Vec3,
        scale: f32,
        start_time: f32,
        lifetime: f32,
    ) {
        self.sim
            .spawn(start_pos, end_pos, start_color, end_color, scale, start_time, lifetime);
    }

    pub fn update(&mut self, dt: f32) {
        self.sim.update(dt);
    }

    /// Draw all live particles with the given camera matrices.
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
    ) {
        let instances = self.sim.instances();
        if instances.is_empty() {
            return;
        }
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[ParticleUniform {
                projection: projection.to_cols_array_2d(),
                view: view.to_cols_array_2d(),
            }]),
        );
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Particle Pass"),
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
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..4, 0..instances.len() as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_caps_at_arena_capacity() {
        let mut sim = ParticleSim::new();
        for _ in 0..MAX_PARTICLES + 100 {
            sim.spawn(Vec3::ZERO, Vec3::ZERO, Vec3::ONE, Vec3::ONE, 1.0, 0.0, 5.0);
        }
        assert_eq!(sim.len(), MAX_PARTICLES);
    }

    #[test]
    fn update_retires_expired_particles() {
        let mut sim = ParticleSim::new();
        sim.spawn(Vec3::ZERO, Vec3::ZERO, Vec3::ONE, Vec3::ONE, 1.0, 0.0, 1.0);
        sim.spawn(Vec3::ZERO, Vec3::ZERO, Vec3::ONE, Vec3::ONE, 1.0, 0.0, 5.0);
        sim.update(2.0);
        assert_eq!(sim.len(), 1);
        sim.update(10.0);
        assert!(sim.is_empty());
    }

    #[test]
    fn instances_interpolate_position_over_life() {
        let mut sim = ParticleSim::new();
        sim.spawn(
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::ONE,
            Vec3::ONE,
            2.0,
            0.0,
            2.0,
        );
        sim.update(1.0);
        let instances = sim.instances();
        assert_eq!(instances.len(), 1);
        assert!((instances[0].position[0] - 5.0).abs() < 1e-4);
        assert!((instances[0].color[3] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn delayed_particles_stay_invisible_until_due() {
        let mut sim = ParticleSim::new();
        sim.spawn(Vec3::ZERO, Vec3::ZERO, Vec3::ONE, Vec3::ONE, 1.0, 1.0, 5.0);
        assert!(sim.instances().is_empty());
        sim.update(1.5);
        assert_eq!(sim.instances().len(), 1);
    }
}

//! Targeting reticle: a billboard drawn over the locked target.

use crate::camera::Rect;
use crate::pipeline::{create_billboard_bind_group_layout, create_billboard_pipeline};
use crate::texture::TextureCache;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BillboardUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

/// Draws the weapons-lock marker. Its pass carries no depth attachment, so
/// the marker is always visible through hulls.
pub struct ReticleRenderer {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    cache: TextureCache,
    /// Built on first draw, once the reticle texture is resolved.
    bind_group: Option<wgpu::BindGroup>,
}

impl ReticleRenderer {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = create_billboard_bind_group_layout(device);
        let pipeline = create_billboard_pipeline(device, config, camera_layout, &layout);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Billboard Uniform"),
            contents: bytemuck::cast_slice(&[BillboardUniform {
                model: Mat4::IDENTITY.to_cols_array_2d(),
                color: [0.5, 0.5, 0.5, 1.0],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            pipeline,
            layout,
            uniform_buffer,
            cache: TextureCache::new(),
            bind_group: None,
        }
    }

    /// Draw the reticle centered on the target's world position.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        rect: Rect,
        camera_bind_group: &wgpu::BindGroup,
        position: Vec2,
        radius: f32,
    ) {
        if self.bind_group.is_none() {
            let texture = self.cache.get_or_load(device, queue, "reticle.png");
            self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Reticle Bind Group"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
            }));
        }
        let Some(bind_group) = &self.bind_group else {
            return;
        };

        let model = Mat4::from_translation(Vec3::new(position.x, position.y, 0.0));
        // The alpha slot deliberately carries the billboard half-size
        // (target radius x 2.5); the shader reads it as world units, never
        // as opacity.
        let color = [0.5, 0.5, 0.5, radius * 2.5];
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[BillboardUniform {
                model: model.to_cols_array_2d(),
                color,
            }]),
        );

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Reticle Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
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
        pass.set_bind_group(0, camera_bind_group, &[]);
        pass.set_bind_group(1, bind_group, &[]);
        pass.draw(0..4, 0..1);
    }
}

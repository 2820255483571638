//! Starfield backdrop: global cubemap blended with a zone-local one.

use crate::camera::Rect;
use crate::pipeline::{create_starbox_bind_group_layout, create_starbox_pipeline};
use crate::texture::CubemapCache;
use bytemuck::{Pod, Zeroable};
use engine_core::{distance_to_edge, inside_polygon, Transform, Zone};
use glam::{Mat4, Vec2};
use wgpu::util::DeviceExt;

/// Uniform block for the starbox shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct StarboxUniform {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    box_lerp: f32,
    scale: f32,
    _pad: [f32; 2],
}

/// Pick the local skybox for the camera's ground position.
///
/// Scans zones in query order; the first zone carrying a skybox whose
/// outline contains the camera wins — overlapping zones are not expected,
/// so there is no further priority. Returns the cache key and the blend
/// factor: 1.0 when the zone has no fade distance, otherwise the camera's
/// distance to the zone edge over the fade distance, clamped to [0, 1].
/// With no matching zone the global skybox comes back with factor 0.
pub fn select_local_skybox<'a>(
    zones: impl IntoIterator<Item = (&'a Zone, &'a Transform)>,
    camera_ground: Vec2,
    global_name: &str,
) -> (String, f32) {
    for (zone, transform) in zones {
        if zone.skybox.is_empty() {
            continue;
        }
        let pos = camera_ground - transform.position();
        if inside_polygon(&zone.outline, pos) {
            let factor = if zone.skybox_fade_distance <= 0.0 {
                1.0
            } else {
                (distance_to_edge(&zone.outline, pos) / zone.skybox_fade_distance).clamp(0.0, 1.0)
            };
            return (format!("skybox/{}", zone.skybox), factor);
        }
    }
    (global_name.to_string(), 0.0)
}

/// Draws the background cube. Owns its cubemap cache, the fixed cube
/// geometry (built once), and a pipeline with depth writes disabled so the
/// backdrop always reads as infinitely far away.
pub struct SkyboxRenderer {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    cache: CubemapCache,
    /// Names the current bind group was built from; rebuilt on change.
    bound: Option<(String, String)>,
    bind_group: Option<wgpu::BindGroup>,
}

impl SkyboxRenderer {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let layout = create_starbox_bind_group_layout(device);
        let pipeline = create_starbox_pipeline(device, config, &layout);

        // Unit cube: 8 corners, 12 triangles, wound to face inward.
        let positions: [[f32; 3]; 8] = [
            [-1.0, -1.0, -1.0], // 0
            [-1.0, -1.0, 1.0],  // 1
            [-1.0, 1.0, -1.0],  // 2
            [-1.0, 1.0, 1.0],   // 3
            [1.0, -1.0, -1.0],  // 4
            [1.0, -1.0, 1.0],   // 5
            [1.0, 1.0, -1.0],   // 6
            [1.0, 1.0, 1.0],    // 7
        ];
        #[rustfmt::skip]
        let indices: [u16; 36] = [
            2, 6, 4, 4, 0, 2, // back
            3, 2, 0, 0, 1, 3, // left
            6, 7, 5, 5, 4, 6, // right
            7, 3, 1, 1, 5, 7, // front
            6, 2, 3, 3, 7, 6, // top
            0, 4, 5, 5, 1, 0, // bottom
        ];

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Starbox Vertex Buffer"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Starbox Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Starbox Uniform"),
            contents: bytemuck::cast_slice(&[StarboxUniform {
                projection: Mat4::IDENTITY.to_cols_array_2d(),
                view: Mat4::IDENTITY.to_cols_array_2d(),
                box_lerp: 0.0,
                scale: 100.0,
                _pad: [0.0; 2],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Starbox Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            layout,
            uniform_buffer,
            sampler,
            vertex_buffer,
            index_buffer,
            cache: CubemapCache::new(),
            bound: None,
            bind_group: None,
        }
    }

    /// Draw the backdrop. First pass of the frame: clears color and depth.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        rect: Rect,
        projection: Mat4,
        view: Mat4,
        global_name: &str,
        local_name: &str,
        box_lerp: f32,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[StarboxUniform {
                projection: projection.to_cols_array_2d(),
                view: view.to_cols_array_2d(),
                box_lerp,
                scale: 100.0,
                _pad: [0.0; 2],
            }]),
        );

        // Resolve both cubemaps through the cache (a miss loads
        // synchronously) and rebuild the bind group when the pair changes.
        let wanted = (global_name.to_string(), local_name.to_string());
        if self.bound.as_ref() != Some(&wanted) {
            self.cache.get_or_load(device, queue, global_name);
            self.cache.get_or_load(device, queue, local_name);
            let (Some(global), Some(local)) =
                (self.cache.get(global_name), self.cache.get(local_name))
            else {
                return;
            };
            self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Starbox Bind Group"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&global.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&local.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            }));
            self.bound = Some(wanted);
        }
        let Some(bind_group) = &self.bind_group else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Starbox Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
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
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..36, 0, 0..1);
    }

    /// Cached cubemap count, for diagnostics.
    pub fn cached_cubemaps(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(skybox: &str, fade: f32, half: f32) -> Zone {
        Zone {
            outline: vec![
                Vec2::new(-half, -half),
                Vec2::new(half, -half),
                Vec2::new(half, half),
                Vec2::new(-half, half),
            ],
            skybox: skybox.to_string(),
            skybox_fade_distance: fade,
        }
    }

    #[test]
    fn no_matching_zone_keeps_global_with_zero_factor() {
        let zones = vec![(zone("nebula", 100.0, 50.0), Transform::new(Vec2::new(1000.0, 0.0)))];
        let iter = zones.iter().map(|(z, t)| (z, t));
        let (name, factor) = select_local_skybox(iter, Vec2::ZERO, "skybox/default");
        assert_eq!(name, "skybox/default");
        assert_eq!(factor, 0.0);
    }

    #[test]
    fn zone_without_fade_distance_blends_fully() {
        let zones = vec![(zone("nebula", 0.0, 500.0), Transform::new(Vec2::ZERO))];
        let iter = zones.iter().map(|(z, t)| (z, t));
        let (name, factor) = select_local_skybox(iter, Vec2::new(10.0, 10.0), "skybox/default");
        assert_eq!(name, "skybox/nebula");
        assert_eq!(factor, 1.0);
    }

    #[test]
    fn fade_factor_is_edge_distance_over_fade_distance() {
        // Camera 100 from the nearest edge, fade distance 400 -> 0.25.
        let zones = vec![(zone("nebula", 400.0, 500.0), Transform::new(Vec2::ZERO))];
        let iter = zones.iter().map(|(z, t)| (z, t));
        let (_, factor) = select_local_skybox(iter, Vec2::new(400.0, 0.0), "skybox/default");
        assert!((factor - 0.25).abs() < 1e-5);
    }

    #[test]
    fn fade_factor_clamps_deep_inside() {
        let zones = vec![(zone("nebula", 100.0, 500.0), Transform::new(Vec2::ZERO))];
        let iter = zones.iter().map(|(z, t)| (z, t));
        let (_, factor) = select_local_skybox(iter, Vec2::ZERO, "skybox/default");
        assert_eq!(factor, 1.0);
    }

    #[test]
    fn first_matching_zone_wins() {
        let zones = vec![
            (zone("first", 0.0, 500.0), Transform::new(Vec2::ZERO)),
            (zone("second", 0.0, 500.0), Transform::new(Vec2::ZERO)),
        ];
        let iter = zones.iter().map(|(z, t)| (z, t));
        let (name, _) = select_local_skybox(iter, Vec2::ZERO, "skybox/default");
        assert_eq!(name, "skybox/first");
    }

    #[test]
    fn zones_without_skybox_are_skipped() {
        let zones = vec![
            (zone("", 0.0, 500.0), Transform::new(Vec2::ZERO)),
            (zone("nebula", 0.0, 500.0), Transform::new(Vec2::ZERO)),
        ];
        let iter = zones.iter().map(|(z, t)| (z, t));
        let (name, _) = select_local_skybox(iter, Vec2::ZERO, "skybox/default");
        assert_eq!(name, "skybox/nebula");
    }

    #[test]
    fn zone_containment_is_relative_to_zone_transform() {
        let zones = vec![(zone("nebula", 0.0, 50.0), Transform::new(Vec2::new(1000.0, 0.0)))];
        let iter = zones.iter().map(|(z, t)| (z, t));
        let (name, _) = select_local_skybox(iter, Vec2::new(1010.0, 0.0), "skybox/default");
        assert_eq!(name, "skybox/nebula");
    }
}

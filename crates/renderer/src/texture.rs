//! Textures, cubemaps, and the by-name resource caches.
//!
//! Caches are explicitly owned objects (no ambient globals). Entries are
//! created on first reference and live for the process lifetime; a cache
//! miss is not an error, it triggers a synchronous load. Missing asset
//! files fall back to procedurally generated images so the simulator runs
//! without shipped art.

use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Texture load failures. Only surfaced when an asset file exists but is
/// unreadable; absent files silently use the procedural fallback.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// A 2D texture with its view and sampler.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create the depth buffer for the main surface.
    pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor::default());
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Create an RGBA texture from raw pixels.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Load an RGBA texture from a PNG/JPEG file.
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> Result<Self, TextureError> {
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let img = image::load_from_memory(&bytes)
            .map_err(|source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (w, h) = img.dimensions();
        Ok(Self::from_rgba(
            device,
            queue,
            &img,
            w,
            h,
            &path.display().to_string(),
        ))
    }
}

/// A cubemap texture sampled by direction, used for the starfield backdrop.
pub struct CubemapTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Face order matches wgpu array layers: +X, -X, +Y, -Y, +Z, -Z.
const CUBE_FACES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];
const CUBE_FACE_SIZE: u32 = 512;

impl CubemapTexture {
    /// Load the six faces from `assets/<name>/<face>.png`. Any missing or
    /// unreadable face switches the whole cubemap to a starfield generated
    /// deterministically from the name.
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, name: &str) -> Self {
        let mut faces: Vec<Vec<u8>> = Vec::with_capacity(6);
        let mut size = 0u32;
        let mut from_disk = true;
        for face in CUBE_FACES {
            let path = PathBuf::from("assets").join(name).join(format!("{face}.png"));
            match std::fs::read(&path)
                .ok()
                .and_then(|bytes| image::load_from_memory(&bytes).ok())
            {
                Some(img) => {
                    let img = img.to_rgba8();
                    let (w, h) = img.dimensions();
                    if size == 0 {
                        size = w.min(h);
                    }
                    if w != size || h != size {
                        log::warn!("cubemap face {path:?} is {w}x{h}, expected {size}x{size}");
                        from_disk = false;
                        break;
                    }
                    faces.push(img.into_raw());
                }
                None => {
                    from_disk = false;
                    break;
                }
            }
        }

        if !from_disk {
            log::info!("generating starfield cubemap for '{name}'");
            size = CUBE_FACE_SIZE;
            faces = (0..6u32)
                .map(|face| generate_starfield_face(name, face, size))
                .collect();
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, pixels) in faces.iter().enumerate() {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                pixels,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(size * 4),
                    rows_per_image: Some(size),
                },
                wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
            );
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        Self { texture, view }
    }
}

fn seed_for(name: &str, face: u32) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    face.hash(&mut hasher);
    hasher.finish()
}

/// One starfield face: near-black space with seeded star points and a faint
/// color wash so different skybox names are visually distinct.
fn generate_starfield_face(name: &str, face: u32, size: u32) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed_for(name, face));
    let mut tint_rng = rand::rngs::StdRng::seed_from_u64(seed_for(name, 6));
    let wash = [
        tint_rng.gen_range(2..14u8),
        tint_rng.gen_range(2..14u8),
        tint_rng.gen_range(6..20u8),
    ];

    let mut pixels = vec![0u8; (size * size * 4) as usize];
    for px in pixels.chunks_exact_mut(4) {
        px[0] = wash[0];
        px[1] = wash[1];
        px[2] = wash[2];
        px[3] = 255;
    }

    let star_count = (size * size) / 400;
    for _ in 0..star_count {
        let x = rng.gen_range(0..size);
        let y = rng.gen_range(0..size);
        let brightness: u8 = rng.gen_range(90..=255);
        let warm = rng.gen_range(0..20u8);
        let idx = ((y * size + x) * 4) as usize;
        pixels[idx] = brightness;
        pixels[idx + 1] = brightness.saturating_sub(warm / 2);
        pixels[idx + 2] = brightness.saturating_sub(warm);
        pixels[idx + 3] = 255;
    }
    pixels
}

/// Reticle fallback: a transparent quad with an anti-aliased ring and four
/// tick marks.
pub fn generate_reticle_pixels(size: u32) -> Vec<u8> {
    let mut pixels = vec![0u8; (size * size * 4) as usize];
    let center = size as f32 * 0.5;
    let radius = size as f32 * 0.42;
    let thickness = size as f32 * 0.03;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let dist = (dx * dx + dy * dy).sqrt();
            let ring = 1.0 - ((dist - radius).abs() - thickness).max(0.0) / thickness;
            // Tick marks on the four cardinal directions.
            let tick = if dx.abs() < thickness || dy.abs() < thickness {
                let d = dist - radius;
                if (-(size as f32) * 0.08..0.0).contains(&d) {
                    1.0
                } else {
                    0.0
                }
            } else {
                0.0
            };
            let alpha = ring.max(tick).clamp(0.0, 1.0);
            let idx = ((y * size + x) * 4) as usize;
            pixels[idx] = 255;
            pixels[idx + 1] = 255;
            pixels[idx + 2] = 255;
            pixels[idx + 3] = (alpha * 255.0) as u8;
        }
    }
    pixels
}

/// By-name cache of 2D textures. At most one GPU resource per name.
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<String, Texture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a texture, loading `assets/<name>` on first reference. A
    /// missing reticle asset generates the built-in ring.
    pub fn get_or_load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
    ) -> &Texture {
        self.textures.entry(name.to_string()).or_insert_with(|| {
            let path = PathBuf::from("assets").join(name);
            match Texture::from_path(device, queue, &path) {
                Ok(t) => t,
                Err(e) => {
                    log::info!("generating fallback for texture '{name}': {e}");
                    let size = 128;
                    Texture::from_rgba(device, queue, &generate_reticle_pixels(size), size, size, name)
                }
            }
        })
    }
}

/// By-name cache of cubemap textures. Insert-only, process lifetime; skybox
/// names are few and reused constantly, so no eviction.
#[derive(Default)]
pub struct CubemapCache {
    cubemaps: HashMap<String, CubemapTexture>,
}

impl CubemapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
    ) -> &CubemapTexture {
        self.cubemaps
            .entry(name.to_string())
            .or_insert_with(|| CubemapTexture::load(device, queue, name))
    }

    /// Already-loaded cubemap, if any.
    pub fn get(&self, name: &str) -> Option<&CubemapTexture> {
        self.cubemaps.get(name)
    }

    /// Number of cached cubemaps (one GPU resource per distinct name).
    pub fn len(&self) -> usize {
        self.cubemaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubemaps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starfield_faces_are_deterministic_per_name() {
        let a = generate_starfield_face("skybox/nebula", 0, 64);
        let b = generate_starfield_face("skybox/nebula", 0, 64);
        let c = generate_starfield_face("skybox/default", 0, 64);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn reticle_ring_is_transparent_at_center_and_opaque_on_ring() {
        let size = 128u32;
        let pixels = generate_reticle_pixels(size);
        let center_idx = ((size / 2 * size + size / 2) * 4 + 3) as usize;
        assert_eq!(pixels[center_idx], 0, "reticle center must be transparent");
        let ring_x = (size as f32 * 0.5 + size as f32 * 0.42) as u32;
        let ring_idx = ((size / 2 * size + ring_x) * 4 + 3) as usize;
        assert!(pixels[ring_idx] > 200, "ring must be nearly opaque");
    }
}

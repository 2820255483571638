//! Main-screen 3D rendering for OpenBridge, built on wgpu.
//!
//! One frame walks a fixed pass order: skybox (clears color and depth),
//! ship hulls, engine particles, space dust, targeting reticle, then the
//! screen-space text overlay. Every pass declares its own depth/blend/cull
//! state at pipeline creation, so inter-pass ordering is the only contract.

pub mod camera;
pub mod mesh;
pub mod particles;
pub mod pipeline;
pub mod renderer;
pub mod reticle;
pub mod skybox;
pub mod spacedust;
pub mod texture;
pub mod vertex;

pub use camera::*;
pub use mesh::*;
pub use particles::*;
pub use renderer::*;
pub use reticle::*;
pub use skybox::*;
pub use spacedust::*;
pub use texture::*;
pub use vertex::*;

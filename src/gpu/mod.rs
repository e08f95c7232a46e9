//! GPU resource management utilities.
//!
//! Provides wgpu device initialization, proxy buffer upload, offscreen
//! render targets, and shader composition.

/// Shared wgpu boilerplate for the picking pipelines.
pub mod pipeline_helpers;
/// Vertex buffers backing uploaded proxy sets.
pub mod proxy_buffers;
/// wgpu device and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Offscreen render-target textures.
pub mod texture;

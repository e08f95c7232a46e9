//! GPU picking: proxies rendered to an offscreen id buffer and read back.
//!
//! [`GpuPicker`] owns the targets, pipelines and staging buffers.
//! [`GpuViewport`] pairs it with a camera and cursor and implements
//! [`PickViewport`].

mod pipeline;
mod readback;

use glam::{UVec2, Vec2, Vec3};
use web_time::Instant;

pub use self::pipeline::PickPipelines;
use self::pipeline::{DEPTH_STENCIL_FORMAT, DEPTH_VALUE_FORMAT, ID_FORMAT, POINT_STENCIL};
use self::readback::{padded_bytes_per_row, PixelReadback, TileRing, DEPTH_TEXEL_OFFSET};
use crate::camera::core::{ndc_to_pixel, pixel_to_ndc, Camera, PickUniform};
use crate::codec::PickId;
use crate::error::SnapPickError;
use crate::gpu::proxy_buffers::ProxyBuffers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::gpu::texture::RenderTarget;
use crate::options::Options;
use crate::proxy::{ProxyGeometry, ProxySet};
use crate::snap::PlaneSnap;
use crate::viewport::{PickHit, PickViewport, TileReadback, TileRequest};

/// Staging buffers available for nearby tiles at once.
const TILE_SLOTS: usize = 3;

/// Uniform buffer plus the bind group that exposes it.
struct UniformBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size_of::<PickUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

struct Targets {
    ids: RenderTarget,
    depth_values: RenderTarget,
    depth_stencil: RenderTarget,
    nearby: RenderTarget,
}

impl Targets {
    fn new(device: &wgpu::Device, size: UVec2) -> Self {
        Self {
            ids: RenderTarget::new(device, "Pick Id Target", size, ID_FORMAT),
            depth_values: RenderTarget::new(
                device,
                "Pick Depth Value Target",
                size,
                DEPTH_VALUE_FORMAT,
            ),
            depth_stencil: RenderTarget::new(
                device,
                "Pick Depth Stencil",
                size,
                DEPTH_STENCIL_FORMAT,
            ),
            nearby: RenderTarget::new(device, "Nearby Id Target", size, ID_FORMAT),
        }
    }
}

/// Offscreen picking renderer.
pub struct GpuPicker {
    pipelines: PickPipelines,
    targets: Targets,
    size: UVec2,
    pick_uniform: UniformBinding,
    nearby_uniform: UniformBinding,
    pixel: PixelReadback,
    tiles: TileRing,
    /// Whether the depth buffer holds the last full pick pass.
    depth_valid: bool,
}

impl GpuPicker {
    /// Build pipelines and targets of `size` physical pixels.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Shader`] if a picking shader fails to
    /// compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        size: UVec2,
    ) -> Result<Self, SnapPickError> {
        let pipelines = PickPipelines::new(context, composer)?;
        let device = &context.device;
        let pick_uniform =
            UniformBinding::new(device, &pipelines.uniform_layout, "Pick Uniform");
        let nearby_uniform =
            UniformBinding::new(device, &pipelines.uniform_layout, "Nearby Uniform");
        Ok(Self {
            targets: Targets::new(device, size),
            size,
            pick_uniform,
            nearby_uniform,
            pixel: PixelReadback::new(device),
            tiles: TileRing::new(TILE_SLOTS),
            depth_valid: false,
            pipelines,
        })
    }

    /// Recreate the targets for a new size. In-flight tiles are abandoned.
    pub fn resize(&mut self, device: &wgpu::Device, size: UVec2) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.targets = Targets::new(device, size);
        self.tiles.clear();
        self.depth_valid = false;
    }

    /// Render `layers` and read back the id and depth at `pixel`.
    ///
    /// Returns `None` for background. Blocks until the GPU finishes.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Readback`] if the staging buffer cannot be
    /// mapped.
    pub fn pick(
        &mut self,
        context: &RenderContext,
        uniform: &PickUniform,
        pixel: UVec2,
        layers: &[&ProxySet],
    ) -> Result<Option<(PickId, f32)>, SnapPickError> {
        if pixel.x >= self.size.x || pixel.y >= self.size.y {
            return Ok(None);
        }
        context
            .queue
            .write_buffer(&self.pick_uniform.buffer, 0, bytemuck::bytes_of(uniform));

        let mut encoder = context.create_encoder("Pick Encoder");
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Pick Pass"),
                color_attachments: &[
                    Some(clear_attachment(&self.targets.ids.view, 0.0)),
                    Some(clear_attachment(&self.targets.depth_values.view, 1.0)),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_stencil.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.pick_uniform.bind_group, &[]);
            pass.set_stencil_reference(POINT_STENCIL);
            draw_layers(&mut pass, &self.pipelines, layers);
        }

        for (texture, offset) in [
            (&self.targets.ids.texture, 0),
            (&self.targets.depth_values.texture, DEPTH_TEXEL_OFFSET),
        ] {
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x: pixel.x, y: pixel.y, z: 0 },
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &self.pixel.buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset,
                        bytes_per_row: Some(padded_bytes_per_row(1)),
                        rows_per_image: Some(1),
                    },
                },
                wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
            );
        }
        context.submit(encoder);
        self.depth_valid = true;

        let started = Instant::now();
        let (raw, depth) = self.pixel.read(&context.device)?;
        log::trace!("pick readback took {:?}", started.elapsed());
        let id = PickId::from_raw(raw);
        Ok((!id.is_none()).then_some((id, depth)))
    }

    /// Render point proxies into the tile and start an asynchronous
    /// readback. Returns `false` when every staging slot is busy.
    pub fn request_tile(
        &mut self,
        context: &RenderContext,
        uniform: &PickUniform,
        request: TileRequest<'_>,
    ) -> bool {
        let rect = request.rect;
        if rect.x + rect.width > self.size.x || rect.y + rect.height > self.size.y {
            return false;
        }
        let Some((slot, buffer)) = self.tiles.acquire(&context.device, rect) else {
            return false;
        };
        context
            .queue
            .write_buffer(&self.nearby_uniform.buffer, 0, bytemuck::bytes_of(uniform));

        let mut encoder = context.create_encoder("Nearby Encoder");
        {
            // Without a prior pick the depth buffer is cleared instead of
            // loaded.
            let depth_ops = (!self.depth_valid).then_some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Discard,
            });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Nearby Pass"),
                color_attachments: &[Some(clear_attachment(&self.targets.nearby.view, 0.0))],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_stencil.view,
                    depth_ops,
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
            pass.set_pipeline(&self.pipelines.nearby_points);
            pass.set_bind_group(0, &self.nearby_uniform.bind_group, &[]);
            for buffers in live_buffers(request.points) {
                if let Some(points) = &buffers.points {
                    pass.set_vertex_buffer(0, points.buffer.slice(..));
                    pass.draw(0..6, 0..points.count);
                }
            }
        }
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.targets.nearby.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: rect.x, y: rect.y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row(rect.width)),
                    rows_per_image: Some(rect.height),
                },
            },
            wgpu::Extent3d {
                width: rect.width,
                height: rect.height,
                depth_or_array_layers: 1,
            },
        );
        context.submit(encoder);
        self.tiles.start(slot, request.ticket, rect);
        true
    }

    /// Completed tile readbacks, without blocking.
    pub fn poll_tiles(&mut self, device: &wgpu::Device) -> Vec<TileReadback> {
        self.tiles.harvest(device)
    }
}

fn clear_attachment(
    view: &wgpu::TextureView,
    value: f64,
) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color {
                r: value,
                g: 0.0,
                b: 0.0,
                a: 0.0,
            }),
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    }
}

fn live_buffers<'a>(layers: &'a [&'a ProxySet]) -> impl Iterator<Item = &'a ProxyBuffers> + 'a {
    layers
        .iter()
        .filter(|set| !set.is_disposed())
        .filter_map(|set| set.gpu())
}

/// Draw every layer by primitive kind: meshes, planes, points, then lines.
fn draw_layers(pass: &mut wgpu::RenderPass<'_>, pipelines: &PickPipelines, layers: &[&ProxySet]) {
    pass.set_pipeline(&pipelines.mesh);
    for buffers in live_buffers(layers) {
        if let Some(triangles) = &buffers.triangles {
            pass.set_vertex_buffer(0, triangles.buffer.slice(..));
            pass.draw(0..triangles.count, 0..1);
        }
    }
    pass.set_pipeline(&pipelines.planes);
    for buffers in live_buffers(layers) {
        if let Some(planes) = &buffers.planes {
            pass.set_vertex_buffer(0, planes.buffer.slice(..));
            pass.draw(0..6, 0..planes.count);
        }
    }
    pass.set_pipeline(&pipelines.points);
    for buffers in live_buffers(layers) {
        if let Some(points) = &buffers.points {
            pass.set_vertex_buffer(0, points.buffer.slice(..));
            pass.draw(0..6, 0..points.count);
        }
    }
    pass.set_pipeline(&pipelines.lines);
    for buffers in live_buffers(layers) {
        if let Some(lines) = &buffers.lines {
            pass.set_vertex_buffer(0, lines.buffer.slice(..));
            pass.draw(0..6, 0..lines.count);
        }
    }
}

/// [`PickViewport`] backed by a real GPU.
///
/// Only proxy sets uploaded through this viewport are drawn; sets without
/// GPU buffers are skipped.
pub struct GpuViewport {
    context: RenderContext,
    picker: GpuPicker,
    camera: Camera,
    size: UVec2,
    dpr: f32,
    construction_plane: PlaneSnap,
    cursor: Vec2,
    point_size: f32,
    line_width: f32,
    plane_half_size: f32,
}

impl GpuViewport {
    /// Viewport of `size` physical pixels on `context`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Shader`] if a picking shader fails to
    /// compose.
    pub fn new(
        context: RenderContext,
        options: &Options,
        camera: Camera,
        size: UVec2,
    ) -> Result<Self, SnapPickError> {
        let mut composer = ShaderComposer::new()?;
        let picker = GpuPicker::new(&context, &mut composer, size)?;
        Ok(Self {
            context,
            picker,
            camera,
            size,
            dpr: 1.0,
            construction_plane: PlaneSnap::xy(),
            cursor: Vec2::ZERO,
            point_size: options.snapping.point_size,
            line_width: options.snapping.axis_line_width,
            plane_half_size: options.snapping.plane_half_size,
        })
    }

    /// Set physical pixels per logical pixel.
    #[must_use]
    pub const fn with_device_pixel_ratio(mut self, dpr: f32) -> Self {
        self.dpr = dpr;
        self
    }

    /// Replace the construction plane.
    #[must_use]
    pub const fn with_construction_plane(mut self, plane: PlaneSnap) -> Self {
        self.construction_plane = plane;
        self
    }

    /// Mutable camera access.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// The wgpu context.
    #[must_use]
    pub const fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Resize the pick targets (physical pixels).
    pub fn resize(&mut self, size: UVec2) {
        self.size = size;
        self.camera.aspect = size.x as f32 / size.y.max(1) as f32;
        self.picker.resize(&self.context.device, size);
    }

    fn uniform(&self, point_size: f32) -> PickUniform {
        PickUniform::new(
            &self.camera,
            self.size,
            point_size,
            self.line_width * self.dpr,
            self.plane_half_size,
        )
    }
}

impl PickViewport for GpuViewport {
    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn size(&self) -> UVec2 {
        self.size
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    fn construction_plane(&self) -> PlaneSnap {
        self.construction_plane
    }

    fn upload(&self, geometry: &ProxyGeometry, label: &str) -> Option<ProxyBuffers> {
        Some(ProxyBuffers::new(&self.context.device, geometry, label))
    }

    fn set_cursor(&mut self, ndc: Vec2) {
        self.cursor = ndc;
    }

    fn cursor(&self) -> Vec2 {
        self.cursor
    }

    fn pick(&mut self, layers: &[&ProxySet]) -> Result<Option<PickHit>, SnapPickError> {
        let pixel = ndc_to_pixel(self.cursor, self.size).floor();
        if pixel.x < 0.0 || pixel.y < 0.0 {
            return Ok(None);
        }
        let pixel = pixel.as_uvec2();
        let uniform = self.uniform(self.point_size * self.dpr);
        let Some((id, depth)) = self.picker.pick(&self.context, &uniform, pixel, layers)? else {
            return Ok(None);
        };
        let center = pixel_to_ndc(pixel.as_vec2() + Vec2::splat(0.5), self.size);
        let position = self
            .camera
            .build_matrix()
            .inverse()
            .project_point3(Vec3::new(center.x, center.y, depth));
        Ok(Some(PickHit { id, position }))
    }

    fn request_tile(&mut self, request: TileRequest<'_>) -> bool {
        let uniform = self.uniform(request.point_size);
        self.picker.request_tile(&self.context, &uniform, request)
    }

    fn poll_tiles(&mut self) -> Vec<TileReadback> {
        self.picker.poll_tiles(&self.context.device)
    }
}

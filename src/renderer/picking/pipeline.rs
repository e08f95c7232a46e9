//! Render pipelines for the picking passes.
//!
//! The main pass writes ids into an R32Uint target and the depth each id was
//! written at into an R32Float target. Points write the stencil buffer and
//! lines are rejected wherever a point landed, so points always win over
//! lines regardless of depth order.

use crate::error::SnapPickError;
use crate::gpu::pipeline_helpers::{
    create_pick_pipeline, opaque_target, stencil_both, uniform_buffer, PipelineSpec,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{Shader, ShaderComposer};
use crate::proxy::vertex::{LineInstance, MeshVertex, PlaneInstance, PointInstance};

/// Id target format.
pub(crate) const ID_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;
/// Depth-value target format.
pub(crate) const DEPTH_VALUE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
/// Depth/stencil attachment format.
pub(crate) const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Depth24PlusStencil8;
/// Stencil value points write.
pub(crate) const POINT_STENCIL: u32 = 1;

/// Every picking pipeline plus the shared uniform layout.
pub struct PickPipelines {
    /// Layout of the single uniform bind group.
    pub uniform_layout: wgpu::BindGroupLayout,
    /// Visible-face triangles.
    pub mesh: wgpu::RenderPipeline,
    /// Plane quads.
    pub planes: wgpu::RenderPipeline,
    /// Point sprites, writing the stencil.
    pub points: wgpu::RenderPipeline,
    /// Line quads, rejected where the stencil is set.
    pub lines: wgpu::RenderPipeline,
    /// Point sprites for nearby tiles: id only, depth tested read-only.
    pub nearby_points: wgpu::RenderPipeline,
}

impl PickPipelines {
    /// Compose the shaders and build every pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Shader`] if a shader fails to compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
    ) -> Result<Self, SnapPickError> {
        let device = &context.device;
        let uniform_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Pick Uniform Layout"),
                entries: &[uniform_buffer(0)],
            });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pick Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let main_targets = [opaque_target(ID_FORMAT), opaque_target(DEPTH_VALUE_FORMAT)];
        let nearby_targets = [opaque_target(ID_FORMAT)];

        let mesh_shader = composer.compose(device, Shader::PickMesh)?;
        let plane_shader = composer.compose(device, Shader::PickPlanes)?;
        let point_shader = composer.compose(device, Shader::PickPoints)?;
        let line_shader = composer.compose(device, Shader::PickLines)?;

        let mesh = create_pick_pipeline(
            device,
            &layout,
            PipelineSpec {
                label: "Pick Mesh",
                shader: &mesh_shader,
                fragment_entry: "fs_main",
                buffer: MeshVertex::layout(),
                targets: &main_targets,
                depth_stencil: depth_only(),
            },
        );
        let planes = create_pick_pipeline(
            device,
            &layout,
            PipelineSpec {
                label: "Pick Planes",
                shader: &plane_shader,
                fragment_entry: "fs_main",
                buffer: PlaneInstance::layout(),
                targets: &main_targets,
                depth_stencil: depth_only(),
            },
        );
        let points = create_pick_pipeline(
            device,
            &layout,
            PipelineSpec {
                label: "Pick Points",
                shader: &point_shader,
                fragment_entry: "fs_main",
                buffer: PointInstance::layout(),
                targets: &main_targets,
                depth_stencil: wgpu::DepthStencilState {
                    stencil: stencil_both(
                        wgpu::CompareFunction::Always,
                        wgpu::StencilOperation::Replace,
                        0xFF,
                    ),
                    ..depth_only()
                },
            },
        );
        let lines = create_pick_pipeline(
            device,
            &layout,
            PipelineSpec {
                label: "Pick Lines",
                shader: &line_shader,
                fragment_entry: "fs_main",
                buffer: LineInstance::layout(),
                targets: &main_targets,
                depth_stencil: wgpu::DepthStencilState {
                    stencil: stencil_both(
                        wgpu::CompareFunction::NotEqual,
                        wgpu::StencilOperation::Keep,
                        0,
                    ),
                    ..depth_only()
                },
            },
        );
        let nearby_points = create_pick_pipeline(
            device,
            &layout,
            PipelineSpec {
                label: "Nearby Points",
                shader: &point_shader,
                fragment_entry: "fs_nearby",
                buffer: PointInstance::layout(),
                targets: &nearby_targets,
                depth_stencil: wgpu::DepthStencilState {
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    ..depth_only()
                },
            },
        );

        Ok(Self { uniform_layout, mesh, planes, points, lines, nearby_points })
    }
}

fn depth_only() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_STENCIL_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

//! Shared wgpu boilerplate for the picking pipelines.

/// Uniform buffer binding visible to vertex and fragment stages.
pub fn uniform_buffer(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Color target without blending, as integer formats require.
pub fn opaque_target(format: wgpu::TextureFormat) -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })
}

/// Stencil face state applying `compare` and `pass_op` on both faces.
pub fn stencil_both(
    compare: wgpu::CompareFunction,
    pass_op: wgpu::StencilOperation,
    write_mask: u32,
) -> wgpu::StencilState {
    let face = wgpu::StencilFaceState {
        compare,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op,
    };
    wgpu::StencilState {
        front: face,
        back: face,
        read_mask: 0xFF,
        write_mask,
    }
}

/// Everything that differs between the picking pipelines.
pub struct PipelineSpec<'a> {
    /// Debug label prefix.
    pub label: &'a str,
    /// Composed shader module.
    pub shader: &'a wgpu::ShaderModule,
    /// Fragment entry point.
    pub fragment_entry: &'a str,
    /// Vertex buffer layout.
    pub buffer: wgpu::VertexBufferLayout<'a>,
    /// Color targets written by the fragment entry.
    pub targets: &'a [Option<wgpu::ColorTargetState>],
    /// Depth/stencil state.
    pub depth_stencil: wgpu::DepthStencilState,
}

/// Create a triangle-list pipeline with `vs_main` as vertex entry and no
/// culling (proxy quads may face either way).
pub fn create_pick_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    spec: PipelineSpec<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} Pipeline", spec.label)),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: spec.shader,
            entry_point: Some("vs_main"),
            buffers: &[spec.buffer],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.shader,
            entry_point: Some(spec.fragment_entry),
            targets: spec.targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(spec.depth_stencil),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

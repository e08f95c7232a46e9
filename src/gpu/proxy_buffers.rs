//! Vertex buffers backing one uploaded proxy set.

use wgpu::util::DeviceExt;

use crate::proxy::ProxyGeometry;

/// One vertex buffer and the number of elements it holds.
#[derive(Debug)]
pub struct ElementBuffer {
    /// The GPU buffer.
    pub buffer: wgpu::Buffer,
    /// Instances (or vertices, for meshes) to draw.
    pub count: u32,
}

impl ElementBuffer {
    fn upload<T: bytemuck::Pod>(
        device: &wgpu::Device,
        label: &str,
        data: &[T],
    ) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Some(Self { buffer, count: data.len() as u32 })
    }
}

/// GPU-side copy of a [`ProxyGeometry`]. Empty primitive kinds get no
/// buffer.
#[derive(Debug)]
pub struct ProxyBuffers {
    /// Point instances.
    pub points: Option<ElementBuffer>,
    /// Line instances.
    pub lines: Option<ElementBuffer>,
    /// Plane instances.
    pub planes: Option<ElementBuffer>,
    /// Triangle-list vertices.
    pub triangles: Option<ElementBuffer>,
}

impl ProxyBuffers {
    /// Upload every non-empty primitive list of `geometry`.
    #[must_use]
    pub fn new(device: &wgpu::Device, geometry: &ProxyGeometry, label: &str) -> Self {
        Self {
            points: ElementBuffer::upload(
                device,
                &format!("{label} Points"),
                &geometry.points,
            ),
            lines: ElementBuffer::upload(
                device,
                &format!("{label} Lines"),
                &geometry.lines,
            ),
            planes: ElementBuffer::upload(
                device,
                &format!("{label} Planes"),
                &geometry.planes,
            ),
            triangles: ElementBuffer::upload(
                device,
                &format!("{label} Triangles"),
                &geometry.triangles,
            ),
        }
    }

    /// Release the GPU memory now instead of waiting for the last handle
    /// to drop.
    pub fn destroy(self) {
        for element in [self.points, self.lines, self.planes, self.triangles]
            .into_iter()
            .flatten()
        {
            element.buffer.destroy();
        }
    }
}

//! GPU vertex layouts for pick proxies.
//!
//! Every layout carries the owning [`PickId`](crate::codec::PickId) as a
//! flat `u32` attribute; the fragment shaders write it unchanged into the
//! R32Uint pick target.

use glam::Vec3;

use crate::codec::PickId;

const POINT_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Uint32];
const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Uint32, 2 => Float32x3];
const PLANE_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3, 1 => Uint32, 2 => Float32x3, 3 => Float32x3
];

/// One point snap, drawn as a screen-space square sprite.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointInstance {
    /// World-space position.
    pub position: [f32; 3],
    /// Owning pick id.
    pub id: u32,
}

impl PointInstance {
    /// Instance at `position` tagged with `id`.
    #[must_use]
    pub fn new(position: Vec3, id: PickId) -> Self {
        Self { position: position.to_array(), id: id.raw() }
    }

    /// Instance-step layout (six vertices per instance).
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &POINT_ATTRIBUTES,
        }
    }
}

/// One line segment, drawn as a screen-space quad of fixed pixel width.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineInstance {
    /// World-space start.
    pub start: [f32; 3],
    /// Owning pick id.
    pub id: u32,
    /// World-space end.
    pub end: [f32; 3],
}

impl LineInstance {
    /// Segment `start..end` tagged with `id`.
    #[must_use]
    pub fn new(start: Vec3, end: Vec3, id: PickId) -> Self {
        Self { start: start.to_array(), id: id.raw(), end: end.to_array() }
    }

    /// Instance-step layout (six vertices per instance).
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &LINE_ATTRIBUTES,
        }
    }
}

/// One filled plane, drawn as a large world-space quad.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PlaneInstance {
    /// Center of the quad.
    pub origin: [f32; 3],
    /// Owning pick id.
    pub id: u32,
    /// First in-plane unit axis.
    pub u_axis: [f32; 3],
    /// Second in-plane unit axis.
    pub v_axis: [f32; 3],
}

impl PlaneInstance {
    /// Quad centered on `origin`, spanning the plane orthogonal to `normal`.
    #[must_use]
    pub fn new(origin: Vec3, normal: Vec3, id: PickId) -> Self {
        let (u, v) = normal.normalize_or_zero().any_orthonormal_pair();
        Self {
            origin: origin.to_array(),
            id: id.raw(),
            u_axis: u.to_array(),
            v_axis: v.to_array(),
        }
    }

    /// Instance-step layout (six vertices per instance).
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &PLANE_ATTRIBUTES,
        }
    }
}

/// Triangle-list vertex of a visible object's pick mesh.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Owning pick id (flat across the triangle).
    pub id: u32,
}

impl MeshVertex {
    /// Vertex at `position` tagged with `id`.
    #[must_use]
    pub fn new(position: Vec3, id: PickId) -> Self {
        Self { position: position.to_array(), id: id.raw() }
    }

    /// Vertex-step layout.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POINT_ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_are_tightly_packed() {
        assert_eq!(size_of::<PointInstance>(), 16);
        assert_eq!(size_of::<LineInstance>(), 28);
        assert_eq!(size_of::<PlaneInstance>(), 40);
        assert_eq!(LINE_ATTRIBUTES[2].offset, 16);
        assert_eq!(PLANE_ATTRIBUTES[3].offset, 28);
    }

    #[test]
    fn plane_axes_span_the_plane() {
        let plane = PlaneInstance::new(Vec3::ZERO, Vec3::Z, PickId::from_raw(1));
        let u = Vec3::from_array(plane.u_axis);
        let v = Vec3::from_array(plane.v_axis);
        assert!(u.dot(Vec3::Z).abs() < 1e-6);
        assert!(v.dot(Vec3::Z).abs() < 1e-6);
        assert!(u.dot(v).abs() < 1e-6);
    }
}

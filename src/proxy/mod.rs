//! Pick proxies: the invisible stand-in geometry drawn into the id target.
//!
//! A [`ProxySet`] pairs CPU-side [`ProxyGeometry`] with the GPU buffers the
//! viewport uploaded for it. The same set works with any
//! [`PickViewport`](crate::viewport::PickViewport); CPU viewports simply keep
//! no buffers.

pub mod builder;
pub mod vertex;

use glam::Vec3;

pub use self::builder::build_proxies;
use self::vertex::{LineInstance, MeshVertex, PlaneInstance, PointInstance};
use crate::codec::PickId;
use crate::gpu::proxy_buffers::ProxyBuffers;
use crate::viewport::PickViewport;

/// World-space size of the proxies that stand in for unbounded snaps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyExtents {
    /// Distance an axis proxy extends from its origin.
    pub axis_length: f32,
    /// Half side of a plane proxy quad.
    pub plane_half_size: f32,
}

impl Default for ProxyExtents {
    fn default() -> Self {
        Self { axis_length: 10_000.0, plane_half_size: 10_000.0 }
    }
}

/// CPU-side proxy primitives, each tagged with its pick id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyGeometry {
    /// Point sprites.
    pub points: Vec<PointInstance>,
    /// Screen-width line segments.
    pub lines: Vec<LineInstance>,
    /// Filled plane quads.
    pub planes: Vec<PlaneInstance>,
    /// Triangle list (three vertices per triangle).
    pub triangles: Vec<MeshVertex>,
}

impl ProxyGeometry {
    /// Whether no primitive of any kind is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
            && self.lines.is_empty()
            && self.planes.is_empty()
            && self.triangles.is_empty()
    }

    /// Add a point sprite.
    pub fn push_point(&mut self, position: Vec3, id: PickId) {
        self.points.push(PointInstance::new(position, id));
    }

    /// Add a line segment.
    pub fn push_segment(&mut self, start: Vec3, end: Vec3, id: PickId) {
        self.lines.push(LineInstance::new(start, end, id));
    }

    /// Add a plane quad.
    pub fn push_plane(&mut self, origin: Vec3, normal: Vec3, id: PickId) {
        self.planes.push(PlaneInstance::new(origin, normal, id));
    }

    /// Add a triangle.
    pub fn push_triangle(&mut self, corners: [Vec3; 3], id: PickId) {
        self.triangles
            .extend(corners.iter().map(|&c| MeshVertex::new(c, id)));
    }

    fn clear(&mut self) {
        self.points.clear();
        self.lines.clear();
        self.planes.clear();
        self.triangles.clear();
    }
}

/// Renderable pick proxies owned by exactly one component.
///
/// Must be disposed by its owner; a disposed set renders nothing.
#[derive(Debug)]
pub struct ProxySet {
    label: String,
    geometry: ProxyGeometry,
    gpu: Option<ProxyBuffers>,
    disposed: bool,
}

impl ProxySet {
    /// Upload `geometry` through `viewport` and wrap it.
    pub fn new(
        label: impl Into<String>,
        geometry: ProxyGeometry,
        viewport: &dyn PickViewport,
    ) -> Self {
        let label = label.into();
        let gpu = viewport.upload(&geometry, &label);
        Self { label, geometry, gpu, disposed: false }
    }

    /// Set with no GPU buffers (CPU viewports, tests).
    #[must_use]
    pub fn from_geometry(label: impl Into<String>, geometry: ProxyGeometry) -> Self {
        Self { label: label.into(), geometry, gpu: None, disposed: false }
    }

    /// CPU-side primitives (empty once disposed).
    #[must_use]
    pub const fn geometry(&self) -> &ProxyGeometry {
        &self.geometry
    }

    /// Point sprites.
    #[must_use]
    pub fn points(&self) -> &[PointInstance] {
        &self.geometry.points
    }

    /// Line segments.
    #[must_use]
    pub fn lines(&self) -> &[LineInstance] {
        &self.geometry.lines
    }

    /// Plane quads.
    #[must_use]
    pub fn planes(&self) -> &[PlaneInstance] {
        &self.geometry.planes
    }

    /// GPU buffers, if this set was uploaded and is still live.
    #[must_use]
    pub const fn gpu(&self) -> Option<&ProxyBuffers> {
        self.gpu.as_ref()
    }

    /// Whether [`Self::dispose`] has run.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release GPU buffers and CPU geometry. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(buffers) = self.gpu.take() {
            buffers.destroy();
        }
        self.geometry.clear();
        self.disposed = true;
        log::trace!("disposed proxy set '{}'", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProxyGeometry {
        let mut geometry = ProxyGeometry::default();
        geometry.push_point(Vec3::ZERO, PickId::from_raw(1));
        geometry.push_segment(Vec3::ZERO, Vec3::X, PickId::from_raw(2));
        geometry.push_triangle([Vec3::ZERO, Vec3::X, Vec3::Y], PickId::from_raw(3));
        geometry
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut set = ProxySet::from_geometry("sample", sample());
        assert!(!set.is_disposed());
        assert_eq!(set.points().len(), 1);
        set.dispose();
        assert!(set.is_disposed());
        assert!(set.geometry().is_empty());
        set.dispose();
        assert!(set.is_disposed());
        assert!(set.gpu().is_none());
    }

    #[test]
    fn triangles_share_one_id() {
        let geometry = sample();
        assert_eq!(geometry.triangles.len(), 3);
        assert!(geometry.triangles.iter().all(|v| v.id == 3));
    }
}

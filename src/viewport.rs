//! The viewport seam: everything picking needs from the host view.
//!
//! [`PickViewport`] is implemented by the wgpu
//! [`GpuViewport`](crate::renderer::picking::GpuViewport) and by the CPU
//! [`SoftwareViewport`](crate::renderer::software::SoftwareViewport).

use glam::{UVec2, Vec2, Vec3};

use crate::camera::core::Camera;
use crate::codec::PickId;
use crate::error::SnapPickError;
use crate::gpu::proxy_buffers::ProxyBuffers;
use crate::proxy::vertex::PointInstance;
use crate::proxy::{ProxyGeometry, ProxySet};
use crate::snap::PlaneSnap;

/// Result of an exact pick under the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Id of the frontmost proxy under the cursor.
    pub id: PickId,
    /// Approximate world position of the hit.
    pub position: Vec3,
}

/// Axis-aligned pixel rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    /// Left edge (inclusive).
    pub x: u32,
    /// Top edge (inclusive).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Rectangle of side `side` centered on `center`, clamped to a target of
    /// `size` pixels. `None` when nothing of it lies on the target.
    #[must_use]
    pub fn centered(center: Vec2, side: u32, size: UVec2) -> Option<Self> {
        let half = side as f32 * 0.5;
        let x0 = (center.x - half).floor().max(0.0);
        let y0 = (center.y - half).floor().max(0.0);
        let x1 = (center.x - half).floor() + side as f32;
        let y1 = (center.y - half).floor() + side as f32;
        let x1 = x1.min(size.x as f32);
        let y1 = y1.min(size.y as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    /// Number of pixels covered.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Identifies one asynchronous tile readback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadbackTicket {
    /// Picker generation; bumped on reset/teardown.
    pub generation: u64,
    /// Proxy-set epoch the tile was rendered from.
    pub epoch: u64,
    /// Monotonic request counter.
    pub serial: u64,
    /// Cursor position in physical pixels when the tile was requested.
    pub center: Vec2,
}

/// A nearby-tile render request.
#[derive(Debug, Clone, Copy)]
pub struct TileRequest<'a> {
    /// Handed back unchanged with the readback.
    pub ticket: ReadbackTicket,
    /// Tile in physical pixels (already clamped to the target).
    pub rect: PixelRect,
    /// Point sprite side in physical pixels for this pass.
    pub point_size: f32,
    /// Point-proxy layers to draw, in order.
    pub points: &'a [&'a ProxySet],
}

/// A completed tile readback.
#[derive(Debug, Clone, PartialEq)]
pub struct TileReadback {
    /// Ticket from the matching [`TileRequest`].
    pub ticket: ReadbackTicket,
    /// Rectangle the pixels cover.
    pub rect: PixelRect,
    /// Row-major ids, `rect.width * rect.height` entries.
    pub pixels: Vec<u32>,
}

/// Host-view services used by the cache, the adapter and the nearby picker.
pub trait PickViewport {
    /// Current camera.
    fn camera(&self) -> &Camera;

    /// Render-target size in physical pixels.
    fn size(&self) -> UVec2;

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f32;

    /// The viewport's construction plane.
    fn construction_plane(&self) -> PlaneSnap;

    /// Upload proxy geometry to the GPU. CPU viewports return `None`.
    fn upload(&self, geometry: &ProxyGeometry, label: &str) -> Option<ProxyBuffers>;

    /// Move the cursor, in normalized device coordinates.
    fn set_cursor(&mut self, ndc: Vec2);

    /// Cursor in normalized device coordinates.
    fn cursor(&self) -> Vec2;

    /// Frontmost proxy under the cursor across `layers`.
    ///
    /// Layers are drawn in order into one shared depth buffer; points beat
    /// lines wherever both cover the same pixel. `Ok(None)` is background.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Readback`] when the id buffer cannot be read
    /// back.
    fn pick(&mut self, layers: &[&ProxySet]) -> Result<Option<PickHit>, SnapPickError>;

    /// Start an asynchronous tile render. Returns `false` if the request was
    /// dropped.
    fn request_tile(&mut self, request: TileRequest<'_>) -> bool;

    /// Harvest tile readbacks that have completed, without blocking.
    fn poll_tiles(&mut self) -> Vec<TileReadback>;
}

/// Point instances of every live layer, in layer order.
pub(crate) fn live_points<'a>(
    layers: &'a [&'a ProxySet],
) -> impl Iterator<Item = &'a PointInstance> + 'a {
    layers
        .iter()
        .filter(|set| !set.is_disposed())
        .flat_map(|set| set.points().iter())
}

/// Cursor ray of `viewport`.
#[must_use]
pub fn cursor_ray(viewport: &dyn PickViewport) -> crate::snap::ray::Ray {
    viewport.camera().cursor_ray(viewport.cursor())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_is_clamped() {
        let size = UVec2::new(100, 100);
        let rect = PixelRect::centered(Vec2::new(50.0, 50.0), 20, size).unwrap();
        assert_eq!(rect, PixelRect { x: 40, y: 40, width: 20, height: 20 });
        let corner = PixelRect::centered(Vec2::new(2.0, 98.0), 20, size).unwrap();
        assert_eq!(corner, PixelRect { x: 0, y: 88, width: 12, height: 12 });
        assert!(PixelRect::centered(Vec2::new(-50.0, 0.0), 20, size).is_none());
    }

    #[test]
    fn area_counts_pixels() {
        let rect = PixelRect { x: 10, y: 10, width: 5, height: 4 };
        assert_eq!(rect.area(), 20);
    }
}

//! CPU implementation of [`PickViewport`].
//!
//! Evaluates the same proxy primitives the GPU picker rasterizes, one pixel
//! at a time, with the same draw order and the same points-over-lines rule.
//! Tile readbacks complete on the following [`PickViewport::poll_tiles`]
//! call, so callers see the same one-frame lag as with the GPU picker.
//! Tile points are depth tested against the layers of the last pick, the
//! way the GPU nearby pass reuses the pick depth buffer.

use glam::{UVec2, Vec2, Vec3};

use crate::camera::core::{ndc_to_pixel, pixel_to_ndc, Camera};
use crate::codec::PickId;
use crate::error::SnapPickError;
use crate::gpu::proxy_buffers::ProxyBuffers;
use crate::options::Options;
use crate::proxy::vertex::{LineInstance, PlaneInstance, PointInstance};
use crate::proxy::{ProxyGeometry, ProxySet};
use crate::snap::ray::Ray;
use crate::snap::PlaneSnap;
use crate::viewport::{
    live_points, PickHit, PickViewport, TileReadback, TileRequest,
};

/// Pending tile readbacks allowed at once, matching the GPU staging ring.
const MAX_PENDING_TILES: usize = 3;

/// Ray-parameter slack for the `LessEqual` tile depth test.
const DEPTH_EPSILON: f32 = 1e-3;

/// Headless, deterministic viewport.
#[derive(Debug, Clone)]
pub struct SoftwareViewport {
    camera: Camera,
    size: UVec2,
    dpr: f32,
    construction_plane: PlaneSnap,
    cursor: Vec2,
    point_size: f32,
    line_width: f32,
    plane_half_size: f32,
    pending: Vec<TileReadback>,
    /// Geometry drawn by the last pick; stands in for its depth buffer.
    depth_layers: Vec<ProxyGeometry>,
}

impl SoftwareViewport {
    /// Viewport of `size` physical pixels looking through `camera`, with proxy
    /// sizes from `options`.
    #[must_use]
    pub fn new(options: &Options, camera: Camera, size: UVec2) -> Self {
        Self {
            camera,
            size,
            dpr: 1.0,
            construction_plane: PlaneSnap::xy(),
            cursor: Vec2::ZERO,
            point_size: options.snapping.point_size,
            line_width: options.snapping.axis_line_width,
            plane_half_size: options.snapping.plane_half_size,
            pending: Vec::new(),
            depth_layers: Vec::new(),
        }
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

    fn pixel_ray(&self, x: u32, y: u32) -> Ray {
        let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        self.camera.cursor_ray(pixel_to_ndc(center, self.size))
    }

    /// Projected pixel position of `world`, if it survives clipping.
    fn screen(&self, world: Vec3) -> Option<Vec2> {
        if !self.camera.is_in_front(world) {
            return None;
        }
        let ndc = self.camera.project(world);
        (0.0..=1.0)
            .contains(&ndc.z)
            .then(|| ndc_to_pixel(ndc.truncate(), self.size))
    }

    fn point_depth(&self, point: &PointInstance, ray: &Ray, pixel: Vec2, side: f32) -> Option<f32> {
        let world = Vec3::from_array(point.position);
        let screen = self.screen(world)?;
        sprite_covers(screen, side, pixel).then(|| ray.parameter_of(world))
    }

    fn line_depth(&self, line: &LineInstance, ray: &Ray, pixel: Vec2) -> Option<f32> {
        let (closest, t) = ray.closest_on_segment(
            Vec3::from_array(line.start),
            Vec3::from_array(line.end),
        );
        let screen = self.screen(closest)?;
        let half = self.line_width * self.dpr * 0.5;
        (screen.distance(pixel) <= half).then_some(t)
    }

    /// Frontmost primitive across `layers` at pixel `(x, y)`, with the same
    /// draw order and stencil rule as the GPU pick pass.
    fn nearest_at(&self, layers: &[&ProxyGeometry], x: u32, y: u32) -> Option<Nearest> {
        let ray = self.pixel_ray(x, y);
        let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);

        let mut best: Option<Nearest> = None;
        for geometry in layers {
            for tri in geometry.triangles.chunks_exact(3) {
                let [a, b, c] = [tri[0], tri[1], tri[2]].map(|v| Vec3::from_array(v.position));
                Nearest::offer(&mut best, tri[0].id, ray.intersect_triangle(a, b, c));
            }
        }
        for geometry in layers {
            for plane in &geometry.planes {
                Nearest::offer(&mut best, plane.id, self.plane_depth(plane, &ray));
            }
        }
        let side = self.point_size * self.dpr;
        let mut point_drawn = false;
        for geometry in layers {
            for point in &geometry.points {
                let depth = self.point_depth(point, &ray, pixel, side);
                if let Some(t) = depth {
                    // stencil is written wherever a point passes the depth test
                    if best.is_none_or(|b| t < b.t) {
                        point_drawn = true;
                    }
                }
                Nearest::offer(&mut best, point.id, depth);
            }
        }
        if !point_drawn {
            for geometry in layers {
                for line in &geometry.lines {
                    Nearest::offer(&mut best, line.id, self.line_depth(line, &ray, pixel));
                }
            }
        }
        best
    }

    /// Whether the last pick drew something in front of `world` at pixel
    /// `(x, y)`.
    fn occluded(&self, world: Vec3, x: u32, y: u32) -> bool {
        if self.depth_layers.is_empty() {
            return false;
        }
        let layers: Vec<&ProxyGeometry> = self.depth_layers.iter().collect();
        let t = self.pixel_ray(x, y).parameter_of(world);
        self.nearest_at(&layers, x, y)
            .is_some_and(|front| t > front.t + DEPTH_EPSILON)
    }

    fn plane_depth(&self, plane: &PlaneInstance, ray: &Ray) -> Option<f32> {
        let origin = Vec3::from_array(plane.origin);
        let u = Vec3::from_array(plane.u_axis);
        let v = Vec3::from_array(plane.v_axis);
        let t = ray.intersect_plane(origin, u.cross(v))?;
        let local = ray.at(t) - origin;
        let inside = local.dot(u).abs() <= self.plane_half_size
            && local.dot(v).abs() <= self.plane_half_size;
        inside.then_some(t)
    }
}

/// Whether a square sprite of `side` pixels centered at `screen` covers the
/// pixel whose center is `pixel`. Half-open so that a one-pixel sprite
/// covers exactly one pixel.
fn sprite_covers(screen: Vec2, side: f32, pixel: Vec2) -> bool {
    let half = side * 0.5;
    let d = pixel - screen;
    d.x >= -half && d.x < half && d.y >= -half && d.y < half
}

#[derive(Clone, Copy)]
struct Nearest {
    id: u32,
    t: f32,
}

impl Nearest {
    fn offer(best: &mut Option<Self>, id: u32, t: Option<f32>) {
        let Some(t) = t else { return };
        if best.is_none_or(|b| t < b.t) {
            *best = Some(Self { id, t });
        }
    }
}

impl PickViewport for SoftwareViewport {
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

    fn upload(&self, _geometry: &ProxyGeometry, _label: &str) -> Option<ProxyBuffers> {
        None
    }

    fn set_cursor(&mut self, ndc: Vec2) {
        self.cursor = ndc;
    }

    fn cursor(&self) -> Vec2 {
        self.cursor
    }

    fn pick(&mut self, layers: &[&ProxySet]) -> Result<Option<PickHit>, SnapPickError> {
        let cursor = ndc_to_pixel(self.cursor, self.size).floor();
        if cursor.x < 0.0
            || cursor.y < 0.0
            || cursor.x >= self.size.x as f32
            || cursor.y >= self.size.y as f32
        {
            return Ok(None);
        }
        let live: Vec<&ProxyGeometry> = layers
            .iter()
            .filter(|set| !set.is_disposed())
            .map(|set| set.geometry())
            .collect();
        self.depth_layers = live.iter().map(|&geometry| geometry.clone()).collect();
        let (x, y) = (cursor.x as u32, cursor.y as u32);
        let hit = self.nearest_at(&live, x, y).map(|best| PickHit {
            id: PickId::from_raw(best.id),
            position: self.pixel_ray(x, y).at(best.t),
        });
        Ok(hit)
    }

    fn request_tile(&mut self, request: TileRequest<'_>) -> bool {
        if self.pending.len() >= MAX_PENDING_TILES {
            return false;
        }
        let rect = request.rect;
        let mut pixels = vec![0u32; rect.area()];
        let side = request.point_size;
        let half = side * 0.5;
        for point in live_points(request.points) {
            let world = Vec3::from_array(point.position);
            let Some(screen) = self.screen(world) else {
                continue;
            };
            let x0 = (screen.x - half - 0.5).ceil().max(rect.x as f32) as u32;
            let y0 = (screen.y - half - 0.5).ceil().max(rect.y as f32) as u32;
            let x1 = (screen.x + half - 0.5)
                .ceil()
                .min((rect.x + rect.width) as f32)
                .max(0.0) as u32;
            let y1 = (screen.y + half - 0.5)
                .ceil()
                .min((rect.y + rect.height) as f32)
                .max(0.0) as u32;
            for y in y0..y1 {
                for x in x0..x1 {
                    if self.occluded(world, x, y) {
                        continue;
                    }
                    let i = (y - rect.y) as usize * rect.width as usize + (x - rect.x) as usize;
                    pixels[i] = point.id;
                }
            }
        }
        self.pending.push(TileReadback { ticket: request.ticket, rect, pixels });
        true
    }

    fn poll_tiles(&mut self) -> Vec<TileReadback> {
        std::mem::take(&mut self.pending)
    }
}

/// Top-down orthographic viewport: 400x400 pixels over 400x400 world
/// units, so one world unit is one pixel and the world origin sits at the
/// viewport center.
#[cfg(test)]
pub(crate) fn test_viewport() -> SoftwareViewport {
    use crate::options::ProjectionMode;

    let mut options = Options::default();
    options.camera.projection = ProjectionMode::Orthographic;
    options.camera.frustum_size = 400.0;
    options.camera.znear = 0.1;
    options.camera.zfar = 1000.0;
    let camera = Camera::new(&options.camera, Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO, 1.0);
    SoftwareViewport::new(&options, camera, UVec2::new(400, 400))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyGeometry;

    fn set(geometry: ProxyGeometry) -> ProxySet {
        ProxySet::from_geometry("test", geometry)
    }

    #[test]
    fn empty_scene_picks_nothing() {
        let mut viewport = test_viewport();
        assert!(viewport.pick(&[]).unwrap().is_none());
    }

    #[test]
    fn point_sprite_covers_its_size() {
        let mut viewport = test_viewport();
        let mut geometry = ProxyGeometry::default();
        geometry.push_point(Vec3::ZERO, PickId::from_raw(7));
        let layer = set(geometry);
        // 35 px sprite: 15 px away still hits, 21 px away misses
        viewport.set_cursor(pixel_to_ndc(Vec2::new(215.0, 200.0), viewport.size()));
        assert_eq!(viewport.pick(&[&layer]).unwrap().unwrap().id, PickId::from_raw(7));
        viewport.set_cursor(pixel_to_ndc(Vec2::new(221.0, 200.0), viewport.size()));
        assert!(viewport.pick(&[&layer]).unwrap().is_none());
    }

    #[test]
    fn points_win_over_lines() {
        let mut viewport = test_viewport();
        let mut geometry = ProxyGeometry::default();
        // line drawn above the point in depth
        geometry.push_segment(
            Vec3::new(-100.0, 0.0, 20.0),
            Vec3::new(100.0, 0.0, 20.0),
            PickId::from_raw(1),
        );
        geometry.push_point(Vec3::ZERO, PickId::from_raw(2));
        let layer = set(geometry);
        viewport.set_cursor(Vec2::ZERO);
        assert_eq!(viewport.pick(&[&layer]).unwrap().unwrap().id, PickId::from_raw(2));
        // away from the point, the line is hit
        viewport.set_cursor(pixel_to_ndc(Vec2::new(280.0, 200.0), viewport.size()));
        assert_eq!(viewport.pick(&[&layer]).unwrap().unwrap().id, PickId::from_raw(1));
    }

    #[test]
    fn nearer_triangle_occludes_plane() {
        let mut viewport = test_viewport();
        let mut geometry = ProxyGeometry::default();
        geometry.push_plane(Vec3::ZERO, Vec3::Z, PickId::from_raw(1));
        geometry.push_triangle(
            [
                Vec3::new(-50.0, -50.0, 10.0),
                Vec3::new(50.0, -50.0, 10.0),
                Vec3::new(0.0, 50.0, 10.0),
            ],
            PickId::from_raw(2),
        );
        let layer = set(geometry);
        viewport.set_cursor(Vec2::ZERO);
        let hit = viewport.pick(&[&layer]).unwrap().unwrap();
        assert_eq!(hit.id, PickId::from_raw(2));
        assert!((hit.position.z - 10.0).abs() < 1e-2);
    }

    #[test]
    fn disposed_layers_render_nothing() {
        let mut viewport = test_viewport();
        let mut geometry = ProxyGeometry::default();
        geometry.push_point(Vec3::ZERO, PickId::from_raw(3));
        let mut layer = set(geometry);
        layer.dispose();
        viewport.set_cursor(Vec2::ZERO);
        assert!(viewport.pick(&[&layer]).unwrap().is_none());
    }

    #[test]
    fn readback_ring_drops_excess_requests() {
        use crate::viewport::{PixelRect, ReadbackTicket};

        let mut viewport = test_viewport();
        let ticket = ReadbackTicket { generation: 0, epoch: 0, serial: 0, center: Vec2::ZERO };
        let request = TileRequest {
            ticket,
            rect: PixelRect { x: 0, y: 0, width: 4, height: 4 },
            point_size: 1.0,
            points: &[],
        };
        for _ in 0..MAX_PENDING_TILES {
            assert!(viewport.request_tile(request));
        }
        assert!(!viewport.request_tile(request));
        assert_eq!(viewport.poll_tiles().len(), MAX_PENDING_TILES);
        assert!(viewport.poll_tiles().is_empty());
    }

    #[test]
    fn tile_points_behind_the_last_pick_are_dropped() {
        use crate::viewport::{PixelRect, ReadbackTicket};

        let mut viewport = test_viewport();
        let mut face = ProxyGeometry::default();
        face.push_triangle(
            [
                Vec3::new(-50.0, -50.0, 10.0),
                Vec3::new(50.0, -50.0, 10.0),
                Vec3::new(0.0, 50.0, 10.0),
            ],
            PickId::from_raw(1),
        );
        let face = set(face);
        let mut under = ProxyGeometry::default();
        under.push_point(Vec3::new(5.0, 0.0, 0.0), PickId::from_raw(2));
        let under = set(under);

        let ticket = ReadbackTicket { generation: 0, epoch: 0, serial: 0, center: Vec2::ZERO };
        let request = TileRequest {
            ticket,
            rect: PixelRect { x: 190, y: 190, width: 20, height: 20 },
            point_size: 4.0,
            points: &[&under],
        };

        // no pick yet: nothing occludes
        assert!(viewport.request_tile(request));
        assert!(viewport.poll_tiles()[0].pixels.contains(&2));

        viewport.set_cursor(Vec2::ZERO);
        let _ = viewport.pick(&[&face, &under]).unwrap();
        assert!(viewport.request_tile(request));
        assert!(viewport.poll_tiles()[0].pixels.iter().all(|&id| id == 0));
    }

    #[test]
    fn tile_points_on_top_survive_the_depth_test() {
        use crate::viewport::{PixelRect, ReadbackTicket};

        let mut viewport = test_viewport();
        let mut geometry = ProxyGeometry::default();
        geometry.push_plane(Vec3::ZERO, Vec3::Z, PickId::from_raw(1));
        geometry.push_point(Vec3::new(5.0, 0.0, 0.0), PickId::from_raw(2));
        let layer = set(geometry);
        viewport.set_cursor(Vec2::ZERO);
        let _ = viewport.pick(&[&layer]).unwrap();

        let ticket = ReadbackTicket { generation: 0, epoch: 0, serial: 0, center: Vec2::ZERO };
        let request = TileRequest {
            ticket,
            rect: PixelRect { x: 190, y: 190, width: 20, height: 20 },
            point_size: 4.0,
            points: &[&layer],
        };
        assert!(viewport.request_tile(request));
        let tile = viewport.poll_tiles().remove(0);
        assert_eq!(tile.pixels.iter().filter(|&&id| id == 2).count(), 16);
    }
}

//! Nearby-Radius Picker: every point snap within a pixel radius of the
//! cursor.
//!
//! Each query renders only point proxies into a small tile around the
//! cursor and reads it back asynchronously. Answers therefore lag the
//! cursor by at least one frame: [`NearbyPicker::poll`] applies whatever
//! readbacks have completed, and the caller keeps showing the last applied
//! answer in between.

use glam::{UVec2, Vec2};
use rustc_hash::{FxHashMap, FxHashSet};
use web_time::Instant;

use crate::camera::core::ndc_to_pixel;
use crate::codec::PickId;
use crate::proxy::ProxySet;
use crate::viewport::{PickViewport, PixelRect, ReadbackTicket, TileReadback, TileRequest};

/// Tile renderer/scanner with stale-result protection.
#[derive(Debug)]
pub struct NearbyPicker {
    radius: f32,
    point_size: f32,
    generation: u64,
    next_serial: u64,
    applied_serial: Option<u64>,
    applied_epoch: u64,
    in_flight: FxHashMap<u64, Instant>,
    current: Vec<PickId>,
}

impl NearbyPicker {
    /// Picker for a radius and point-proxy size in logical pixels.
    #[must_use]
    pub fn new(radius: f32, point_size: f32) -> Self {
        Self {
            radius,
            point_size,
            generation: 0,
            next_serial: 0,
            applied_serial: None,
            applied_epoch: 0,
            in_flight: FxHashMap::default(),
            current: Vec::new(),
        }
    }

    /// Tile of side `2 * radius * dpr` centered on the cursor, clamped to the
    /// target. `None` when the cursor is far enough outside the view that
    /// the tile misses it entirely.
    #[must_use]
    pub fn tile(&self, cursor_ndc: Vec2, size: UVec2, dpr: f32) -> Option<PixelRect> {
        let side = (2.0 * self.radius * dpr).ceil().max(1.0) as u32;
        PixelRect::centered(ndc_to_pixel(cursor_ndc, size), side, size)
    }

    /// Ask the viewport for a fresh tile around its cursor.
    ///
    /// `epoch` identifies the proxy sets in `layers`; readbacks rendered
    /// from another epoch are discarded by [`Self::poll`]. Returns `false`
    /// when no tile was requested.
    pub fn request(
        &mut self,
        viewport: &mut dyn PickViewport,
        epoch: u64,
        layers: &[&ProxySet],
    ) -> bool {
        let size = viewport.size();
        let dpr = viewport.device_pixel_ratio();
        let cursor = viewport.cursor();
        let Some(rect) = self.tile(cursor, size, dpr) else {
            return false;
        };
        let ticket = ReadbackTicket {
            generation: self.generation,
            epoch,
            serial: self.next_serial,
            center: ndc_to_pixel(cursor, size),
        };
        self.next_serial += 1;
        let accepted = viewport.request_tile(TileRequest {
            ticket,
            rect,
            point_size: self.point_size * dpr,
            points: layers,
        });
        if accepted {
            let _ = self.in_flight.insert(ticket.serial, Instant::now());
        } else {
            log::warn!(
                "nearby tile request {} dropped: no free readback slot",
                ticket.serial
            );
        }
        accepted
    }

    /// Apply completed readbacks. Returns whether the current answer
    /// changed.
    ///
    /// Readbacks from an older generation, another epoch, or older than an
    /// already-applied request are discarded.
    pub fn poll(&mut self, viewport: &mut dyn PickViewport, epoch: u64) -> bool {
        let radius_px = self.radius * viewport.device_pixel_ratio();
        let mut changed = false;
        if epoch != self.applied_epoch {
            // ids of the old answer index lists that no longer exist
            changed = !self.current.is_empty();
            self.current.clear();
            self.applied_epoch = epoch;
        }
        for readback in viewport.poll_tiles() {
            let ticket = readback.ticket;
            if let Some(started) = self.in_flight.remove(&ticket.serial) {
                log::debug!(
                    "nearby tile {} read back after {:?}",
                    ticket.serial,
                    started.elapsed()
                );
            }
            if ticket.generation != self.generation || ticket.epoch != epoch {
                log::trace!("discarding stale nearby tile {}", ticket.serial);
                continue;
            }
            if self.applied_serial.is_some_and(|applied| applied >= ticket.serial) {
                continue;
            }
            self.current = collect_ids(&readback, ticket.center, radius_px);
            self.applied_serial = Some(ticket.serial);
            changed = true;
        }
        changed
    }

    /// Ids of the last applied answer, ascending.
    #[must_use]
    pub fn current(&self) -> &[PickId] {
        &self.current
    }

    /// Forget the current answer and invalidate every in-flight readback.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.applied_serial = None;
        self.in_flight.clear();
        self.current.clear();
    }
}

/// Distinct non-zero ids whose pixel centers lie within `radius_px` of
/// `center`, ascending.
#[must_use]
pub fn collect_ids(readback: &TileReadback, center: Vec2, radius_px: f32) -> Vec<PickId> {
    let rect = readback.rect;
    let radius_sq = radius_px * radius_px;
    let mut seen = FxHashSet::default();
    for (row, line) in readback
        .pixels
        .chunks_exact(rect.width.max(1) as usize)
        .enumerate()
    {
        let dy = (rect.y as usize + row) as f32 + 0.5 - center.y;
        if dy * dy > radius_sq {
            continue;
        }
        for (col, &raw) in line.iter().enumerate() {
            if raw == 0 {
                continue;
            }
            let dx = (rect.x as usize + col) as f32 + 0.5 - center.x;
            if dx * dx + dy * dy <= radius_sq {
                let _ = seen.insert(raw);
            }
        }
    }
    let mut ids: Vec<u32> = seen.into_iter().collect();
    ids.sort_unstable();
    ids.into_iter().map(PickId::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::proxy::ProxyGeometry;
    use crate::renderer::software::test_viewport;

    fn readback(rect: PixelRect, pixels: Vec<u32>) -> TileReadback {
        let ticket = ReadbackTicket { generation: 0, epoch: 0, serial: 0, center: Vec2::ZERO };
        TileReadback { ticket, rect, pixels }
    }

    #[test]
    fn scan_keeps_distinct_ids_inside_the_circle() {
        let rect = PixelRect { x: 0, y: 0, width: 4, height: 4 };
        #[rustfmt::skip]
        let pixels = vec![
            9, 0, 0, 0,
            0, 3, 3, 0,
            0, 3, 7, 0,
            0, 0, 0, 0,
        ];
        let ids = collect_ids(&readback(rect, pixels), Vec2::new(2.0, 2.0), 1.5);
        assert_eq!(ids, vec![PickId::from_raw(3), PickId::from_raw(7)]);
    }

    #[test]
    fn tile_is_centered_and_scaled_by_dpr() {
        let picker = NearbyPicker::new(50.0, 1.0);
        let size = UVec2::new(400, 400);
        let rect = picker.tile(Vec2::ZERO, size, 1.0).unwrap();
        assert_eq!(rect, PixelRect { x: 150, y: 150, width: 100, height: 100 });
        let rect = picker.tile(Vec2::ZERO, size, 2.0).unwrap();
        assert_eq!(rect, PixelRect { x: 100, y: 100, width: 200, height: 200 });
    }

    fn point_layer() -> ProxySet {
        let mut geometry = ProxyGeometry::default();
        geometry.push_point(Vec3::new(5.0, 0.0, 0.0), PickId::from_raw(1));
        geometry.push_point(Vec3::new(0.0, 40.0, 0.0), PickId::from_raw(2));
        geometry.push_point(Vec3::new(60.0, 0.0, 0.0), PickId::from_raw(3));
        geometry.push_point(Vec3::new(40.0, 40.0, 0.0), PickId::from_raw(4));
        ProxySet::from_geometry("points", geometry)
    }

    #[test]
    fn answers_arrive_one_poll_later() {
        let mut viewport = test_viewport();
        let layer = point_layer();
        let mut picker = NearbyPicker::new(50.0, 1.0);
        assert!(picker.request(&mut viewport, 0, &[&layer]));
        assert!(picker.current().is_empty());
        assert!(picker.poll(&mut viewport, 0));
        assert_eq!(picker.current(), &[PickId::from_raw(1), PickId::from_raw(2)]);
    }

    #[test]
    fn stale_epoch_is_discarded() {
        let mut viewport = test_viewport();
        let layer = point_layer();
        let mut picker = NearbyPicker::new(50.0, 1.0);
        let _ = picker.request(&mut viewport, 0, &[&layer]);
        assert!(!picker.poll(&mut viewport, 1));
        assert!(picker.current().is_empty());
    }

    #[test]
    fn reset_discards_in_flight_tiles() {
        let mut viewport = test_viewport();
        let layer = point_layer();
        let mut picker = NearbyPicker::new(50.0, 1.0);
        let _ = picker.request(&mut viewport, 0, &[&layer]);
        let _ = picker.poll(&mut viewport, 0);
        let _ = picker.request(&mut viewport, 0, &[&layer]);
        picker.reset();
        assert!(picker.current().is_empty());
        assert!(!picker.poll(&mut viewport, 0));
        assert!(picker.current().is_empty());
    }
}

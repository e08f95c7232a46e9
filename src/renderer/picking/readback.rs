//! Staging buffers for reading pick targets back to the CPU.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::SnapPickError;
use crate::viewport::{PixelRect, ReadbackTicket, TileReadback};

/// Offset of the depth texel inside the single-pixel staging buffer.
pub(crate) const DEPTH_TEXEL_OFFSET: u64 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64;

/// Row pitch of a texture-to-buffer copy `width` texels wide.
#[must_use]
pub(crate) const fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Map-completion flags shared with the `map_async` callback.
#[derive(Debug, Clone, Default)]
struct MapState {
    done: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
}

impl MapState {
    fn map(&self, slice: wgpu::BufferSlice<'_>) {
        self.done.store(false, Ordering::SeqCst);
        self.failed.store(false, Ordering::SeqCst);
        let done = self.done.clone();
        let failed = self.failed.clone();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            if result.is_err() {
                failed.store(true, Ordering::SeqCst);
            }
            done.store(true, Ordering::SeqCst);
        });
    }

    fn done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Blocking readback of one id texel and one depth texel.
pub(crate) struct PixelReadback {
    /// Receives the id texel at offset 0 and the depth texel at
    /// [`DEPTH_TEXEL_OFFSET`].
    pub(crate) buffer: wgpu::Buffer,
    state: MapState,
}

impl PixelReadback {
    /// Allocate the staging buffer.
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Pixel Staging Buffer"),
            size: DEPTH_TEXEL_OFFSET * 2,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self { buffer, state: MapState::default() }
    }

    /// Map the buffer, wait for the GPU, and return `(id, depth)`.
    ///
    /// Call after the copy has been submitted.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Readback`] if the device cannot be polled or
    /// the buffer cannot be mapped.
    pub(crate) fn read(&self, device: &wgpu::Device) -> Result<(u32, f32), SnapPickError> {
        self.state.map(self.buffer.slice(..));
        let _ = device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| SnapPickError::Readback(e.to_string()))?;
        if !self.state.done() || self.state.failed() {
            self.buffer.unmap();
            return Err(SnapPickError::Readback(
                "pick pixel buffer could not be mapped".to_owned(),
            ));
        }

        let data = self.buffer.slice(..).get_mapped_range();
        let word = |offset: usize| {
            [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
        };
        let id = u32::from_le_bytes(word(0));
        let depth = f32::from_le_bytes(word(DEPTH_TEXEL_OFFSET as usize));
        drop(data);
        self.buffer.unmap();
        Ok((id, depth))
    }
}

struct PendingTile {
    ticket: ReadbackTicket,
    rect: PixelRect,
    bytes_per_row: u32,
    state: MapState,
}

#[derive(Default)]
struct TileSlot {
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
    pending: Option<PendingTile>,
}

/// Fixed ring of staging buffers for asynchronous tile readbacks.
///
/// A request is dropped when every slot is still waiting on the GPU.
pub(crate) struct TileRing {
    slots: Vec<TileSlot>,
}

impl TileRing {
    /// Ring of `slots` staging buffers, allocated lazily.
    pub(crate) fn new(slots: usize) -> Self {
        Self { slots: (0..slots).map(|_| TileSlot::default()).collect() }
    }

    /// Reserve a free slot able to hold `rect`, returning its index and
    /// buffer. `None` when every slot is busy.
    pub(crate) fn acquire(
        &mut self,
        device: &wgpu::Device,
        rect: PixelRect,
    ) -> Option<(usize, &wgpu::Buffer)> {
        let size = u64::from(padded_bytes_per_row(rect.width)) * u64::from(rect.height);
        let index = self.slots.iter().position(|s| s.pending.is_none())?;
        let slot = &mut self.slots[index];
        if slot.buffer.is_none() || slot.capacity < size {
            if let Some(old) = slot.buffer.take() {
                old.destroy();
            }
            slot.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Nearby Tile Staging Buffer"),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }));
            slot.capacity = size;
        }
        slot.buffer.as_ref().map(|buffer| (index, buffer))
    }

    /// Start mapping slot `index` after its copy was submitted.
    pub(crate) fn start(&mut self, index: usize, ticket: ReadbackTicket, rect: PixelRect) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        let Some(buffer) = slot.buffer.as_ref() else {
            return;
        };
        let bytes_per_row = padded_bytes_per_row(rect.width);
        let state = MapState::default();
        state.map(buffer.slice(..u64::from(bytes_per_row) * u64::from(rect.height)));
        slot.pending = Some(PendingTile { ticket, rect, bytes_per_row, state });
    }

    /// Collect every slot whose mapping has completed, without blocking.
    pub(crate) fn harvest(&mut self, device: &wgpu::Device) -> Vec<TileReadback> {
        if let Err(e) = device.poll(wgpu::PollType::Poll) {
            log::warn!("tile readback poll failed: {e}");
        }
        let mut out = Vec::new();
        for slot in &mut self.slots {
            let ready = slot.pending.as_ref().is_some_and(|p| p.state.done());
            if !ready {
                continue;
            }
            let (Some(pending), Some(buffer)) = (slot.pending.take(), slot.buffer.as_ref())
            else {
                continue;
            };
            if pending.state.failed() {
                log::warn!("nearby tile {} could not be mapped", pending.ticket.serial);
                continue;
            }
            let rect = pending.rect;
            let used = u64::from(pending.bytes_per_row) * u64::from(rect.height);
            let data = buffer.slice(..used).get_mapped_range();
            let mut pixels = Vec::with_capacity(rect.area());
            for row in data.chunks_exact(pending.bytes_per_row as usize) {
                let texels = &row[..rect.width as usize * 4];
                pixels.extend(
                    texels
                        .chunks_exact(4)
                        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
                );
            }
            drop(data);
            buffer.unmap();
            out.push(TileReadback { ticket: pending.ticket, rect, pixels });
        }
        out
    }

    /// Forget every pending readback; their results are never delivered.
    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.pending.take().is_some() {
                if let Some(buffer) = slot.buffer.take() {
                    buffer.destroy();
                }
                slot.capacity = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(100), 512);
    }
}

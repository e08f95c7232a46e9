//! Scene-wide snap registry.
//!
//! The registry belongs to the host editor. The cache only reads it and
//! watches [`SnapRegistry::revision`] for changes.

use crate::snap::Snap;

/// Read access to the scene's registered snaps.
pub trait SnapRegistry {
    /// Registered snaps in registration order.
    fn snaps(&self) -> &[Snap];

    /// Whether global snapping is on.
    fn enabled(&self) -> bool;

    /// Change counter; differs after any mutation of the list or the
    /// enabled flag.
    fn revision(&self) -> u64;
}

/// In-memory [`SnapRegistry`].
#[derive(Debug, Clone)]
pub struct SnapList {
    snaps: Vec<Snap>,
    enabled: bool,
    revision: u64,
}

impl Default for SnapList {
    fn default() -> Self {
        Self { snaps: Vec::new(), enabled: true, revision: 0 }
    }
}

impl SnapList {
    /// Enabled registry holding `snaps`.
    #[must_use]
    pub fn new(snaps: Vec<Snap>) -> Self {
        Self { snaps, ..Self::default() }
    }

    /// Register a snap at the end of the list.
    pub fn push(&mut self, snap: Snap) {
        self.snaps.push(snap);
        self.revision += 1;
    }

    /// Remove and return the snap at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<Snap> {
        if index >= self.snaps.len() {
            return None;
        }
        self.revision += 1;
        Some(self.snaps.remove(index))
    }

    /// Replace the whole list.
    pub fn replace(&mut self, snaps: Vec<Snap>) {
        self.snaps = snaps;
        self.revision += 1;
    }

    /// Toggle global snapping.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.revision += 1;
        }
    }
}

impl SnapRegistry for SnapList {
    fn snaps(&self) -> &[Snap] {
        &self.snaps
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

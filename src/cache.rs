//! Geometry-Cache: pick proxies for every registered scene snap.
//!
//! The cache mirrors the registry's snap list and keeps one [`ProxySet`]
//! built from it. Proxy ids are registry-category ids whose index is the
//! snap's position in [`GeometryCache::all`], so a decoded id resolves
//! against the list the proxies were built from.

use crate::codec::{SnapCategory, SnapIdCodec};
use crate::error::SnapPickError;
use crate::proxy::vertex::{LineInstance, PlaneInstance, PointInstance};
use crate::proxy::{build_proxies, ProxyExtents, ProxySet};
use crate::registry::SnapRegistry;
use crate::snap::Snap;
use crate::viewport::PickViewport;

/// Registry snaps and their pick proxies.
#[derive(Debug)]
pub struct GeometryCache {
    codec: SnapIdCodec,
    extents: ProxyExtents,
    snaps: Vec<Snap>,
    proxies: ProxySet,
    enabled: bool,
    revision: u64,
    generation: u64,
}

impl GeometryCache {
    /// Build the cache from the registry's current contents.
    ///
    /// # Errors
    ///
    /// Fails when the registry holds a snap with no proxy form or more snaps
    /// than the codec can address.
    pub fn new(
        registry: &dyn SnapRegistry,
        viewport: &dyn PickViewport,
        codec: SnapIdCodec,
        extents: ProxyExtents,
    ) -> Result<Self, SnapPickError> {
        let snaps = registry.snaps().to_vec();
        let proxies = build_set(&snaps, viewport, codec, extents)?;
        log::debug!("snap cache built: {} snaps", snaps.len());
        Ok(Self {
            codec,
            extents,
            snaps,
            proxies,
            enabled: registry.enabled(),
            revision: registry.revision(),
            generation: 0,
        })
    }

    /// Pick up registry changes. Returns whether the proxies were rebuilt.
    ///
    /// The enabled flag is mirrored on every call. On a rebuild the new set
    /// is installed before the old one is disposed.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`]. On error the previous proxies stay installed.
    pub fn sync(
        &mut self,
        registry: &dyn SnapRegistry,
        viewport: &dyn PickViewport,
    ) -> Result<bool, SnapPickError> {
        self.enabled = registry.enabled();
        if registry.revision() == self.revision && !self.proxies.is_disposed() {
            return Ok(false);
        }
        let snaps = registry.snaps().to_vec();
        let proxies = build_set(&snaps, viewport, self.codec, self.extents)?;
        let mut old = std::mem::replace(&mut self.proxies, proxies);
        self.snaps = snaps;
        old.dispose();
        self.revision = registry.revision();
        self.generation += 1;
        log::debug!(
            "snap cache rebuilt: {} snaps (generation {})",
            self.snaps.len(),
            self.generation
        );
        Ok(true)
    }

    /// Registry snaps, indexed by the ids in [`Self::proxies`].
    #[must_use]
    pub fn all(&self) -> &[Snap] {
        &self.snaps
    }

    /// Snap at list position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Snap> {
        self.snaps.get(index)
    }

    /// Current proxy set.
    #[must_use]
    pub const fn proxies(&self) -> &ProxySet {
        &self.proxies
    }

    /// Point proxies.
    #[must_use]
    pub fn points(&self) -> &[PointInstance] {
        self.proxies.points()
    }

    /// Axis proxies.
    #[must_use]
    pub fn lines(&self) -> &[LineInstance] {
        self.proxies.lines()
    }

    /// Plane proxies.
    #[must_use]
    pub fn planes(&self) -> &[PlaneInstance] {
        self.proxies.planes()
    }

    /// Global snapping flag as of the last [`Self::sync`].
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Number of rebuilds since construction.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Release the proxies. The next [`Self::sync`] rebuilds them.
    pub fn dispose(&mut self) {
        self.proxies.dispose();
    }
}

fn build_set(
    snaps: &[Snap],
    viewport: &dyn PickViewport,
    codec: SnapIdCodec,
    extents: ProxyExtents,
) -> Result<ProxySet, SnapPickError> {
    let geometry = build_proxies(snaps, extents, |index| {
        codec.encode(SnapCategory::Registry, index)
    })?;
    Ok(ProxySet::new("snap cache", geometry, viewport))
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::registry::SnapList;
    use crate::renderer::software::test_viewport;

    fn cache_for(list: &SnapList) -> GeometryCache {
        let viewport = test_viewport();
        GeometryCache::new(list, &viewport, SnapIdCodec::Production, ProxyExtents::default())
            .unwrap()
    }

    #[test]
    fn mirrors_registry_order() {
        let list = SnapList::new(vec![
            Snap::point(Vec3::X),
            Snap::axis(Vec3::ZERO, Vec3::Y),
            Snap::point(Vec3::Y),
        ]);
        let cache = cache_for(&list);
        assert_eq!(cache.all(), list.snaps());
        assert_eq!(cache.points().len(), 2);
        assert_eq!(cache.lines().len(), 1);
        for (i, snap) in cache.all().iter().enumerate() {
            let id = SnapIdCodec::Production
                .encode(SnapCategory::Registry, i)
                .unwrap();
            let in_points = cache.points().iter().any(|p| p.id == id.raw());
            let in_lines = cache.lines().iter().any(|l| l.id == id.raw());
            assert_eq!(in_points, snap.as_point().is_some());
            assert_eq!(in_lines, !in_points);
        }
    }

    #[test]
    fn sync_rebuilds_only_on_change() {
        let mut list = SnapList::new(vec![Snap::point(Vec3::ZERO)]);
        let viewport = test_viewport();
        let mut cache = cache_for(&list);
        assert!(!cache.sync(&list, &viewport).unwrap());
        assert_eq!(cache.generation(), 0);

        list.push(Snap::point(Vec3::X));
        assert!(cache.sync(&list, &viewport).unwrap());
        assert_eq!(cache.generation(), 1);
        assert_eq!(cache.all().len(), 2);
        assert_eq!(cache.points().len(), 2);
    }

    #[test]
    fn enabled_flag_is_mirrored_without_rebuild_side_effects() {
        let mut list = SnapList::new(vec![Snap::point(Vec3::ZERO)]);
        let viewport = test_viewport();
        let mut cache = cache_for(&list);
        list.set_enabled(false);
        let _ = cache.sync(&list, &viewport).unwrap();
        assert!(!cache.enabled());
        assert_eq!(cache.all().len(), 1);
    }

    #[test]
    fn removed_snap_is_no_longer_pickable() {
        let mut list = SnapList::new(vec![Snap::point(Vec3::ZERO)]);
        let mut viewport = test_viewport();
        let mut cache = cache_for(&list);
        viewport.set_cursor(Vec2::ZERO);
        let before = viewport.pick(&[cache.proxies()]).unwrap();
        assert!(before.is_some());

        list.replace(vec![Snap::point(Vec3::new(150.0, 150.0, 0.0))]);
        let _ = cache.sync(&list, &viewport).unwrap();
        assert!(viewport.pick(&[cache.proxies()]).unwrap().is_none());
    }

    #[test]
    fn dispose_then_sync_rebuilds() {
        let list = SnapList::new(vec![Snap::point(Vec3::ZERO)]);
        let viewport = test_viewport();
        let mut cache = cache_for(&list);
        cache.dispose();
        cache.dispose();
        assert!(cache.points().is_empty());
        assert!(cache.sync(&list, &viewport).unwrap());
        assert_eq!(cache.points().len(), 1);
    }

    #[test]
    fn unsupported_snap_fails_the_build() {
        let list = SnapList::new(vec![Snap::point(Vec3::ZERO)]);
        let viewport = test_viewport();
        let mut cache = cache_for(&list);
        let curve: std::sync::Arc<dyn crate::snap::model::CurveModel> =
            std::sync::Arc::new(StraightX);
        let mut bad = list.clone();
        bad.push(Snap::Curve(crate::snap::CurveSnap::new(
            crate::codec::GeometryId::curve(1),
            &curve,
        )));
        assert!(cache.sync(&bad, &viewport).is_err());
        // previous proxies survive a failed rebuild
        assert_eq!(cache.points().len(), 1);
    }

    struct StraightX;

    impl crate::snap::model::CurveModel for StraightX {
        fn closest_point(&self, point: Vec3) -> (Vec3, Vec3) {
            (Vec3::new(point.x, 0.0, 0.0), Vec3::X)
        }
    }
}

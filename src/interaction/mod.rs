//! Interaction Adapter: resolves the cursor into a snap for one gesture.
//!
//! The adapter owns an ephemeral [`ProxySet`] built from the interaction's
//! own snaps and merges it with the scene-wide [`GeometryCache`] and the
//! visible objects' pick proxies. Resolution follows a fixed priority:
//!
//! 1. snapping disabled: project onto the construction plane;
//! 2. an active choice axis: intersect that axis only;
//! 3. an exact pixel pick across the merged layers;
//! 4. nothing hit: project onto the construction plane.
//!
//! Every successful result goes through [`Snap::project`].

pub mod context;
pub mod model;

use glam::Vec2;

pub use self::context::{DomainObject, GeometryDatabase, PickContext, PickResult, TopologyItem};
pub use self::model::{ActiveInteraction, PointPickerModel};
use crate::codec::{is_geometry, GeometryId, PickId, SnapCategory, SnapIdCodec, TopologyKind};
use crate::error::SnapPickError;
use crate::nearby::NearbyPicker;
use crate::options::Options;
use crate::proxy::{build_proxies, ProxyExtents, ProxySet};
use crate::snap::{CurveSnap, EdgeSnap, FaceSnap, PlaneSnap, PointSnap, Snap};
use crate::viewport::cursor_ray;

/// Per-interaction pick orchestration.
#[derive(Debug)]
pub struct InteractionAdapter {
    codec: SnapIdCodec,
    extents: ProxyExtents,
    local_snaps: Vec<Snap>,
    local: Option<ProxySet>,
    restricted: bool,
    synced: Option<(u64, u64)>,
    nearby: NearbyPicker,
    epoch: u64,
}

impl InteractionAdapter {
    /// Adapter using `codec` for interaction-local ids and `options` for
    /// proxy sizes.
    #[must_use]
    pub fn new(codec: SnapIdCodec, options: &Options) -> Self {
        Self {
            codec,
            extents: options.extents(),
            local_snaps: Vec::new(),
            local: None,
            restricted: false,
            synced: None,
            nearby: NearbyPicker::new(
                options.snapping.nearby_radius,
                options.snapping.nearby_point_size,
            ),
            epoch: 0,
        }
    }

    /// Move the cursor (normalized device coordinates).
    pub fn set_cursor(&self, ctx: &mut PickContext<'_>, ndc: Vec2) {
        ctx.viewport.set_cursor(ndc);
    }

    /// Snaps the ephemeral proxies were built from; interaction-local ids
    /// index into this list.
    #[must_use]
    pub fn local_snaps(&self) -> &[Snap] {
        &self.local_snaps
    }

    /// Ephemeral proxy set, absent while a choice is active.
    #[must_use]
    pub const fn local_proxies(&self) -> Option<&ProxySet> {
        self.local.as_ref()
    }

    /// Counter identifying the current proxy layers.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Rebuild the ephemeral proxies if the interaction or the cache changed.
    /// Returns whether a rebuild happened.
    ///
    /// # Errors
    ///
    /// Fails when an interaction snap has no proxy form or the list exceeds
    /// the codec's range. The previous proxies stay installed.
    pub fn sync(&mut self, ctx: &PickContext<'_>) -> Result<bool, SnapPickError> {
        let key = (ctx.interaction.revision(), ctx.cache.generation());
        if self.synced == Some(key) {
            return Ok(false);
        }

        let interaction = ctx.interaction;
        let (snaps, restricted) = if interaction.choice().is_some() {
            (Vec::new(), false)
        } else if !interaction.restriction_snaps().is_empty() {
            (interaction.restriction_snaps().to_vec(), true)
        } else {
            (interaction.snaps().to_vec(), false)
        };

        let local = if interaction.choice().is_some() {
            None
        } else {
            let codec = self.codec;
            let geometry = build_proxies(&snaps, self.extents, |index| {
                codec.encode(SnapCategory::Interaction, index)
            })?;
            Some(ProxySet::new("interaction snaps", geometry, &*ctx.viewport))
        };

        let old = std::mem::replace(&mut self.local, local);
        if let Some(mut old) = old {
            old.dispose();
        }
        self.local_snaps = snaps;
        self.restricted = restricted;
        self.synced = Some(key);
        self.epoch += 1;
        log::debug!(
            "interaction proxies rebuilt: {} snaps, restricted={}, epoch {}",
            self.local_snaps.len(),
            self.restricted,
            self.epoch
        );
        Ok(true)
    }

    /// Resolve the cursor into a snap with a precise position.
    ///
    /// `Ok(None)` only when a choice axis is active and the cursor ray has no
    /// closest approach to it.
    ///
    /// # Errors
    ///
    /// [`SnapPickError::Readback`] when the viewport cannot read its id
    /// buffer back. Invariant violations: the construction plane cannot be hit
    /// ([`SnapPickError::ConstructionPlaneMiss`]), a picked id resolves to
    /// nothing ([`SnapPickError::UnknownId`],
    /// [`SnapPickError::InvalidSnapTarget`]), or a geometry snap outlived
    /// its model. Rebuild errors from [`Self::sync`] also propagate.
    pub fn intersect(
        &mut self,
        ctx: &mut PickContext<'_>,
    ) -> Result<Option<PickResult>, SnapPickError> {
        let _ = self.sync(ctx)?;
        let ray = cursor_ray(&*ctx.viewport);

        if !ctx.cache.enabled() {
            return self.project_on_construction_plane(ctx).map(Some);
        }

        if let Some(axis) = ctx.interaction.choice() {
            return match axis.intersect(&ray) {
                Some(approx) => finish(Snap::Axis(*axis), approx).map(Some),
                None => Ok(None),
            };
        }

        let hit = {
            let mut layers: Vec<&ProxySet> = Vec::new();
            layers.extend(self.local.as_ref());
            if !self.restricted {
                layers.push(ctx.cache.proxies());
                layers.extend(ctx.db.visible_pickers());
            }
            ctx.viewport.pick(&layers)?
        };

        match hit {
            Some(hit) => {
                log::trace!("pick hit id {:#x}", hit.id.raw());
                let snap = self.resolve(hit.id, ctx)?;
                finish(snap, hit.position).map(Some)
            }
            None => self.project_on_construction_plane(ctx).map(Some),
        }
    }

    /// Point snaps within the nearby radius of the cursor, ascending by id.
    ///
    /// Renders a fresh tile and returns the most recent completed answer, so
    /// results trail the cursor by a frame. Empty while snapping is disabled
    /// or a choice is active.
    ///
    /// # Errors
    ///
    /// [`SnapPickError::NotAPoint`] if a point-only readback decodes to
    /// another snap variant, [`SnapPickError::UnknownId`] if it decodes to
    /// nothing. Rebuild errors from [`Self::sync`] also propagate.
    pub fn nearby(
        &mut self,
        ctx: &mut PickContext<'_>,
    ) -> Result<Vec<PointSnap>, SnapPickError> {
        let _ = self.sync(ctx)?;
        if !ctx.cache.enabled() || ctx.interaction.choice().is_some() {
            return Ok(Vec::new());
        }

        let _ = self.nearby.poll(&mut *ctx.viewport, self.epoch);
        {
            // restrictions limit the exact pick only
            let mut layers: Vec<&ProxySet> = Vec::new();
            layers.extend(self.local.as_ref());
            layers.push(ctx.cache.proxies());
            let _ = self.nearby.request(&mut *ctx.viewport, self.epoch, &layers);
        }

        let ctx: &PickContext<'_> = ctx;
        self.nearby
            .current()
            .iter()
            .map(|&id| match self.resolve_snap_id(id, ctx)? {
                Snap::Point(point) => Ok(*point),
                _ => Err(SnapPickError::NotAPoint(id)),
            })
            .collect()
    }

    /// Release the ephemeral proxies and invalidate pending nearby tiles.
    /// Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if let Some(mut local) = self.local.take() {
            local.dispose();
        }
        self.local_snaps.clear();
        self.synced = None;
        self.nearby.reset();
    }

    fn project_on_construction_plane(
        &self,
        ctx: &PickContext<'_>,
    ) -> Result<PickResult, SnapPickError> {
        let viewport_plane: PlaneSnap = ctx.viewport.construction_plane();
        let is_ortho = ctx.viewport.camera().is_ortho();
        let plane = ctx
            .interaction
            .actual_construction_plane(&viewport_plane, is_ortho);
        let approx = plane
            .intersect(&cursor_ray(&*ctx.viewport))
            .ok_or(SnapPickError::ConstructionPlaneMiss)?;
        finish(Snap::ConstructionPlane(plane), approx)
    }

    fn resolve(&self, id: PickId, ctx: &PickContext<'_>) -> Result<Snap, SnapPickError> {
        if !is_geometry(id) {
            return self.resolve_snap_id(id, ctx).cloned();
        }
        let gid = GeometryId::decode(id).ok_or(SnapPickError::UnknownId(id))?;
        let invalid = SnapPickError::InvalidSnapTarget(gid);
        match gid.kind {
            TopologyKind::Face => match ctx.db.lookup_topology_item(gid) {
                Some(TopologyItem::Face(surface)) => {
                    Ok(Snap::Face(FaceSnap::new(gid, &surface)))
                }
                _ => Err(invalid),
            },
            TopologyKind::Edge => match ctx.db.lookup_topology_item(gid) {
                Some(TopologyItem::Edge(curve)) => {
                    Ok(Snap::Edge(EdgeSnap::new(gid, &curve)))
                }
                _ => Err(invalid),
            },
            TopologyKind::Curve => match ctx.db.lookup(gid) {
                Some(DomainObject::Curve(curve)) => {
                    Ok(Snap::Curve(CurveSnap::new(gid, &curve)))
                }
                _ => Err(invalid),
            },
        }
    }

    fn resolve_snap_id<'s>(
        &'s self,
        id: PickId,
        ctx: &'s PickContext<'_>,
    ) -> Result<&'s Snap, SnapPickError> {
        let snap = match self.codec.decode(id) {
            Some((SnapCategory::Registry, index)) => ctx.cache.get(index),
            Some((SnapCategory::Interaction, index)) => self.local_snaps.get(index),
            None => None,
        };
        snap.ok_or(SnapPickError::UnknownId(id))
    }
}

fn finish(snap: Snap, approx: glam::Vec3) -> Result<PickResult, SnapPickError> {
    let projection = snap.project(approx)?;
    Ok(PickResult {
        snap,
        position: projection.position,
        orientation: projection.orientation,
    })
}

//! Collaborators borrowed for one pick call, and what a pick returns.

use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::cache::GeometryCache;
use crate::codec::GeometryId;
use crate::proxy::ProxySet;
use crate::snap::model::{CurveModel, SurfaceModel};
use crate::snap::Snap;
use crate::viewport::PickViewport;

use super::model::ActiveInteraction;

/// A scene object the geometry kernel hands back for a geometry id.
#[derive(Clone)]
pub enum DomainObject {
    /// A free-standing curve.
    Curve(Arc<dyn CurveModel>),
    /// A solid; only its topology items are snappable.
    Solid,
}

/// A topological item inside a solid.
#[derive(Clone)]
pub enum TopologyItem {
    /// A face with its surface.
    Face(Arc<dyn SurfaceModel>),
    /// An edge with its curve.
    Edge(Arc<dyn CurveModel>),
}

/// Read access to the scene's geometry.
pub trait GeometryDatabase {
    /// Object named by `id`'s owning object.
    fn lookup(&self, id: GeometryId) -> Option<DomainObject>;

    /// Face or edge named by `id`.
    fn lookup_topology_item(&self, id: GeometryId) -> Option<TopologyItem>;

    /// Pick proxies of every visible object, tagged with geometry ids.
    fn visible_pickers(&self) -> Vec<&ProxySet>;
}

/// Everything [`InteractionAdapter`](super::InteractionAdapter) borrows for
/// one call.
pub struct PickContext<'a> {
    /// Host view.
    pub viewport: &'a mut dyn PickViewport,
    /// Scene-wide snap proxies.
    pub cache: &'a GeometryCache,
    /// The gesture being performed.
    pub interaction: &'a dyn ActiveInteraction,
    /// Scene geometry.
    pub db: &'a dyn GeometryDatabase,
}

/// A resolved pick.
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    /// What the cursor resolved to.
    pub snap: Snap,
    /// Exact position on the snap.
    pub position: Vec3,
    /// Frame whose +Z is the snap's normal or tangent.
    pub orientation: Quat,
}

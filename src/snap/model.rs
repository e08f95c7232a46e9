//! Domain-model queries that geometry-backed snaps delegate to.
//!
//! The geometry kernel owns these objects; snaps only keep `Weak` handles
//! to them and never extend their lifetime.

use glam::Vec3;

/// A surface a face snap can project onto.
pub trait SurfaceModel {
    /// Closest point on the surface to `point`, with the unit surface normal
    /// there.
    fn closest_point(&self, point: Vec3) -> (Vec3, Vec3);
}

/// A curve an edge or curve snap can project onto.
pub trait CurveModel {
    /// Closest point on the curve to `point`, with the unit tangent there.
    fn closest_point(&self, point: Vec3) -> (Vec3, Vec3);
}

//! Snap entities: the things a cursor can pick as a precise reference.
//!
//! A [`Snap`] is a closed sum type. Constraint snaps (points, axes, planes)
//! carry their own geometry; geometry-backed snaps (faces, edges, curves)
//! hold a [`GeometryId`] plus a non-owning handle to the domain model that
//! answers nearest-point queries.
//!
//! Every snap turns an approximate position (a ray hit, which is only as
//! precise as the depth buffer) into the exact position and orientation the
//! snap defines via [`Snap::project`].

pub mod model;
pub mod ray;

use std::fmt;
use std::sync::{Arc, Weak};

use glam::{Quat, Vec3};

use self::model::{CurveModel, SurfaceModel};
use self::ray::Ray;
use crate::codec::GeometryId;
use crate::error::SnapPickError;

/// Precise position and frame returned by [`Snap::project`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Exact position on the snap.
    pub position: Vec3,
    /// Rotation taking +Z onto the snap's normal or tangent.
    pub orientation: Quat,
}

/// Rotation taking +Z onto `direction`.
fn frame_along(direction: Vec3) -> Quat {
    let direction = direction.try_normalize().unwrap_or(Vec3::Z);
    Quat::from_rotation_arc(Vec3::Z, direction)
}

/// A single fixed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSnap {
    /// World-space position.
    pub position: Vec3,
}

impl PointSnap {
    /// Point snap at `position`.
    #[must_use]
    pub const fn new(position: Vec3) -> Self {
        Self { position }
    }
}

/// An infinite constraint line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSnap {
    /// A point on the axis; proxies start here.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl AxisSnap {
    /// Axis through `origin` along `direction` (normalized here).
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(Vec3::Z),
        }
    }

    /// Frame whose +Z follows the axis.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        frame_along(self.direction)
    }

    /// Nearest point on the axis to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        self.origin + self.direction * (point - self.origin).dot(self.direction)
    }

    /// Point on the axis closest to the cursor ray.
    ///
    /// `None` when the ray runs parallel to the axis or the closest approach
    /// lies behind the ray origin.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        let (t, s) = ray.closest_to_line(self.origin, self.direction)?;
        (t >= 0.0).then(|| self.origin + self.direction * s)
    }
}

/// An infinite plane, used both as a snap and as the fallback projection
/// surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSnap {
    /// A point on the plane; the proxy quad is centered here.
    pub origin: Vec3,
    /// Unit normal.
    pub normal: Vec3,
}

impl PlaneSnap {
    /// Plane through `origin` with `normal` (normalized here).
    #[must_use]
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        Self {
            origin,
            normal: normal.try_normalize().unwrap_or(Vec3::Z),
        }
    }

    /// The world XY plane.
    #[must_use]
    pub fn xy() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }

    /// The same plane moved to pass through `point`.
    #[must_use]
    pub fn through(&self, point: Vec3) -> Self {
        Self { origin: point, normal: self.normal }
    }

    /// Frame whose +Z is the plane normal.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        frame_along(self.normal)
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * (point - self.origin).dot(self.normal)
    }

    /// Where the cursor ray meets the plane.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        ray.intersect_plane(self.origin, self.normal).map(|t| ray.at(t))
    }
}

/// A face of a solid, resolved from a geometry pick.
#[derive(Clone)]
pub struct FaceSnap {
    /// Pick identity of the face.
    pub id: GeometryId,
    surface: Weak<dyn SurfaceModel>,
}

impl FaceSnap {
    /// Face snap referring to `surface` without owning it.
    #[must_use]
    pub fn new(id: GeometryId, surface: &Arc<dyn SurfaceModel>) -> Self {
        Self { id, surface: Arc::downgrade(surface) }
    }

    fn project(&self, approximate: Vec3) -> Result<Projection, SnapPickError> {
        let surface = self
            .surface
            .upgrade()
            .ok_or(SnapPickError::DanglingGeometry(self.id))?;
        let (position, normal) = surface.closest_point(approximate);
        Ok(Projection { position, orientation: frame_along(normal) })
    }
}

/// An edge of a solid, resolved from a geometry pick.
#[derive(Clone)]
pub struct EdgeSnap {
    /// Pick identity of the edge.
    pub id: GeometryId,
    curve: Weak<dyn CurveModel>,
}

impl EdgeSnap {
    /// Edge snap referring to `curve` without owning it.
    #[must_use]
    pub fn new(id: GeometryId, curve: &Arc<dyn CurveModel>) -> Self {
        Self { id, curve: Arc::downgrade(curve) }
    }
}

/// A free-standing curve object, resolved from a geometry pick.
#[derive(Clone)]
pub struct CurveSnap {
    /// Pick identity of the curve.
    pub id: GeometryId,
    curve: Weak<dyn CurveModel>,
}

impl CurveSnap {
    /// Curve snap referring to `curve` without owning it.
    #[must_use]
    pub fn new(id: GeometryId, curve: &Arc<dyn CurveModel>) -> Self {
        Self { id, curve: Arc::downgrade(curve) }
    }
}

fn project_curve(
    id: GeometryId,
    curve: &Weak<dyn CurveModel>,
    approximate: Vec3,
) -> Result<Projection, SnapPickError> {
    let curve = curve.upgrade().ok_or(SnapPickError::DanglingGeometry(id))?;
    let (position, tangent) = curve.closest_point(approximate);
    Ok(Projection { position, orientation: frame_along(tangent) })
}

macro_rules! geometry_snap_traits {
    ($ty:ident, $field:ident) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("id", &self.id)
                    .field("live", &(self.$field.strong_count() > 0))
                    .finish()
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id && Weak::ptr_eq(&self.$field, &other.$field)
            }
        }
    };
}

geometry_snap_traits!(FaceSnap, surface);
geometry_snap_traits!(EdgeSnap, curve);
geometry_snap_traits!(CurveSnap, curve);

/// Anything the cursor can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum Snap {
    /// A fixed point.
    Point(PointSnap),
    /// An infinite constraint line.
    Axis(AxisSnap),
    /// A plane snap.
    Plane(PlaneSnap),
    /// A construction plane (also the fallback projection surface).
    ConstructionPlane(PlaneSnap),
    /// A face of visible geometry.
    Face(FaceSnap),
    /// An edge of visible geometry.
    Edge(EdgeSnap),
    /// A visible curve object.
    Curve(CurveSnap),
}

impl Snap {
    /// Point snap at `position`.
    #[must_use]
    pub const fn point(position: Vec3) -> Self {
        Self::Point(PointSnap::new(position))
    }

    /// Axis snap through `origin` along `direction`.
    #[must_use]
    pub fn axis(origin: Vec3, direction: Vec3) -> Self {
        Self::Axis(AxisSnap::new(origin, direction))
    }

    /// Construction plane through `origin` with `normal`.
    #[must_use]
    pub fn construction_plane(origin: Vec3, normal: Vec3) -> Self {
        Self::ConstructionPlane(PlaneSnap::new(origin, normal))
    }

    /// Variant name, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::Axis(_) => "Axis",
            Self::Plane(_) => "Plane",
            Self::ConstructionPlane(_) => "ConstructionPlane",
            Self::Face(_) => "Face",
            Self::Edge(_) => "Edge",
            Self::Curve(_) => "Curve",
        }
    }

    /// The point snap inside, if this is one.
    #[must_use]
    pub const fn as_point(&self) -> Option<&PointSnap> {
        match self {
            Self::Point(p) => Some(p),
            _ => None,
        }
    }

    /// Turn an approximate position into the snap's exact position and
    /// frame.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::DanglingGeometry`] when a geometry-backed
    /// snap's domain model has been dropped by its owner.
    pub fn project(&self, approximate: Vec3) -> Result<Projection, SnapPickError> {
        Ok(match self {
            Self::Point(p) => Projection {
                position: p.position,
                orientation: Quat::IDENTITY,
            },
            Self::Axis(axis) => Projection {
                position: axis.closest_point(approximate),
                orientation: axis.orientation(),
            },
            Self::Plane(plane) | Self::ConstructionPlane(plane) => Projection {
                position: plane.closest_point(approximate),
                orientation: plane.orientation(),
            },
            Self::Face(face) => face.project(approximate)?,
            Self::Edge(edge) => project_curve(edge.id, &edge.curve, approximate)?,
            Self::Curve(curve) => {
                project_curve(curve.id, &curve.curve, approximate)?
            }
        })
    }
}

//! Snap list to proxy geometry.

use crate::codec::PickId;
use crate::error::SnapPickError;
use crate::snap::Snap;

use super::{ProxyExtents, ProxyGeometry};

/// Build proxy geometry for `snaps`, tagging each primitive with the id
/// `id_for(index)` returns for that snap's position in the list.
///
/// Points become sprites, axes become segments running `axis_length` from
/// their origin, and planes (including construction planes) become quads.
///
/// # Errors
///
/// Returns [`SnapPickError::UnsupportedProxy`] for geometry-backed snaps,
/// which are picked through their owning object's own proxies, and
/// propagates any error from `id_for`.
pub fn build_proxies<F>(
    snaps: &[Snap],
    extents: ProxyExtents,
    mut id_for: F,
) -> Result<ProxyGeometry, SnapPickError>
where
    F: FnMut(usize) -> Result<PickId, SnapPickError>,
{
    let mut geometry = ProxyGeometry::default();
    for (index, snap) in snaps.iter().enumerate() {
        let id = id_for(index)?;
        match snap {
            Snap::Point(p) => geometry.push_point(p.position, id),
            Snap::Axis(axis) => geometry.push_segment(
                axis.origin,
                axis.origin + axis.direction * extents.axis_length,
                id,
            ),
            Snap::Plane(plane) | Snap::ConstructionPlane(plane) => {
                geometry.push_plane(plane.origin, plane.normal, id);
            }
            Snap::Face(_) | Snap::Edge(_) | Snap::Curve(_) => {
                return Err(SnapPickError::UnsupportedProxy(snap.kind()));
            }
        }
    }
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::codec::{GeometryId, SnapCategory, SnapIdCodec};
    use crate::snap::model::CurveModel;
    use crate::snap::CurveSnap;

    struct Line;

    impl CurveModel for Line {
        fn closest_point(&self, point: Vec3) -> (Vec3, Vec3) {
            (Vec3::new(point.x, 0.0, 0.0), Vec3::X)
        }
    }

    fn registry_ids(index: usize) -> Result<PickId, SnapPickError> {
        SnapIdCodec::Production.encode(SnapCategory::Registry, index)
    }

    #[test]
    fn one_primitive_per_snap_in_list_order() {
        let snaps = vec![
            Snap::point(Vec3::ONE),
            Snap::axis(Vec3::ZERO, Vec3::Y),
            Snap::construction_plane(Vec3::ZERO, Vec3::Z),
            Snap::point(Vec3::X),
        ];
        let geometry =
            build_proxies(&snaps, ProxyExtents::default(), registry_ids).unwrap();
        assert_eq!(geometry.points.len(), 2);
        assert_eq!(geometry.points[0].id, 1);
        assert_eq!(geometry.lines[0].id, 2);
        assert_eq!(geometry.planes[0].id, 3);
        assert_eq!(geometry.points[1].id, 4);
    }

    #[test]
    fn axis_spans_the_configured_length() {
        let snaps = vec![Snap::axis(Vec3::new(1.0, 0.0, 0.0), Vec3::Z)];
        let extents = ProxyExtents { axis_length: 250.0, plane_half_size: 1.0 };
        let geometry = build_proxies(&snaps, extents, registry_ids).unwrap();
        let line = geometry.lines[0];
        assert_eq!(line.start, [1.0, 0.0, 0.0]);
        assert_eq!(line.end, [1.0, 0.0, 250.0]);
    }

    #[test]
    fn geometry_backed_snaps_are_rejected() {
        let curve: Arc<dyn CurveModel> = Arc::new(Line);
        let snaps = vec![Snap::Curve(CurveSnap::new(GeometryId::curve(1), &curve))];
        let err = build_proxies(&snaps, ProxyExtents::default(), registry_ids)
            .unwrap_err();
        assert!(matches!(err, SnapPickError::UnsupportedProxy("Curve")));
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn exhausted_id_space_propagates() {
        let snaps = vec![Snap::point(Vec3::ZERO)];
        let err = build_proxies(&snaps, ProxyExtents::default(), |_| {
            SnapIdCodec::Production.encode(SnapCategory::Registry, usize::MAX)
        })
        .unwrap_err();
        assert!(matches!(err, SnapPickError::IdSpaceExhausted { .. }));
    }
}

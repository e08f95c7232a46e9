//! Per-interaction snap state.

use glam::{Quat, Vec3};

use crate::snap::{AxisSnap, PlaneSnap, Snap};

/// What the active interaction contributes to the next pick.
pub trait ActiveInteraction {
    /// Extra snaps offered only during this interaction.
    fn snaps(&self) -> &[Snap];

    /// When non-empty, the only snaps the next pick may resolve to.
    fn restriction_snaps(&self) -> &[Snap];

    /// Axis the next pick must resolve against, if one is active.
    fn choice(&self) -> Option<&AxisSnap>;

    /// Plane to project onto when nothing is hit, given the viewport's own
    /// construction plane.
    fn actual_construction_plane(&self, viewport_plane: &PlaneSnap, is_ortho: bool) -> PlaneSnap;

    /// Change counter; differs after any change to the values above.
    fn revision(&self) -> u64;
}

/// Snap state of a point-picking gesture.
#[derive(Debug, Clone, Default)]
pub struct PointPickerModel {
    snaps: Vec<Snap>,
    restrictions: Vec<Snap>,
    choice: Option<AxisSnap>,
    preferred_plane: Option<PlaneSnap>,
    plane_through: Option<(Vec3, Quat)>,
    revision: u64,
}

impl PointPickerModel {
    /// Empty model: no extra snaps, no restrictions, no choice.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an extra snap for this interaction.
    pub fn add_snap(&mut self, snap: Snap) {
        self.snaps.push(snap);
        self.revision += 1;
    }

    /// Drop every extra snap.
    pub fn clear_snaps(&mut self) {
        self.snaps.clear();
        self.revision += 1;
    }

    /// Limit the next pick to `snaps`, replacing any plane-through-point
    /// restriction.
    pub fn restrict_to(&mut self, snaps: Vec<Snap>) {
        self.restrictions = snaps;
        self.plane_through = None;
        self.revision += 1;
    }

    /// Lift every restriction, including a plane-through-point override.
    pub fn clear_restrictions(&mut self) {
        self.restrictions.clear();
        self.plane_through = None;
        self.revision += 1;
    }

    /// Restrict picking to the plane through `point` whose normal is the
    /// +Z axis of `orientation`.
    ///
    /// The same plane becomes the projection surface. In orthographic views
    /// the viewport's own plane normal is kept and only moved through
    /// `point`.
    pub fn restrict_to_plane_through_point(&mut self, point: Vec3, orientation: Quat) {
        let plane = PlaneSnap::new(point, orientation * Vec3::Z);
        self.restrictions = vec![Snap::Plane(plane)];
        self.plane_through = Some((point, orientation));
        self.revision += 1;
    }

    /// Project onto `plane` instead of the viewport plane when nothing else
    /// applies.
    pub fn set_preferred_plane(&mut self, plane: Option<PlaneSnap>) {
        self.preferred_plane = plane;
        self.revision += 1;
    }

    /// Constrain the next pick to `axis`.
    pub fn activate_choice(&mut self, axis: AxisSnap) {
        self.choice = Some(axis);
        self.revision += 1;
    }

    /// Drop the active choice.
    pub fn clear_choice(&mut self) {
        self.choice = None;
        self.revision += 1;
    }
}

impl ActiveInteraction for PointPickerModel {
    fn snaps(&self) -> &[Snap] {
        &self.snaps
    }

    fn restriction_snaps(&self) -> &[Snap] {
        &self.restrictions
    }

    fn choice(&self) -> Option<&AxisSnap> {
        self.choice.as_ref()
    }

    fn actual_construction_plane(&self, viewport_plane: &PlaneSnap, is_ortho: bool) -> PlaneSnap {
        let base = self.preferred_plane.unwrap_or(*viewport_plane);
        match self.plane_through {
            Some((point, _)) if is_ortho => base.through(point),
            Some((point, orientation)) => PlaneSnap::new(point, orientation * Vec3::Z),
            None => base,
        }
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_bump_revision() {
        let mut model = PointPickerModel::new();
        let mut last = model.revision();
        let mut check = |model: &PointPickerModel| {
            assert_ne!(model.revision(), last);
            last = model.revision();
        };
        model.add_snap(Snap::point(Vec3::ZERO));
        check(&model);
        model.restrict_to(vec![Snap::point(Vec3::X)]);
        check(&model);
        model.activate_choice(AxisSnap::new(Vec3::ZERO, Vec3::X));
        check(&model);
        model.clear_choice();
        check(&model);
        model.clear_restrictions();
        check(&model);
    }

    #[test]
    fn plane_through_point_depends_on_projection() {
        let mut model = PointPickerModel::new();
        let tilted = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let point = Vec3::new(1.0, 2.0, 3.0);
        model.restrict_to_plane_through_point(point, tilted);
        assert_eq!(model.restriction_snaps().len(), 1);

        let viewport = PlaneSnap::xy();
        let ortho = model.actual_construction_plane(&viewport, true);
        assert_eq!(ortho.origin, point);
        assert_eq!(ortho.normal, Vec3::Z);

        let persp = model.actual_construction_plane(&viewport, false);
        assert_eq!(persp.origin, point);
        assert!(persp.normal.abs_diff_eq(tilted * Vec3::Z, 1e-6));
    }

    #[test]
    fn new_restrictions_drop_the_plane_through_point() {
        let mut model = PointPickerModel::new();
        model.restrict_to_plane_through_point(Vec3::new(0.0, 0.0, 7.0), Quat::IDENTITY);
        model.restrict_to(vec![Snap::point(Vec3::X)]);
        let viewport = PlaneSnap::xy();
        assert_eq!(model.actual_construction_plane(&viewport, true), viewport);
        assert_eq!(model.actual_construction_plane(&viewport, false), viewport);
    }

    #[test]
    fn preferred_plane_replaces_viewport_plane() {
        let mut model = PointPickerModel::new();
        let preferred = PlaneSnap::new(Vec3::ZERO, Vec3::X);
        model.set_preferred_plane(Some(preferred));
        assert_eq!(model.actual_construction_plane(&PlaneSnap::xy(), false), preferred);
        model.set_preferred_plane(None);
        assert_eq!(model.actual_construction_plane(&PlaneSnap::xy(), false), PlaneSnap::xy());
    }
}

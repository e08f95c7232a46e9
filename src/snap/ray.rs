//! Cursor rays and the closed-form intersections snaps need.

use glam::Vec3;

const PARALLEL_EPSILON: f32 = 1e-6;

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the ray (on the near plane for cursor rays).
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Ray from `origin` along `direction` (normalized here).
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Parameter of the orthogonal projection of `point` onto the ray's line.
    #[must_use]
    pub fn parameter_of(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.direction)
    }

    /// Intersection parameter with the plane through `origin` with `normal`.
    ///
    /// `None` when the ray runs parallel to the plane or the plane lies
    /// behind the ray origin.
    #[must_use]
    pub fn intersect_plane(&self, origin: Vec3, normal: Vec3) -> Option<f32> {
        let denom = normal.dot(self.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = normal.dot(origin - self.origin) / denom;
        (t >= 0.0).then_some(t)
    }

    /// Closest approach between the ray and the infinite line through
    /// `origin` along unit `direction`.
    ///
    /// Returns `(t_ray, s_line)`; `None` if the two are parallel.
    #[must_use]
    pub fn closest_to_line(&self, origin: Vec3, direction: Vec3) -> Option<(f32, f32)> {
        let w = self.origin - origin;
        let b = self.direction.dot(direction);
        let denom = 1.0 - b * b;
        if denom < PARALLEL_EPSILON {
            return None;
        }
        let d = self.direction.dot(w);
        let e = direction.dot(w);
        let t = (b * e - d) / denom;
        let s = (e - b * d) / denom;
        Some((t, s))
    }

    /// Closest point on the segment `a..b` to the ray, with the ray
    /// parameter of closest approach.
    #[must_use]
    pub fn closest_on_segment(&self, a: Vec3, b: Vec3) -> (Vec3, f32) {
        let span = b - a;
        let len = span.length();
        if len < PARALLEL_EPSILON {
            return (a, self.parameter_of(a));
        }
        let dir = span / len;
        let s = match self.closest_to_line(a, dir) {
            Some((t, s)) if t >= 0.0 => s,
            // Parallel, or the approach is behind the origin: fall back to
            // the segment point nearest the origin.
            _ => (self.origin - a).dot(dir),
        };
        let point = a + dir * s.clamp(0.0, len);
        (point, self.parameter_of(point).max(0.0))
    }

    /// Möller–Trumbore ray/triangle test. Returns the hit parameter.
    #[must_use]
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        let e1 = b - a;
        let e2 = c - a;
        let p = self.direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = self.direction.dot(q) * inv;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv;
        (t >= 0.0).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_hit_in_front() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let t = ray.intersect_plane(Vec3::ZERO, Vec3::Z).unwrap();
        assert!((t - 10.0).abs() < 1e-5);
        assert!(ray.at(t).abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn plane_behind_or_parallel_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(ray.intersect_plane(Vec3::ZERO, Vec3::Z).is_none());
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::X);
        assert!(ray.intersect_plane(Vec3::ZERO, Vec3::Z).is_none());
    }

    #[test]
    fn line_approach_of_skew_lines() {
        // Ray along -Z at x=2, line along Y through the origin.
        let ray = Ray::new(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z);
        let (t, s) = ray.closest_to_line(Vec3::ZERO, Vec3::Y).unwrap();
        assert!((t - 5.0).abs() < 1e-5);
        assert!(s.abs() < 1e-5);
        assert!(ray.closest_to_line(Vec3::ZERO, Vec3::NEG_Z).is_none());
    }

    #[test]
    fn segment_clamps_to_endpoints() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, 5.0), Vec3::NEG_Z);
        let (p, _) = ray.closest_on_segment(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn triangle_hit_and_miss() {
        let ray = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::NEG_Z);
        let t = ray
            .intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y)
            .unwrap();
        assert!((t - 1.0).abs() < 1e-5);
        let ray = Ray::new(Vec3::new(0.8, 0.8, 1.0), Vec3::NEG_Z);
        assert!(ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }
}

use glam::{Mat4, UVec2, Vec2, Vec3};

use crate::options::{CameraOptions, ProjectionMode};
use crate::snap::ray::Ray;

/// Viewport camera defined by eye position, target, and projection
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees (perspective only).
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
    /// Orthographic or perspective.
    pub projection: ProjectionMode,
    /// Visible height in world units (orthographic only).
    pub frustum_size: f32,
}

impl Camera {
    /// Camera at `eye` looking at `target`, with projection parameters from
    /// `options`.
    #[must_use]
    pub fn new(options: &CameraOptions, eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            aspect,
            fovy: options.fovy,
            znear: options.znear,
            zfar: options.zfar,
            projection: options.projection,
            frustum_size: options.frustum_size,
        }
    }

    /// Whether the camera uses a parallel projection.
    #[must_use]
    pub fn is_ortho(&self) -> bool {
        self.projection == ProjectionMode::Orthographic
    }

    /// World-to-view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// View-to-clip matrix.
    #[must_use]
    pub fn build_projection(&self) -> Mat4 {
        // *_rh already use the [0,1] depth range (wgpu/Vulkan convention)
        match self.projection {
            ProjectionMode::Perspective => Mat4::perspective_rh(
                self.fovy.to_radians(),
                self.aspect,
                self.znear,
                self.zfar,
            ),
            ProjectionMode::Orthographic => {
                let half_h = self.frustum_size * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(
                    -half_w, half_w, -half_h, half_h, self.znear, self.zfar,
                )
            }
        }
    }

    /// Build the combined view-projection matrix.
    #[must_use]
    pub fn build_matrix(&self) -> Mat4 {
        self.build_projection() * self.view_matrix()
    }

    /// Ray from the near plane through the cursor at normalized device
    /// coordinates `ndc` (x right, y up, both in `[-1, 1]`).
    #[must_use]
    pub fn cursor_ray(&self, ndc: Vec2) -> Ray {
        let inv = self.build_matrix().inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }

    /// Normalized device coordinates of a world point (`z` is depth).
    #[must_use]
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.build_matrix().project_point3(world)
    }

    /// Whether `world` lies in front of the near plane.
    #[must_use]
    pub fn is_in_front(&self, world: Vec3) -> bool {
        (self.view_matrix().transform_point3(world)).z <= -self.znear
    }
}

/// Pixel position (top-left origin) of normalized device coordinates.
#[must_use]
pub fn ndc_to_pixel(ndc: Vec2, size: UVec2) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * size.x as f32,
        (1.0 - ndc.y) * 0.5 * size.y as f32,
    )
}

/// Normalized device coordinates of a pixel position (top-left origin).
#[must_use]
pub fn pixel_to_ndc(pixel: Vec2, size: UVec2) -> Vec2 {
    Vec2::new(
        pixel.x / size.x as f32 * 2.0 - 1.0,
        1.0 - pixel.y / size.y as f32 * 2.0,
    )
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU uniform shared by every pick-proxy shader.
pub struct PickUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Render-target size in physical pixels.
    pub viewport: [f32; 2],
    /// Point sprite side in physical pixels.
    pub point_size: f32,
    /// Axis line width in physical pixels.
    pub line_width: f32,
    /// Half side of plane quads in world units.
    pub plane_half_size: f32,
    /// Padding for GPU alignment.
    pub(crate) _pad: [f32; 3],
}

impl PickUniform {
    /// Uniform for rendering with `camera` into a target of `viewport`
    /// physical pixels.
    #[must_use]
    pub fn new(
        camera: &Camera,
        viewport: UVec2,
        point_size: f32,
        line_width: f32,
        plane_half_size: f32,
    ) -> Self {
        Self {
            view_proj: camera.build_matrix().to_cols_array_2d(),
            viewport: [viewport.x as f32, viewport.y as f32],
            point_size,
            line_width,
            plane_half_size,
            _pad: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_down(projection: ProjectionMode) -> Camera {
        let options = CameraOptions {
            projection,
            frustum_size: 400.0,
            znear: 0.1,
            zfar: 1000.0,
            ..CameraOptions::default()
        };
        Camera::new(&options, Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO, 1.0)
    }

    #[test]
    fn uniform_is_std140_sized() {
        assert_eq!(size_of::<PickUniform>(), 96);
    }

    #[test]
    fn ortho_rays_are_parallel() {
        let camera = top_down(ProjectionMode::Orthographic);
        let a = camera.cursor_ray(Vec2::new(-0.5, 0.0));
        let b = camera.cursor_ray(Vec2::new(0.5, 0.5));
        assert!(a.direction.abs_diff_eq(Vec3::NEG_Z, 1e-4));
        assert!(b.direction.abs_diff_eq(Vec3::NEG_Z, 1e-4));
        // 400 world units across 2 NDC units
        assert!((a.origin.x + 100.0).abs() < 1e-2);
    }

    #[test]
    fn perspective_center_ray_hits_target() {
        let camera = top_down(ProjectionMode::Perspective);
        let ray = camera.cursor_ray(Vec2::ZERO);
        let t = ray.intersect_plane(Vec3::ZERO, Vec3::Z).unwrap();
        assert!(ray.at(t).abs_diff_eq(Vec3::ZERO, 1e-2));
    }

    #[test]
    fn project_inverts_cursor_ray() {
        let camera = top_down(ProjectionMode::Perspective);
        let world = Vec3::new(3.0, -2.0, 0.0);
        let ndc = camera.project(world);
        let ray = camera.cursor_ray(ndc.truncate());
        let t = ray.intersect_plane(Vec3::ZERO, Vec3::Z).unwrap();
        assert!(ray.at(t).abs_diff_eq(world, 1e-2));
    }

    #[test]
    fn pixel_conversions_round_trip() {
        let size = UVec2::new(800, 600);
        let ndc = Vec2::new(0.25, -0.5);
        let px = ndc_to_pixel(ndc, size);
        assert_eq!(px, Vec2::new(500.0, 450.0));
        assert!(pixel_to_ndc(px, size).abs_diff_eq(ndc, 1e-6));
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the pick camera projects the scene.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Parallel projection; construction planes stay view-aligned.
    #[default]
    Orthographic,
    /// Pinhole perspective projection.
    Perspective,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection parameters.
pub struct CameraOptions {
    /// Projection used by the viewport camera.
    #[schemars(title = "Projection")]
    pub projection: ProjectionMode,
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 20.0, max = 90.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Visible height of the orthographic frustum, in world units.
    #[schemars(title = "Frustum Size", range(min = 0.1, max = 1000.0))]
    pub frustum_size: f32,
    /// Near clipping plane distance.
    #[schemars(skip)]
    pub znear: f32,
    /// Far clipping plane distance.
    #[schemars(skip)]
    pub zfar: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            projection: ProjectionMode::Orthographic,
            fovy: 50.0,
            frustum_size: 6.0,
            znear: 0.01,
            zfar: 10_000.0,
        }
    }
}

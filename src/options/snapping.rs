use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sizes of pick proxies and the nearby-snap tile.
///
/// Pixel quantities are in logical (CSS) pixels and scaled by the device
/// pixel ratio where they touch a render target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Snapping", inline)]
#[serde(default)]
pub struct SnapOptions {
    /// Radius of the nearby-snap search around the cursor.
    #[schemars(title = "Nearby Radius", range(min = 4.0, max = 200.0), extend("step" = 1.0))]
    pub nearby_radius: f32,
    /// Side of the square sprite a point snap covers in the pick target.
    #[schemars(title = "Point Size", range(min = 1.0, max = 100.0), extend("step" = 1.0))]
    pub point_size: f32,
    /// Width of axis snap lines in the pick target.
    #[schemars(title = "Axis Line Width", range(min = 1.0, max = 50.0), extend("step" = 1.0))]
    pub axis_line_width: f32,
    /// Sprite size used when rasterizing points into the nearby tile.
    #[schemars(skip)]
    pub nearby_point_size: f32,
    /// How far an axis proxy extends from its origin, in world units.
    #[schemars(skip)]
    pub axis_length: f32,
    /// Half the side of a plane proxy quad, in world units.
    #[schemars(skip)]
    pub plane_half_size: f32,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self {
            nearby_radius: 50.0,
            point_size: 35.0,
            axis_line_width: 14.0,
            nearby_point_size: 1.0,
            axis_length: 10_000.0,
            plane_half_size: 10_000.0,
        }
    }
}

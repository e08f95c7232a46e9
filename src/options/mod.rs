//! Centralized picking options with TOML preset support.
//!
//! Proxy sizes, the nearby-snap radius, camera projection defaults and debug
//! toggles are consolidated here. Options serialize to/from TOML so an
//! editor can keep them next to its other view presets.

mod camera;
mod debug;
mod snapping;

use std::path::Path;

pub use camera::{CameraOptions, ProjectionMode};
pub use debug::DebugOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use snapping::SnapOptions;

use crate::codec::SnapIdCodec;
use crate::error::SnapPickError;
use crate::proxy::ProxyExtents;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[snapping]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Proxy sizes and nearby-snap radius.
    pub snapping: SnapOptions,
    /// Camera projection parameters.
    pub camera: CameraOptions,
    /// Debug visualization options.
    pub debug: DebugOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Io`] if the file cannot be read and
    /// [`SnapPickError::OptionsParse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, SnapPickError> {
        let content = std::fs::read_to_string(path).map_err(SnapPickError::Io)?;
        toml::from_str(&content)
            .map_err(|e| SnapPickError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::OptionsParse`] on serialization failure and
    /// [`SnapPickError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SnapPickError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SnapPickError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SnapPickError::Io)?;
        }
        std::fs::write(path, content).map_err(SnapPickError::Io)
    }

    /// The id codec every picking component should share.
    #[must_use]
    pub fn codec(&self) -> SnapIdCodec {
        if self.debug.marked_pick_ids {
            SnapIdCodec::Debug
        } else {
            SnapIdCodec::Production
        }
    }

    /// World-space proxy extents.
    #[must_use]
    pub fn extents(&self) -> ProxyExtents {
        ProxyExtents {
            axis_length: self.snapping.axis_length,
            plane_half_size: self.snapping.plane_half_size,
        }
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Debug visualization toggles.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[schemars(title = "Debug", inline)]
#[serde(default)]
pub struct DebugOptions {
    /// Encode snap ids with a high-nibble marker so they are visible when the
    /// pick target is dumped as an image.
    #[schemars(title = "Marked Pick Ids")]
    pub marked_pick_ids: bool,
}

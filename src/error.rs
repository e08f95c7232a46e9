//! Crate-level error types.

use std::fmt;

use crate::codec::{GeometryId, PickId, SnapCategory};
use crate::gpu::render_context::RenderContextError;

/// Errors produced by the snappick crate.
///
/// Variants fall into two groups. Environmental failures (GPU setup, shader
/// composition, readback, options I/O) can happen on a healthy system.
/// Invariant violations mean the cache/codec contract was broken somewhere
/// else; see [`SnapPickError::is_invariant_violation`]. Callers should treat
/// those as fatal rather than retrying.
#[derive(Debug)]
pub enum SnapPickError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// WGSL composition failure.
    Shader(String),
    /// A GPU buffer could not be mapped for readback.
    Readback(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// The index does not fit in the codec's bit layout.
    IdSpaceExhausted {
        /// Category the index was being encoded for.
        category: SnapCategory,
        /// Offending list index.
        index: usize,
    },
    /// A snap variant with no proxy representation reached the proxy
    /// builder.
    UnsupportedProxy(&'static str),
    /// The cursor ray missed the active construction plane.
    ConstructionPlaneMiss,
    /// A picked id does not decode to a live snap.
    UnknownId(PickId),
    /// A point-only readback decoded to a snap that is not a point.
    NotAPoint(PickId),
    /// The geometry collaborator has no snappable object for this id.
    InvalidSnapTarget(GeometryId),
    /// A geometry-backed snap outlived its domain model.
    DanglingGeometry(GeometryId),
}

impl SnapPickError {
    /// Whether this error signals a broken cache/codec invariant rather than
    /// an environmental failure.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::IdSpaceExhausted { .. }
                | Self::UnsupportedProxy(_)
                | Self::ConstructionPlaneMiss
                | Self::UnknownId(_)
                | Self::NotAPoint(_)
                | Self::InvalidSnapTarget(_)
                | Self::DanglingGeometry(_)
        )
    }
}

impl fmt::Display for SnapPickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Shader(msg) => write!(f, "shader composition error: {msg}"),
            Self::Readback(msg) => write!(f, "readback error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::IdSpaceExhausted { category, index } => {
                write!(f, "{category:?} snap index {index} exceeds the id space")
            }
            Self::UnsupportedProxy(variant) => {
                write!(f, "invalid snap: {variant} has no pick proxy")
            }
            Self::ConstructionPlaneMiss => write!(
                f,
                "invalid condition: cursor ray must always intersect the \
                 construction plane"
            ),
            Self::UnknownId(id) => {
                write!(f, "pick id {:#010x} names no live snap", id.raw())
            }
            Self::NotAPoint(id) => {
                write!(f, "pick id {:#010x} is not a point snap", id.raw())
            }
            Self::InvalidSnapTarget(id) => {
                write!(f, "invalid snap target: {id:?}")
            }
            Self::DanglingGeometry(id) => {
                write!(f, "domain object for {id:?} no longer exists")
            }
        }
    }
}

impl std::error::Error for SnapPickError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for SnapPickError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for SnapPickError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_invariant_violations() {
        assert!(SnapPickError::ConstructionPlaneMiss.is_invariant_violation());
        assert!(SnapPickError::NotAPoint(PickId::from_raw(3))
            .is_invariant_violation());
        assert!(!SnapPickError::Readback("lost".into()).is_invariant_violation());
        assert!(!SnapPickError::OptionsParse("bad".into())
            .is_invariant_violation());
    }

    #[test]
    fn unknown_id_display_is_hex() {
        let msg = SnapPickError::UnknownId(PickId::from_raw(0x8001)).to_string();
        assert!(msg.contains("0x00008001"), "{msg}");
    }
}

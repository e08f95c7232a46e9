//! Packing of snap and geometry identities into GPU pick ids.
//!
//! Every pickable primitive writes a non-zero `u32` into the R32Uint pick
//! target; `0` is the clear color and means "nothing here". Three id spaces
//! share that value:
//!
//! - registry snaps (long-lived, owned by the scene-wide snap registry)
//! - interaction snaps (ephemeral, owned by the active interaction)
//! - geometry ids (faces, edges and curves of visible scene objects)
//!
//! Geometry ids always carry a non-zero object number in
//! [`GEOMETRY_PARENT_MASK`]; snap ids never touch those bits, so the mask is
//! checked first and the two decoders never see each other's values.

use crate::error::SnapPickError;

/// Raw value read back from a pick target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct PickId(u32);

impl PickId {
    /// The clear color: no hit.
    pub const NONE: Self = Self(0);

    /// Wrap a raw pixel value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw pixel value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the clear color.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Which list a snap index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapCategory {
    /// The scene-wide snap registry (see [`crate::cache::GeometryCache`]).
    Registry,
    /// The active interaction's local snap list.
    Interaction,
}

/// Bit layout used to pack `(category, index)` into a [`PickId`].
///
/// The codec is a plain value handed to the cache and the interaction
/// adapter at construction, so both always agree on the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapIdCodec {
    /// Compact layout: `index + 1` in bits 0..15, bit 15 tags interaction
    /// snaps.
    #[default]
    Production,
    /// Same tagging, but with `0xF` in the top nibble so ids stand out when
    /// the pick target is dumped as a color image.
    Debug,
}

const INTERACTION_TAG: u32 = 1 << 15;
const SNAP_INDEX_MASK: u32 = INTERACTION_TAG - 1;
const DEBUG_MARKER: u32 = 0xF000_0000;

impl SnapIdCodec {
    /// Largest index `encode` accepts.
    #[must_use]
    pub const fn max_index(self) -> usize {
        match self {
            // index + 1 must still fit in 15 bits
            Self::Production => (SNAP_INDEX_MASK - 1) as usize,
            Self::Debug => SNAP_INDEX_MASK as usize,
        }
    }

    /// Pack a list index into a pick id.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::IdSpaceExhausted`] when `index` exceeds
    /// [`Self::max_index`].
    pub fn encode(
        self,
        category: SnapCategory,
        index: usize,
    ) -> Result<PickId, SnapPickError> {
        if index > self.max_index() {
            return Err(SnapPickError::IdSpaceExhausted { category, index });
        }
        let tag = match category {
            SnapCategory::Registry => 0,
            SnapCategory::Interaction => INTERACTION_TAG,
        };
        let raw = match self {
            Self::Production => (index as u32 + 1) | tag,
            Self::Debug => DEBUG_MARKER | index as u32 | tag,
        };
        Ok(PickId(raw))
    }

    /// Unpack a pick id produced by [`Self::encode`].
    ///
    /// Returns `None` for the clear color and for any value this layout
    /// could not have produced.
    #[must_use]
    pub fn decode(self, id: PickId) -> Option<(SnapCategory, usize)> {
        let raw = id.0;
        if raw == 0 {
            return None;
        }
        let low = match self {
            Self::Production => {
                if raw > 0xFFFF {
                    return None;
                }
                raw
            }
            Self::Debug => {
                if raw & 0xFFFF_0000 != DEBUG_MARKER {
                    return None;
                }
                raw & 0xFFFF
            }
        };
        let category = if low & INTERACTION_TAG == 0 {
            SnapCategory::Registry
        } else {
            SnapCategory::Interaction
        };
        let index = low & SNAP_INDEX_MASK;
        match self {
            Self::Production => index.checked_sub(1).map(|i| (category, i as usize)),
            Self::Debug => Some((category, index as usize)),
        }
    }
}

/// Bits reserved for the owning object of a geometry id.
pub const GEOMETRY_PARENT_MASK: u32 = 0x0FFF_0000;
const GEOMETRY_PARENT_SHIFT: u32 = 16;
const GEOMETRY_KIND_SHIFT: u32 = 14;
const GEOMETRY_INDEX_MASK: u32 = (1 << GEOMETRY_KIND_SHIFT) - 1;

/// Kind of topological item a geometry id names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyKind {
    /// A face of a solid.
    Face,
    /// An edge of a solid.
    Edge,
    /// A free-standing curve object.
    Curve,
}

/// Identity of a pickable piece of visible scene geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId {
    /// Owning scene object, `1..=4095`.
    pub object: u32,
    /// What kind of item inside the object.
    pub kind: TopologyKind,
    /// Item index inside the object, `0..16384`.
    pub index: u32,
}

impl GeometryId {
    /// Largest object number that fits the parent mask.
    pub const MAX_OBJECT: u32 = GEOMETRY_PARENT_MASK >> GEOMETRY_PARENT_SHIFT;
    /// Largest item index.
    pub const MAX_INDEX: u32 = GEOMETRY_INDEX_MASK;

    /// Id of face `index` of `object`.
    #[must_use]
    pub const fn face(object: u32, index: u32) -> Self {
        Self { object, kind: TopologyKind::Face, index }
    }

    /// Id of edge `index` of `object`.
    #[must_use]
    pub const fn edge(object: u32, index: u32) -> Self {
        Self { object, kind: TopologyKind::Edge, index }
    }

    /// Id of the curve object `object`.
    #[must_use]
    pub const fn curve(object: u32) -> Self {
        Self { object, kind: TopologyKind::Curve, index: 0 }
    }

    /// Pack into a pick id. Returns `None` when a field is out of range
    /// (object `0` included, since it would lose the parent-mask tag).
    #[must_use]
    pub fn encode(self) -> Option<PickId> {
        if self.object == 0
            || self.object > Self::MAX_OBJECT
            || self.index > Self::MAX_INDEX
        {
            return None;
        }
        let kind = match self.kind {
            TopologyKind::Face => 0,
            TopologyKind::Edge => 1,
            TopologyKind::Curve => 2,
        };
        Some(PickId(
            (self.object << GEOMETRY_PARENT_SHIFT)
                | (kind << GEOMETRY_KIND_SHIFT)
                | self.index,
        ))
    }

    /// Unpack a pick id in the geometry space.
    #[must_use]
    pub fn decode(id: PickId) -> Option<Self> {
        let raw = id.0;
        if !is_geometry(id) || raw & !(GEOMETRY_PARENT_MASK | 0xFFFF) != 0 {
            return None;
        }
        let kind = match (raw >> GEOMETRY_KIND_SHIFT) & 0b11 {
            0 => TopologyKind::Face,
            1 => TopologyKind::Edge,
            2 => TopologyKind::Curve,
            _ => return None,
        };
        Some(Self {
            object: (raw & GEOMETRY_PARENT_MASK) >> GEOMETRY_PARENT_SHIFT,
            kind,
            index: raw & GEOMETRY_INDEX_MASK,
        })
    }
}

/// Whether `id` lies in the geometry id space.
#[must_use]
pub const fn is_geometry(id: PickId) -> bool {
    id.0 & GEOMETRY_PARENT_MASK != 0
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const CODECS: [SnapIdCodec; 2] = [SnapIdCodec::Production, SnapIdCodec::Debug];
    const CATEGORIES: [SnapCategory; 2] =
        [SnapCategory::Registry, SnapCategory::Interaction];

    fn sample_indices(codec: SnapIdCodec) -> Vec<usize> {
        let max = codec.max_index();
        let mut indices: Vec<usize> = (0..300).collect();
        indices.extend([1023, 1024, 16_383, 16_384, max - 1, max]);
        indices
    }

    #[test]
    fn round_trips_every_category() {
        for codec in CODECS {
            for category in CATEGORIES {
                for index in sample_indices(codec) {
                    let id = codec.encode(category, index).unwrap();
                    assert_eq!(codec.decode(id), Some((category, index)));
                }
            }
        }
    }

    #[test]
    fn encoded_ids_are_unique_and_nonzero() {
        for codec in CODECS {
            let mut seen = HashSet::new();
            for category in CATEGORIES {
                for index in sample_indices(codec) {
                    let id = codec.encode(category, index).unwrap();
                    assert!(!id.is_none());
                    assert!(seen.insert(id), "{codec:?} collided at {index}");
                }
            }
        }
    }

    #[test]
    fn production_layout_matches_tagging() {
        let codec = SnapIdCodec::Production;
        assert_eq!(codec.encode(SnapCategory::Registry, 0).unwrap().raw(), 1);
        assert_eq!(
            codec.encode(SnapCategory::Interaction, 0).unwrap().raw(),
            0x8001
        );
    }

    #[test]
    fn debug_layout_is_marked() {
        let id = SnapIdCodec::Debug
            .encode(SnapCategory::Interaction, 5)
            .unwrap();
        assert_eq!(id.raw(), 0xF000_8005);
    }

    #[test]
    fn zero_decodes_to_none() {
        for codec in CODECS {
            assert_eq!(codec.decode(PickId::NONE), None);
        }
        // A bare interaction tag has a zero biased index.
        assert_eq!(SnapIdCodec::Production.decode(PickId::from_raw(0x8000)), None);
    }

    #[test]
    fn rejects_out_of_range_index() {
        for codec in CODECS {
            let err = codec
                .encode(SnapCategory::Registry, codec.max_index() + 1)
                .unwrap_err();
            assert!(err.is_invariant_violation());
        }
    }

    #[test]
    fn snap_ids_never_look_like_geometry() {
        for codec in CODECS {
            for category in CATEGORIES {
                for index in sample_indices(codec) {
                    let id = codec.encode(category, index).unwrap();
                    assert!(!is_geometry(id));
                }
            }
        }
    }

    #[test]
    fn geometry_ids_are_not_snap_ids() {
        let id = GeometryId::edge(7, 12).encode().unwrap();
        assert!(is_geometry(id));
        for codec in CODECS {
            assert_eq!(codec.decode(id), None);
        }
    }

    #[test]
    fn geometry_round_trip() {
        for gid in [
            GeometryId::face(1, 0),
            GeometryId::face(GeometryId::MAX_OBJECT, GeometryId::MAX_INDEX),
            GeometryId::edge(42, 9),
            GeometryId::curve(3),
        ] {
            let id = gid.encode().unwrap();
            assert_eq!(GeometryId::decode(id), Some(gid));
        }
    }

    #[test]
    fn geometry_rejects_object_zero() {
        assert_eq!(GeometryId::face(0, 1).encode(), None);
        assert_eq!(GeometryId::face(GeometryId::MAX_OBJECT + 1, 0).encode(), None);
    }
}

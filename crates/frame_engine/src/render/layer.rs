//! Render layers
//!
//! Every render item belongs to exactly one layer, fixed at creation. Layers
//! are drawn in [`RenderLayer::DRAW_ORDER`], each with its own pipeline state.

use serde::{Deserialize, Serialize};

/// Draw pass an item is batched into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RenderLayer {
    /// Solid geometry, no blending
    Opaque,
    /// Alpha-clipped geometry (fences, foliage)
    AlphaTested,
    /// Point sprites expanded into camera-facing quads
    Billboard,
    /// Alpha-blended geometry, drawn last and unsorted
    Transparent,
}

impl RenderLayer {
    /// Number of layers
    pub const COUNT: usize = 4;

    /// Layers in submission order
    pub const DRAW_ORDER: [Self; Self::COUNT] = [
        Self::Opaque,
        Self::AlphaTested,
        Self::Billboard,
        Self::Transparent,
    ];

    /// Position in [`RenderLayer::DRAW_ORDER`]
    pub const fn index(self) -> usize {
        match self {
            Self::Opaque => 0,
            Self::AlphaTested => 1,
            Self::Billboard => 2,
            Self::Transparent => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_draw_order() {
        for (position, layer) in RenderLayer::DRAW_ORDER.iter().enumerate() {
            assert_eq!(layer.index(), position);
        }
        assert!(RenderLayer::Opaque < RenderLayer::Transparent);
    }
}

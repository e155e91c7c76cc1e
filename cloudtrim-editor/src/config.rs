//! Editor configuration

use serde::{Deserialize, Serialize};

use cloudtrim_core::Color;
use cloudtrim_io::PcdWriteOptions;
use cloudtrim_selection::{Framing, SelectionStrategy};

/// When the selection is recomputed while a box is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DragRecompute {
    /// Only when the drag is released and the box is committed
    #[default]
    OnRelease,
    /// On every pointer move, including the in-progress box
    Live,
}

/// Configuration for an [`crate::EditSession`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Color written to selected points
    pub highlight_color: Color,
    /// Color written to every other point
    pub neutral_color: Color,
    /// Rotation applied by one keyboard nudge, in radians
    pub rotate_step: f32,
    /// Camera placement after a load
    pub framing: Framing,
    /// Move the bounding-box center of loaded clouds to the origin
    pub center_on_load: bool,
    pub drag_recompute: DragRecompute,
    pub selection_strategy: SelectionStrategy,
    /// Options used by `export_pcd`
    pub export: PcdWriteOptions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            highlight_color: Color::from_hex(0x2ecc71),
            neutral_color: Color::WHITE,
            rotate_step: 0.05,
            framing: Framing::default(),
            center_on_load: true,
            drag_recompute: DragRecompute::OnRelease,
            selection_strategy: SelectionStrategy::Linear,
            export: PcdWriteOptions::default(),
        }
    }
}

impl EditorConfig {
    /// Live feedback while dragging, backed by a screen-space R-tree
    pub fn interactive() -> Self {
        Self {
            drag_recompute: DragRecompute::Live,
            selection_strategy: SelectionStrategy::Indexed,
            ..Self::default()
        }
    }

    /// Scripted editing: no live drag updates, positions exported as given
    pub fn batch() -> Self {
        Self {
            center_on_load: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let interactive = EditorConfig::interactive();
        assert_eq!(interactive.drag_recompute, DragRecompute::Live);
        assert_eq!(interactive.selection_strategy, SelectionStrategy::Indexed);

        let batch = EditorConfig::batch();
        assert!(!batch.center_on_load);
        assert_eq!(batch.highlight_color, EditorConfig::default().highlight_color);
    }
}

//! Cosmetic highlight pass over a point buffer

use cloudtrim_core::{Color, PointBuffer};

/// Color every selected point with `highlight` and every other point with `neutral`
///
/// Rewrites the whole color array; there is no incremental update. A selection
/// computed against another buffer version highlights nothing.
pub fn apply_highlight(
    buffer: &mut PointBuffer,
    selection: &crate::SelectionResult,
    highlight: Color,
    neutral: Color,
) -> usize {
    let mask = selection.to_mask(buffer.len());
    let current = selection.is_current_for(buffer);
    let mut highlighted = 0;
    for (color, selected) in buffer.colors_mut().iter_mut().zip(mask) {
        if current && selected {
            *color = highlight;
            highlighted += 1;
        } else {
            *color = neutral;
        }
    }
    highlighted
}

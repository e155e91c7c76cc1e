//! Deleting points by selection
//!
//! Both directions compact the buffer through the selection mask. With no
//! boxes the selection is empty, so `DeleteInside` removes nothing while
//! `DeleteOutside` removes every point: outside an empty selection is
//! everything.

use serde::{Deserialize, Serialize};
use tracing::debug;

use cloudtrim_core::{PointBuffer, Result};

use crate::selection::SelectionResult;

/// Which side of the selection is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropMode {
    /// Delete the selected points, keep the rest
    DeleteInside,
    /// Keep only the selected points
    DeleteOutside,
}

/// Compact `buffer` according to `selection`
///
/// Fails with [`cloudtrim_core::Error::StaleSelection`] when the selection was
/// computed against another buffer version; applying old indices to a new
/// point set would delete the wrong points.
pub fn crop(
    buffer: &PointBuffer,
    selection: &SelectionResult,
    mode: CropMode,
) -> Result<PointBuffer> {
    selection.validate_against(buffer)?;
    let selected = selection.to_mask(buffer.len());
    let result = match mode {
        CropMode::DeleteInside => buffer.compact(|i| !selected[i]),
        CropMode::DeleteOutside => buffer.compact(|i| selected[i]),
    };
    debug!(
        ?mode,
        selected = selection.len(),
        before = buffer.len(),
        after = result.len(),
        "cropped point buffer"
    );
    Ok(result)
}

/// Delete every selected point
pub fn delete_inside(buffer: &PointBuffer, selection: &SelectionResult) -> Result<PointBuffer> {
    crop(buffer, selection, CropMode::DeleteInside)
}

/// Delete every point that is not selected
pub fn delete_outside(buffer: &PointBuffer, selection: &SelectionResult) -> Result<PointBuffer> {
    crop(buffer, selection, CropMode::DeleteOutside)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudtrim_core::{Error, Point3f};

    fn ten_points() -> PointBuffer {
        PointBuffer::load((0..10).map(|i| Point3f::new(i as f32, 0.0, 0.0)))
    }

    #[test]
    fn test_empty_selection_asymmetry() {
        let buffer = ten_points();
        let nothing = SelectionResult::empty(buffer.version());
        assert_eq!(delete_inside(&buffer, &nothing).unwrap().len(), 10);
        assert_eq!(delete_outside(&buffer, &nothing).unwrap().len(), 0);
    }

    #[test]
    fn test_inside_and_outside_partition() {
        let buffer = ten_points();
        let selection = SelectionResult::new(buffer.version(), vec![1, 4, 5]);
        let inside_deleted = delete_inside(&buffer, &selection).unwrap();
        let outside_deleted = delete_outside(&buffer, &selection).unwrap();

        assert_eq!(inside_deleted.len() + outside_deleted.len(), buffer.len());
        let kept: Vec<f32> = outside_deleted.positions().iter().map(|p| p.x).collect();
        assert_eq!(kept, vec![1.0, 4.0, 5.0]);
        assert!(inside_deleted.positions().iter().all(|p| ![1.0, 4.0, 5.0].contains(&p.x)));
    }

    #[test]
    fn test_stale_selection_is_rejected() {
        let buffer = ten_points();
        let selection = SelectionResult::new(buffer.version(), vec![0]);
        let compacted = delete_inside(&buffer, &selection).unwrap();
        assert!(matches!(
            delete_outside(&compacted, &selection),
            Err(Error::StaleSelection { .. })
        ));
    }
}

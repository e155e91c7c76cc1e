//! The editing session a host drives
//!
//! An [`EditSession`] owns the loaded [`PointBuffer`] and everything derived
//! from it: the camera, the accumulated cloud rotation, the screen-space
//! selection boxes and the current selection. Hosts forward pointer and key
//! events as commands; nothing here renders.

use std::path::Path;

use nalgebra::Point2;
use tracing::{debug, info, warn};

use cloudtrim_core::{Axis, Point3f, PointBuffer, Result};
use cloudtrim_io::PcdWriter;
use cloudtrim_selection::{
    apply_highlight, crop, project_all, BoxId, Camera, CropMode, Projection, ScreenRect,
    SelectionBox, SelectionResult, Viewport,
};

use crate::config::{DragRecompute, EditorConfig};
use crate::transform_controller::{Nudge, TransformController};

/// What pointer drags do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Drags orbit the camera; selection boxes are ignored
    #[default]
    Orbit,
    /// Drags draw selection boxes
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    start: Point2<f32>,
    current: Point2<f32>,
}

/// One loaded cloud plus its view and selection state
#[derive(Debug)]
pub struct EditSession {
    config: EditorConfig,
    buffer: PointBuffer,
    camera: Camera,
    viewport: Option<Viewport>,
    transform: TransformController,
    mode: InteractionMode,
    boxes: Vec<SelectionBox>,
    drag: Option<DragState>,
    next_box_id: u64,
    selection: SelectionResult,
}

impl EditSession {
    /// An empty session; call [`EditSession::load`] to start editing
    pub fn new(config: EditorConfig) -> Self {
        let buffer = PointBuffer::new();
        let camera = Camera::default();
        Self {
            transform: TransformController::capture(&camera),
            selection: SelectionResult::empty(buffer.version()),
            config,
            buffer,
            camera,
            viewport: None,
            mode: InteractionMode::default(),
            boxes: Vec::new(),
            drag: None,
            next_box_id: 0,
        }
    }

    /// Replace the buffer with `positions`, reframe the camera and drop all
    /// selection state
    ///
    /// Returns the number of points loaded. The transform snapshot is taken
    /// here and lives until the next load.
    pub fn load<I>(&mut self, positions: I) -> usize
    where
        I: IntoIterator<Item = Point3f>,
    {
        self.install(PointBuffer::load(positions))
    }

    /// Load from a flat `[x0, y0, z0, x1, ...]` slice
    pub fn load_flat(&mut self, flat: &[f32]) -> Result<usize> {
        Ok(self.install(PointBuffer::load_flat(flat)?))
    }

    fn install(&mut self, mut buffer: PointBuffer) -> usize {
        if self.config.center_on_load {
            let offset = buffer.center();
            debug!(x = offset.x, y = offset.y, z = offset.z, "centered cloud");
        }
        let sphere = buffer.bounding_sphere();
        let aspect_ratio = self
            .viewport
            .map(|v| v.aspect_ratio())
            .unwrap_or(self.camera.aspect_ratio);

        self.camera = Camera::framing(&sphere, &self.config.framing, aspect_ratio);
        self.transform = TransformController::capture(&self.camera);
        self.boxes.clear();
        self.drag = None;
        self.selection = SelectionResult::empty(buffer.version());
        self.buffer = buffer;

        info!(
            points = self.buffer.len(),
            radius = sphere.radius,
            version = %self.buffer.version(),
            "loaded point cloud"
        );
        self.buffer.len()
    }

    /// Bind the drawing surface size; the camera aspect follows it
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if !viewport.is_degenerate() {
            self.camera.aspect_ratio = viewport.aspect_ratio();
        }
        self.viewport = Some(viewport);
        self.refresh_selection();
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera access for host orbit controls
    ///
    /// Call [`EditSession::refresh_selection`] afterwards if boxes are active
    /// and the highlight should follow the new view.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn buffer(&self) -> &PointBuffer {
        &self.buffer
    }

    /// The selection the highlight currently shows
    pub fn selection(&self) -> &SelectionResult {
        &self.selection
    }

    pub fn transform(&self) -> &TransformController {
        &self.transform
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Project the buffer with the current transform, camera and viewport
    ///
    /// Empty when no viewport is bound.
    pub fn project_all(&self) -> Projection {
        match &self.viewport {
            Some(viewport) => project_all(
                &self.buffer,
                &self.transform.world_transform(),
                &self.camera,
                viewport,
            ),
            None => Projection::empty(self.buffer.version()),
        }
    }

    /// Union of the committed boxes against a fresh projection
    pub fn select_union(&self) -> SelectionResult {
        self.select_boxes(&self.boxes)
    }

    fn select_boxes(&self, boxes: &[SelectionBox]) -> SelectionResult {
        if boxes.is_empty() {
            return SelectionResult::empty(self.buffer.version());
        }
        self.config.selection_strategy.select(&self.project_all(), boxes)
    }

    /// Remove every point inside the union of the committed boxes
    ///
    /// Returns the number of points removed. Selection, boxes and any drag in
    /// progress are cleared.
    pub fn delete_inside(&mut self) -> Result<usize> {
        self.delete(CropMode::DeleteInside)
    }

    /// Keep only the points inside the union of the committed boxes
    ///
    /// With no committed boxes this removes every point.
    pub fn delete_outside(&mut self) -> Result<usize> {
        self.delete(CropMode::DeleteOutside)
    }

    fn delete(&mut self, mode: CropMode) -> Result<usize> {
        if self.viewport.map_or(true, |v| v.is_degenerate()) {
            warn!(?mode, "no usable viewport bound, nothing deleted");
            return Ok(0);
        }

        let selection = self.select_union();
        let cropped = crop(&self.buffer, &selection, mode)?;
        let removed = self.buffer.len() - cropped.len();

        self.buffer = cropped;
        self.boxes.clear();
        self.drag = None;
        self.selection = SelectionResult::empty(self.buffer.version());
        apply_highlight(
            &mut self.buffer,
            &self.selection,
            self.config.highlight_color,
            self.config.neutral_color,
        );

        info!(?mode, removed, remaining = self.buffer.len(), "cropped point cloud");
        Ok(removed)
    }

    /// Add `angle` radians to the cloud rotation about `axis`
    pub fn rotate(&mut self, axis: Axis, angle: f32) {
        self.transform.rotate(axis, angle);
        self.refresh_selection();
    }

    /// Apply one keyboard nudge scaled by the configured step
    pub fn nudge(&mut self, nudge: Nudge) {
        let (axis, angle) = nudge.rotation(self.config.rotate_step);
        self.rotate(axis, angle);
    }

    /// Restore the cloud rotation and camera pose captured at load
    pub fn reset_view(&mut self) {
        self.transform.reset(&mut self.camera);
        info!("reset view");
        self.refresh_selection();
    }

    /// Serialize the current buffer with the configured PCD options
    pub fn export_pcd(&self) -> Result<Vec<u8>> {
        let bytes = PcdWriter::to_bytes(&self.buffer, &self.config.export)?;
        info!(points = self.buffer.len(), bytes = bytes.len(), "exported PCD");
        Ok(bytes)
    }

    pub fn export_pcd_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        PcdWriter::write_file(&self.buffer, path, &self.config.export)
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Switch between orbiting and box selection
    ///
    /// Leaving selection mode discards every box.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        match mode {
            InteractionMode::Orbit if self.mode == InteractionMode::Select => {
                self.cancel_selection()
            }
            _ => self.mode = mode,
        }
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            InteractionMode::Orbit => InteractionMode::Select,
            InteractionMode::Select => InteractionMode::Orbit,
        };
        self.set_mode(next);
    }

    /// Start drawing a box at `point`; ignored outside selection mode
    pub fn begin_drag(&mut self, point: Point2<f32>) {
        if self.mode != InteractionMode::Select {
            return;
        }
        self.drag = Some(DragState { start: point, current: point });
        self.on_drag_changed();
    }

    pub fn update_drag(&mut self, point: Point2<f32>) {
        if let Some(drag) = &mut self.drag {
            drag.current = point;
            self.on_drag_changed();
        }
    }

    /// Commit the box being drawn, if any
    pub fn end_drag(&mut self) -> Option<BoxId> {
        let drag = self.drag.take()?;
        Some(self.add_box(drag.start, drag.current))
    }

    /// The in-progress box, for drawing the rubber band
    pub fn drag_rect(&self) -> Option<ScreenRect> {
        self.drag.map(|d| ScreenRect::from_corners(d.start, d.current))
    }

    /// Commit a box directly, bypassing the drag gesture
    pub fn add_box(&mut self, start: Point2<f32>, end: Point2<f32>) -> BoxId {
        let id = BoxId(self.next_box_id);
        self.next_box_id += 1;
        self.boxes.push(SelectionBox::new(id, start, end));
        debug!(%id, boxes = self.boxes.len(), "committed selection box");
        self.refresh_selection();
        id
    }

    pub fn remove_box(&mut self, id: BoxId) -> bool {
        let before = self.boxes.len();
        self.boxes.retain(|b| b.id != id);
        let removed = self.boxes.len() != before;
        if removed {
            self.refresh_selection();
        }
        removed
    }

    pub fn committed_boxes(&self) -> &[SelectionBox] {
        &self.boxes
    }

    /// Leave selection mode, discarding every box
    pub fn cancel_selection(&mut self) {
        self.mode = InteractionMode::Orbit;
        self.clear_boxes();
    }

    /// Drop all committed boxes and any drag in progress
    pub fn clear_boxes(&mut self) {
        self.boxes.clear();
        self.drag = None;
        self.refresh_selection();
    }

    /// Recompute the selection and rewrite the highlight colors
    ///
    /// Runs automatically after box, rotation, reset and viewport changes.
    pub fn refresh_selection(&mut self) {
        let boxes = self.active_boxes();
        let unchanged = self.selection.is_empty() && self.selection.is_current_for(&self.buffer);
        if boxes.is_empty() && unchanged {
            return;
        }
        self.selection = self.select_boxes(&boxes);
        let highlighted = apply_highlight(
            &mut self.buffer,
            &self.selection,
            self.config.highlight_color,
            self.config.neutral_color,
        );
        debug!(highlighted, boxes = boxes.len(), "refreshed selection");
    }

    fn on_drag_changed(&mut self) {
        if self.config.drag_recompute == DragRecompute::Live {
            self.refresh_selection();
        }
    }

    /// Committed boxes, plus the drag box when drags update live
    fn active_boxes(&self) -> Vec<SelectionBox> {
        let mut boxes = self.boxes.clone();
        if let (Some(drag), DragRecompute::Live) = (self.drag, self.config.drag_recompute) {
            boxes.push(SelectionBox::new(BoxId(u64::MAX), drag.start, drag.current));
        }
        boxes
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudtrim_core::Color;

    fn grid_session() -> EditSession {
        let mut session = EditSession::new(EditorConfig::batch());
        session.set_viewport(Viewport::new(800.0, 600.0));
        session.load((-2..=2).flat_map(|x| {
            (-2..=2).map(move |y| Point3f::new(x as f32 * 0.1, y as f32 * 0.1, 0.0))
        }));
        session
    }

    fn everything() -> (Point2<f32>, Point2<f32>) {
        (Point2::new(-1e6, -1e6), Point2::new(1e6, 1e6))
    }

    #[test]
    fn test_load_frames_camera() {
        let session = grid_session();
        assert_eq!(session.buffer().len(), 25);
        let radius = session.buffer().bounding_sphere().radius;
        assert!((session.camera().position.z - radius * 0.8).abs() < 1e-5);
        assert_eq!(session.camera().aspect_ratio, 800.0 / 600.0);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_box_highlight_follows_commits() {
        let mut session = grid_session();
        let (a, b) = everything();
        let id = session.add_box(a, b);
        assert_eq!(session.selection().len(), 25);
        assert!(session.buffer().colors().iter().all(|c| *c == Color::from_hex(0x2ecc71)));

        assert!(session.remove_box(id));
        assert!(session.selection().is_empty());
        assert!(session.buffer().colors().iter().all(|c| *c == Color::WHITE));
        assert!(!session.remove_box(id));
    }

    #[test]
    fn test_drag_outside_select_mode_is_ignored() {
        let mut session = grid_session();
        session.begin_drag(Point2::new(1.0, 1.0));
        assert!(session.drag_rect().is_none());
        assert_eq!(session.end_drag(), None);

        session.set_mode(InteractionMode::Select);
        session.begin_drag(Point2::new(1.0, 1.0));
        session.update_drag(Point2::new(5.0, 9.0));
        let rect = session.drag_rect().unwrap();
        assert_eq!((rect.width(), rect.height()), (4.0, 8.0));
        assert!(session.end_drag().is_some());
        assert_eq!(session.committed_boxes().len(), 1);
    }

    #[test]
    fn test_live_drag_updates_selection() {
        let mut session = EditSession::new(EditorConfig::interactive());
        session.set_viewport(Viewport::new(800.0, 600.0));
        session.load(vec![
            Point3f::new(-1.0, 0.0, 0.0),
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
        ]);
        session.set_mode(InteractionMode::Select);

        session.begin_drag(Point2::new(390.0, 290.0));
        session.update_drag(Point2::new(410.0, 310.0));
        assert_eq!(session.selection().len(), 1);
        assert!(session.committed_boxes().is_empty());
    }

    #[test]
    fn test_leaving_select_mode_drops_boxes() {
        let mut session = grid_session();
        session.toggle_mode();
        let (a, b) = everything();
        session.add_box(a, b);
        session.begin_drag(Point2::new(3.0, 3.0));
        session.toggle_mode();
        assert_eq!(session.mode(), InteractionMode::Orbit);
        assert!(session.committed_boxes().is_empty());
        assert!(session.drag_rect().is_none());
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_cancel_selection_leaves_select_mode() {
        let mut session = grid_session();
        session.set_mode(InteractionMode::Select);
        let (a, b) = everything();
        session.add_box(a, b);
        session.cancel_selection();
        assert_eq!(session.mode(), InteractionMode::Orbit);
        assert!(session.committed_boxes().is_empty());
        assert!(session.buffer().colors().iter().all(|c| *c == Color::WHITE));
    }

    #[test]
    fn test_delete_without_viewport_is_noop() {
        let mut session = EditSession::default();
        session.load(vec![Point3f::origin(); 3]);
        assert_eq!(session.delete_outside().unwrap(), 0);
        assert_eq!(session.buffer().len(), 3);
    }

    #[test]
    fn test_delete_clears_selection_state() {
        let mut session = grid_session();
        // Left of the centre column plus the column itself
        session.add_box(Point2::new(-1e6, -1e6), Point2::new(420.0, 1e6));
        let removed = session.delete_inside().unwrap();
        assert_eq!(removed, 15);
        assert!(session.committed_boxes().is_empty());
        assert!(session.selection().is_current_for(session.buffer()));
        assert!(session.selection().is_empty());
        assert!(session.buffer().colors().iter().all(|c| *c == Color::WHITE));
    }

    #[test]
    fn test_nudge_uses_configured_step() {
        let mut session = grid_session();
        session.nudge(Nudge::TiltUp);
        assert_eq!(session.transform().rotation().x, -0.05);
    }
}

//! Drop target boundary
//!
//! Tracks whether a file is being dragged over the drop target and resolves
//! a drop to a file selection. Drag state is purely presentational.

use super::{SelectedFile, UploadController};
use crate::transport::Transport;

/// Drop target state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DropZone {
    dragging: bool,
}

impl DropZone {
    pub fn drag_over(&mut self) {
        self.dragging = true;
    }

    pub fn drag_leave(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Hand the dropped files to the controller; only the first is taken
    ///
    /// Returns whether a file was selected.
    pub fn drop<T, I>(&mut self, controller: &mut UploadController<T>, items: I) -> bool
    where
        T: Transport,
        I: IntoIterator<Item = SelectedFile>,
    {
        self.dragging = false;
        controller.select_first(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{EventSink, TransferHandle, TransferRequest};
    use crate::upload::Phase;
    use bytes::Bytes;
    use tokio::sync::mpsc;

    struct NoopTransport;

    impl Transport for NoopTransport {
        fn dispatch(&self, _request: TransferRequest, events: EventSink) -> TransferHandle {
            TransferHandle::detached(events.id())
        }
    }

    fn file(name: &str) -> SelectedFile {
        SelectedFile::from_bytes(name, "text/plain", Bytes::from_static(b"data"))
    }

    #[test]
    fn test_drag_state() {
        let mut zone = DropZone::default();
        assert!(!zone.is_dragging());
        zone.drag_over();
        assert!(zone.is_dragging());
        zone.drag_leave();
        assert!(!zone.is_dragging());
    }

    #[test]
    fn test_drop_takes_first_file() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = UploadController::new(NoopTransport, tx);
        let mut zone = DropZone::default();

        zone.drag_over();
        assert!(zone.drop(&mut controller, vec![file("a.txt"), file("b.txt")]));

        assert!(!zone.is_dragging());
        assert_eq!(controller.file().unwrap().name, "a.txt");
        assert_eq!(controller.state().phase, Phase::Idle);
    }

    #[test]
    fn test_empty_drop_is_ignored() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = UploadController::new(NoopTransport, tx);
        controller.select_file(file("kept.txt"));
        let mut zone = DropZone::default();

        zone.drag_over();
        assert!(!zone.drop(&mut controller, Vec::new()));

        assert!(!zone.is_dragging());
        assert_eq!(controller.file().unwrap().name, "kept.txt");
    }
}

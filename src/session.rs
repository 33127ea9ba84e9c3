//! Upload session
//!
//! Binds the synchronous [`UploadController`] to tokio: owns the receiving
//! end of the transport event channel and applies events one at a time, so
//! transport callbacks for a transfer are strictly serialized.

use crate::transport::{TransferNotice, Transport};
use crate::upload::{Snapshot, UploadController};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Controller plus the event queue that feeds it
pub struct UploadSession<T: Transport> {
    controller: UploadController<T>,
    events: mpsc::UnboundedReceiver<TransferNotice>,
}

impl<T: Transport> UploadSession<T> {
    pub fn new(transport: T) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller: UploadController::new(transport, tx),
            events: rx,
        }
    }

    pub fn controller(&self) -> &UploadController<T> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut UploadController<T> {
        &mut self.controller
    }

    /// Wait for the next visible state change of the in-flight transfer
    ///
    /// Returns `None` immediately when nothing is uploading.
    pub async fn next_change(&mut self) -> Option<Snapshot> {
        while self.controller.is_uploading() {
            let notice = self.events.recv().await?;
            if self.controller.apply(notice) {
                return Some(self.controller.snapshot());
            }
        }
        None
    }

    /// Pump transport events until the current transfer settles
    ///
    /// `on_change` sees every visible state change. When `cancel` completes
    /// first, the transfer is aborted and the loop keeps running until the
    /// transport reports the abort.
    pub async fn run_until_settled<F, R>(&mut self, cancel: F, mut on_change: R) -> Snapshot
    where
        F: Future<Output = ()>,
        R: FnMut(&Snapshot),
    {
        tokio::pin!(cancel);
        let mut cancelled = false;

        while self.controller.is_uploading() {
            tokio::select! {
                notice = self.events.recv() => match notice {
                    Some(notice) => {
                        if self.controller.apply(notice) {
                            on_change(&self.controller.snapshot());
                        }
                    }
                    None => {
                        debug!("Event channel closed");
                        break;
                    }
                },
                _ = &mut cancel, if !cancelled => {
                    cancelled = true;
                    info!("Cancellation requested");
                    if !self.controller.abort() {
                        debug!("Transfer could not be cancelled");
                    }
                }
            }
        }

        self.controller.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{EventSink, TransferEvent, TransferHandle, TransferRequest};
    use crate::upload::{Phase, SelectedFile};
    use bytes::Bytes;
    use tokio::sync::oneshot;

    /// Replays a fixed script of events for every transfer
    struct ScriptedTransport {
        script: Vec<TransferEvent>,
    }

    impl Transport for ScriptedTransport {
        fn dispatch(&self, _request: TransferRequest, events: EventSink) -> TransferHandle {
            for event in &self.script {
                events.emit(event.clone());
            }
            TransferHandle::detached(events.id())
        }
    }

    /// Never finishes on its own; answers cancellation with an abort
    struct HangingTransport;

    impl Transport for HangingTransport {
        fn dispatch(&self, _request: TransferRequest, events: EventSink) -> TransferHandle {
            let (tx, rx) = oneshot::channel::<()>();
            let id = events.id();
            tokio::spawn(async move {
                let _ = rx.await;
                events.emit(TransferEvent::Abort);
            });
            TransferHandle::new(id, tx)
        }
    }

    fn armed<T: Transport>(transport: T) -> UploadSession<T> {
        let mut session = UploadSession::new(transport);
        let controller = session.controller_mut();
        controller.set_target("https://bucket.example.com/key?sig=abc");
        controller.select_file(SelectedFile::from_bytes(
            "a.bin",
            "application/octet-stream",
            Bytes::from(vec![0u8; 100]),
        ));
        controller.submit();
        session
    }

    #[tokio::test]
    async fn test_run_until_settled_success() {
        let mut session = armed(ScriptedTransport {
            script: vec![
                TransferEvent::Progress {
                    loaded: 50,
                    total: 100,
                    length_computable: true,
                },
                TransferEvent::Progress {
                    loaded: 100,
                    total: 100,
                    length_computable: true,
                },
                TransferEvent::Load { status: 200 },
            ],
        });

        let mut seen = Vec::new();
        let snapshot = session
            .run_until_settled(std::future::pending(), |s| seen.push(s.state.progress))
            .await;

        assert_eq!(snapshot.state.phase, Phase::Succeeded);
        assert_eq!(seen, vec![50, 100, 100]);
    }

    #[tokio::test]
    async fn test_next_change() {
        let mut session = armed(ScriptedTransport {
            script: vec![
                TransferEvent::Progress {
                    loaded: 25,
                    total: 100,
                    length_computable: true,
                },
                TransferEvent::Load { status: 500 },
            ],
        });

        assert_eq!(session.next_change().await.unwrap().state.progress, 25);
        let last = session.next_change().await.unwrap();
        assert_eq!(last.state.phase, Phase::Failed);
        assert!(session.next_change().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_aborts_transfer() {
        let mut session = armed(HangingTransport);
        let snapshot = session.run_until_settled(async {}, |_| {}).await;

        assert_eq!(snapshot.state.phase, Phase::Failed);
        assert_eq!(snapshot.state.error.as_deref(), Some("Upload was cancelled"));
    }

    #[tokio::test]
    async fn test_idle_session_returns_immediately() {
        let mut session = UploadSession::new(HangingTransport);
        let snapshot = session.run_until_settled(std::future::pending(), |_| {}).await;
        assert_eq!(snapshot.state.phase, Phase::Idle);
    }
}

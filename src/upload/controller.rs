//! Upload controller
//!
//! Owns the upload state and is its only writer. The transition table is:
//!
//! | From | Input | To |
//! |------|-------|----|
//! | Idle / Failed | `submit` with missing file or URL | Failed (`MissingInput`) |
//! | Idle / Failed | `submit` with unparsable URL | Failed (`InvalidUrl`, progress 0) |
//! | Idle / Failed | `submit` with valid inputs | Uploading (progress 0) |
//! | Uploading | `Progress` | Uploading (progress raised) |
//! | Uploading | `Load` 2xx | Succeeded (progress 100) |
//! | Uploading | `Load` other | Failed (`HttpFailure`) |
//! | Uploading | `Error` | Failed (`TransportError`) |
//! | Uploading | `Abort` | Failed (`Aborted`) |
//! | any but Uploading | `select_file` / `reset` | Idle |
//!
//! Everything else is a no-op. Transport events arrive asynchronously and
//! are fed in through [`UploadController::apply`].

use super::format::{parse_target, progress_percent, redact_url};
use super::{FileSummary, Phase, SelectedFile, Snapshot, TransferState, UploadError};
use crate::metrics;
use crate::transport::{
    EventSink, TransferEvent, TransferHandle, TransferId, TransferNotice, TransferRequest,
    Transport,
};
use reqwest::Method;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct InFlight {
    handle: TransferHandle,
    started: Instant,
    bytes: u64,
}

/// Upload state machine for a single file and target URL
pub struct UploadController<T: Transport> {
    transport: T,
    events: mpsc::UnboundedSender<TransferNotice>,
    target: String,
    file: Option<SelectedFile>,
    state: TransferState,
    indeterminate: bool,
    in_flight: Option<InFlight>,
}

impl<T: Transport> UploadController<T> {
    /// Create an idle controller
    ///
    /// Transport events for every transfer this controller starts are sent
    /// to `events`; the owner of the receiving half feeds them back through
    /// [`apply`](Self::apply).
    pub fn new(transport: T, events: mpsc::UnboundedSender<TransferNotice>) -> Self {
        Self {
            transport,
            events,
            target: String::new(),
            file: None,
            state: TransferState::default(),
            indeterminate: false,
            in_flight: None,
        }
    }

    /// Store the raw target URL; validated only on submit
    pub fn set_target(&mut self, url: impl Into<String>) {
        self.target = url.into();
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn state(&self) -> &TransferState {
        &self.state
    }

    pub fn is_uploading(&self) -> bool {
        self.state.is_uploading()
    }

    /// Replace the selected file and re-arm the controller
    ///
    /// Ignored while a transfer is in flight.
    pub fn select_file(&mut self, file: SelectedFile) {
        if self.is_uploading() {
            warn!(file = %file.name, "File selection ignored while uploading");
            return;
        }

        info!(
            file = %file.name,
            size = file.size,
            mime_type = %file.mime_type,
            "File selected"
        );
        self.file = Some(file);
        self.rearm();
    }

    /// Select the first of several candidates (picker or drop)
    ///
    /// Returns `false` and changes nothing when there is no candidate.
    pub fn select_first<I>(&mut self, candidates: I) -> bool
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        let mut candidates = candidates.into_iter();
        let Some(first) = candidates.next() else {
            debug!("Selection with no candidates ignored");
            return false;
        };

        let ignored = candidates.count();
        if ignored > 0 {
            debug!(ignored, "Only the first file is taken");
        }

        self.select_file(first);
        true
    }

    /// Clear the selected file and return to Idle
    ///
    /// Ignored while a transfer is in flight.
    pub fn reset(&mut self) {
        if self.is_uploading() {
            warn!("Reset ignored while uploading");
            return;
        }

        if self.file.is_some() || self.state != TransferState::default() {
            debug!("Upload reset");
        }
        self.file = None;
        self.rearm();
    }

    /// Validate inputs and start the transfer
    ///
    /// Returns as soon as the transport has been asked to start. Validation
    /// failures land in [`Phase::Failed`] without touching the transport.
    pub fn submit(&mut self) {
        match self.state.phase {
            Phase::Uploading => {
                debug!("Submit ignored: transfer already in flight");
                return;
            }
            Phase::Succeeded => {
                debug!("Submit ignored: upload already complete");
                return;
            }
            Phase::Idle | Phase::Failed => {}
        }

        let request = match self.prepare() {
            Ok(request) => request,
            Err(error) => {
                if error == UploadError::InvalidUrl {
                    self.state.progress = 0;
                }
                self.fail(error);
                return;
            }
        };

        let id = request.id;
        let bytes = request.size;
        info!(
            transfer.id = %id,
            bytes,
            content_type = %request.content_type,
            target = %redact_url(&request.url),
            "Starting upload"
        );

        let handle = self
            .transport
            .dispatch(request, EventSink::new(id, self.events.clone()));

        self.state = TransferState {
            phase: Phase::Uploading,
            progress: 0,
            error: None,
        };
        self.indeterminate = false;
        self.in_flight = Some(InFlight {
            handle,
            started: Instant::now(),
            bytes,
        });
    }

    /// Ask the in-flight transfer to cancel
    ///
    /// The state only changes once the transport reports the abort.
    pub fn abort(&mut self) -> bool {
        match self.in_flight.as_mut() {
            Some(in_flight) => {
                let requested = in_flight.handle.abort();
                info!(transfer.id = %in_flight.handle.id(), requested, "Abort requested");
                requested
            }
            None => false,
        }
    }

    /// Apply a transport event
    ///
    /// Returns `true` when the visible state changed. Events from any
    /// transfer other than the one in flight are dropped.
    pub fn apply(&mut self, notice: TransferNotice) -> bool {
        let current = self.in_flight.as_ref().map(|f| f.handle.id());
        if current != Some(notice.id) {
            debug!(transfer.id = %notice.id, event = ?notice.event, "Stale transfer event dropped");
            return false;
        }

        match notice.event {
            TransferEvent::Progress {
                loaded,
                total,
                length_computable,
            } => {
                let percent = if length_computable {
                    progress_percent(loaded, total)
                } else {
                    None
                };

                match percent {
                    Some(percent) => {
                        let was_indeterminate = std::mem::replace(&mut self.indeterminate, false);
                        if percent > self.state.progress {
                            self.state.progress = percent;
                            true
                        } else {
                            was_indeterminate
                        }
                    }
                    None => !std::mem::replace(&mut self.indeterminate, true),
                }
            }
            TransferEvent::Load { status } if (200..300).contains(&status) => {
                self.succeed(status);
                true
            }
            TransferEvent::Load { status } => {
                self.fail(UploadError::HttpFailure { status });
                true
            }
            TransferEvent::Error => {
                self.fail(UploadError::TransportError);
                true
            }
            TransferEvent::Abort => {
                self.fail(UploadError::Aborted);
                true
            }
        }
    }

    /// Owned view of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            file: self.file.as_ref().map(FileSummary::from),
            target: self.target.clone(),
            indeterminate: self.indeterminate,
        }
    }

    /// Check preconditions in order and build the request
    fn prepare(&self) -> Result<TransferRequest, UploadError> {
        let file = match &self.file {
            Some(file) if !self.target.is_empty() => file,
            _ => return Err(UploadError::MissingInput),
        };
        let url = parse_target(&self.target).ok_or(UploadError::InvalidUrl)?;

        Ok(TransferRequest {
            id: TransferId::new(),
            method: Method::PUT,
            url,
            content_type: file.mime_type.clone(),
            payload: file.payload.clone(),
            size: file.size,
        })
    }

    fn rearm(&mut self) {
        self.state = TransferState::default();
        self.indeterminate = false;
        self.in_flight = None;
    }

    fn succeed(&mut self, status: u16) {
        self.state = TransferState {
            phase: Phase::Succeeded,
            progress: 100,
            error: None,
        };
        self.indeterminate = false;

        if let Some(in_flight) = self.in_flight.take() {
            let elapsed = in_flight.started.elapsed();
            metrics::record_upload_success(in_flight.bytes, elapsed.as_secs_f64());
            info!(
                transfer.id = %in_flight.handle.id(),
                status,
                bytes = in_flight.bytes,
                duration_ms = elapsed.as_millis(),
                "Upload completed"
            );
        }
    }

    fn fail(&mut self, error: UploadError) {
        self.state.phase = Phase::Failed;
        self.state.error = Some(error.to_string());

        let elapsed = self.in_flight.take().map(|f| f.started.elapsed());
        metrics::record_upload_failure(error.kind(), elapsed.map(|d| d.as_secs_f64()));
        warn!(
            reason = error.kind(),
            error = %error,
            duration_ms = ?elapsed.map(|d| d.as_millis()),
            "Upload failed"
        );
    }
}

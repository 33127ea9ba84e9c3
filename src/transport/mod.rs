//! Transport module
//!
//! The progress-observable HTTP PUT capability the upload controller drives.
//!
//! A [`Transport`] starts a transfer and returns immediately. Everything that
//! happens afterwards (progress, completion, network failure, cancellation)
//! is reported as [`TransferEvent`]s through the [`EventSink`] it was handed.
//!
//! # Example
//!
//! ```no_run
//! use presign_uploadr::config::TransportConfig;
//! use presign_uploadr::transport::HttpTransport;
//! use presign_uploadr::session::UploadSession;
//! use presign_uploadr::upload::SelectedFile;
//! use bytes::Bytes;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(&TransportConfig::default())?;
//! let mut session = UploadSession::new(transport);
//!
//! let controller = session.controller_mut();
//! controller.set_target("https://bucket.s3.amazonaws.com/hello.txt?X-Amz-Signature=abc");
//! controller.select_file(SelectedFile::from_bytes("hello.txt", "text/plain", Bytes::from("hi")));
//! controller.submit();
//!
//! let snapshot = session.run_until_settled(std::future::pending(), |_| {}).await;
//! println!("{:?}", snapshot.state.phase);
//! # Ok(())
//! # }
//! ```

use crate::upload::Payload;
use reqwest::Method;
use std::fmt;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use url::Url;
use uuid::Uuid;

pub mod http;
pub mod progress;
pub mod s3_error;

pub use http::HttpTransport;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Identifier of one transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferId(Uuid);

impl TransferId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Low-level events reported by a transport while a transfer runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Upload progress; `total` is only meaningful when `length_computable`
    Progress {
        loaded: u64,
        total: u64,
        length_computable: bool,
    },
    /// Server answered with an HTTP status
    Load { status: u16 },
    /// No HTTP response (connection refused, DNS failure, reset, ...)
    Error,
    /// Transfer cancelled before completion
    Abort,
}

impl TransferEvent {
    /// Whether this event ends the transfer
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferEvent::Progress { .. })
    }
}

/// An event tagged with the transfer that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferNotice {
    pub id: TransferId,
    pub event: TransferEvent,
}

/// Sending half handed to a transport for one transfer
#[derive(Debug, Clone)]
pub struct EventSink {
    id: TransferId,
    tx: mpsc::UnboundedSender<TransferNotice>,
}

impl EventSink {
    pub fn new(id: TransferId, tx: mpsc::UnboundedSender<TransferNotice>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> TransferId {
        self.id
    }

    /// Report an event; dropped silently once the receiver is gone
    pub fn emit(&self, event: TransferEvent) {
        let notice = TransferNotice { id: self.id, event };
        if self.tx.send(notice).is_err() {
            tracing::debug!(transfer.id = %self.id, "Event receiver dropped");
        }
    }
}

/// Everything a transport needs to perform one PUT
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub id: TransferId,
    pub method: Method,
    pub url: Url,
    /// `Content-Type` to send; empty means no explicit override
    pub content_type: String,
    pub payload: Payload,
    pub size: u64,
}

/// Handle on an in-flight transfer
#[derive(Debug)]
pub struct TransferHandle {
    id: TransferId,
    cancel: Option<oneshot::Sender<()>>,
}

impl TransferHandle {
    pub fn new(id: TransferId, cancel: oneshot::Sender<()>) -> Self {
        Self {
            id,
            cancel: Some(cancel),
        }
    }

    /// Handle for a transport that cannot be cancelled
    pub fn detached(id: TransferId) -> Self {
        Self { id, cancel: None }
    }

    pub fn id(&self) -> TransferId {
        self.id
    }

    /// Request cancellation; the transport answers with [`TransferEvent::Abort`]
    ///
    /// Returns `false` if the transfer cannot be cancelled or already finished.
    pub fn abort(&mut self) -> bool {
        match self.cancel.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

/// Progress-observable HTTP request capability
pub trait Transport {
    /// Start a transfer without waiting for it
    fn dispatch(&self, request: TransferRequest, events: EventSink) -> TransferHandle;
}

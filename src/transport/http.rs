//! HTTP transport
//!
//! Streams the payload to the pre-signed URL with `reqwest`, reporting
//! progress as the body is consumed. Each transfer runs on its own tokio
//! task. Dispatching outside a tokio runtime reports
//! [`TransferEvent::Error`] instead of starting the transfer.

use super::progress::ProgressStream;
use super::s3_error::parse_error_body;
use super::{EventSink, TransferEvent, TransferHandle, TransferRequest, Transport, TransportError};
use crate::config::TransportConfig;
use crate::upload::format::redact_url;
use crate::upload::Payload;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::oneshot;

type BodyStream = BoxStream<'static, io::Result<Bytes>>;

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    chunk_size: usize,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.connect_timeout_seconds {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            chunk_size: config.chunk_size,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Transport for HttpTransport {
    fn dispatch(&self, request: TransferRequest, events: EventSink) -> TransferHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let id = request.id;
        let client = self.client.clone();
        let chunk_size = self.chunk_size;

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(transfer.id = %id, error = %e, "No tokio runtime to run transfer");
                events.emit(TransferEvent::Error);
                return TransferHandle::detached(id);
            }
        };

        runtime.spawn(async move {
            let outcome = tokio::select! {
                event = send(client, request, chunk_size, events.clone()) => event,
                _ = cancel_rx => {
                    tracing::info!(transfer.id = %events.id(), "Transfer cancelled");
                    TransferEvent::Abort
                }
            };
            events.emit(outcome);
        });

        TransferHandle::new(id, cancel_tx)
    }
}

#[tracing::instrument(
    name = "transfer.put",
    skip_all,
    fields(
        transfer.id = %request.id,
        http.method = %request.method,
        http.url = %redact_url(&request.url),
        upload.bytes = request.size,
        http.status_code = tracing::field::Empty
    )
)]
async fn send(
    client: reqwest::Client,
    request: TransferRequest,
    chunk_size: usize,
    events: EventSink,
) -> TransferEvent {
    let body = match open_body(&request.payload, chunk_size).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open payload");
            return TransferEvent::Error;
        }
    };

    let body = ProgressStream::new(body, request.size, events);
    let mut builder = client
        .request(request.method.clone(), request.url.clone())
        .header(CONTENT_LENGTH, request.size)
        .body(reqwest::Body::wrap_stream(body));
    if !request.content_type.is_empty() {
        builder = builder.header(CONTENT_TYPE, request.content_type.as_str());
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "No response from storage endpoint");
            return TransferEvent::Error;
        }
    };

    let status = response.status();
    tracing::Span::current().record("http.status_code", status.as_u16());

    if status.is_success() {
        tracing::debug!(etag = ?response.headers().get("etag"), "Storage endpoint accepted upload");
    } else {
        let text = response.text().await.unwrap_or_default();
        match parse_error_body(&text) {
            Some(detail) => tracing::warn!(
                status = status.as_u16(),
                s3.error_code = %detail.code,
                s3.error_message = ?detail.message,
                s3.request_id = ?detail.request_id,
                "Storage endpoint rejected upload"
            ),
            None => tracing::warn!(status = status.as_u16(), "Storage endpoint rejected upload"),
        }
    }

    TransferEvent::Load {
        status: status.as_u16(),
    }
}

async fn open_body(payload: &Payload, chunk_size: usize) -> io::Result<BodyStream> {
    match payload {
        Payload::InMemory(bytes) => Ok(stream::iter(split_chunks(bytes.clone(), chunk_size))
            .map(Ok)
            .boxed()),
        Payload::OnDisk(path) => file_stream(path.clone(), chunk_size).await,
    }
}

fn split_chunks(mut bytes: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(bytes.len() / chunk_size + 1);
    while !bytes.is_empty() {
        let at = chunk_size.min(bytes.len());
        chunks.push(bytes.split_to(at));
    }
    chunks
}

async fn file_stream(path: PathBuf, chunk_size: usize) -> io::Result<BodyStream> {
    let file = tokio::fs::File::open(&path).await?;
    let chunk_size = chunk_size.max(1);

    Ok(stream::try_unfold(file, move |mut file| async move {
        let mut buf = vec![0u8; chunk_size];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok::<_, io::Error>(None);
        }
        buf.truncate(n);
        Ok(Some((Bytes::from(buf), file)))
    })
    .boxed())
}

//! Progress-reporting body stream
//!
//! Wraps the chunk stream handed to the HTTP client and emits a
//! [`TransferEvent::Progress`] for every chunk the client pulls.

use super::{EventSink, TransferEvent};
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// Body stream that counts bytes as they are consumed
    pub struct ProgressStream<S> {
        #[pin]
        inner: S,
        loaded: u64,
        total: u64,
        events: EventSink,
    }
}

impl<S> ProgressStream<S> {
    /// `total` of zero is reported as a non-computable length
    pub fn new(inner: S, total: u64, events: EventSink) -> Self {
        Self {
            inner,
            loaded: 0,
            total,
            events,
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }
}

impl<S> Stream for ProgressStream<S>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let polled = this.inner.poll_next(cx);

        if let Poll::Ready(Some(Ok(chunk))) = &polled {
            *this.loaded += chunk.len() as u64;
            this.events.emit(TransferEvent::Progress {
                loaded: *this.loaded,
                total: *this.total,
                length_computable: *this.total > 0,
            });
        }

        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

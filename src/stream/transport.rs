//! Ordered, close-once delivery of encoded events for one turn.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use super::encoder::{decode_frame, encode_frame};
use super::event::StreamEvent;
use crate::error::{Result, ThreadlineError};

/// Producer half of a turn's event channel.
///
/// Frames are written in call order. Once closed, by [`close`](Self::close),
/// by drop, or because the receiver went away, every further send fails.
#[derive(Debug)]
pub struct StreamTransport {
    tx: Option<mpsc::Sender<Bytes>>,
    disconnected: CancellationToken,
}

impl StreamTransport {
    /// Create a bounded channel holding at most `capacity` undelivered frames.
    pub fn channel(capacity: usize) -> (Self, TurnStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let disconnected = CancellationToken::new();
        (
            Self {
                tx: Some(tx),
                disconnected: disconnected.clone(),
            },
            TurnStream {
                inner: ReceiverStream::new(rx),
                disconnected,
            },
        )
    }

    /// Encode and deliver one event, waiting for buffer space if needed.
    pub async fn send(&mut self, event: &StreamEvent) -> Result<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(ThreadlineError::Transport("stream already closed".into()));
        };
        let frame = encode_frame(event)?;
        if tx.send(frame).await.is_err() {
            self.tx = None;
            return Err(ThreadlineError::Transport("client disconnected".into()));
        }
        Ok(())
    }

    /// Close the stream. Returns `true` only for the call that closed it.
    pub fn close(&mut self) -> bool {
        self.tx.take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }

    /// Whether the receiving side has been dropped.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.is_cancelled()
    }

    /// Resolves once the receiving side has been dropped.
    pub fn closed(&self) -> WaitForCancellationFutureOwned {
        self.disconnected.clone().cancelled_owned()
    }
}

/// Consumer half of a turn's event channel: one encoded frame per item.
///
/// Dropping it signals a disconnect to the producer.
#[derive(Debug)]
pub struct TurnStream {
    inner: ReceiverStream<Bytes>,
    disconnected: CancellationToken,
}

impl TurnStream {
    /// Decode frames back into events.
    pub fn into_events(self) -> impl Stream<Item = Result<StreamEvent>> + Send + 'static {
        self.map(|frame| decode_frame(&String::from_utf8_lossy(&frame)))
    }
}

impl Stream for TurnStream {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl Drop for TurnStream {
    fn drop(&mut self) {
        self.disconnected.cancel();
    }
}

pub use axum_core::body::Body;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::error::api::ApiError;

/// Tees a response body stream so the bytes sent to the client can also be
/// collected for logging and cache population.
#[derive(Debug)]
pub struct BodyReader {
    rx: UnboundedReceiver<Bytes>,
}

impl BodyReader {
    /// Wraps `stream` into a client-facing [`Body`] plus a reader receiving a
    /// copy of every frame.
    ///
    /// The unbounded channel is acceptable since memory is bounded higher in
    /// the stack by the request body limit and per-request concurrency.
    pub fn wrap_stream(
        stream: impl Stream<Item = Result<Bytes, ApiError>> + Send + 'static,
    ) -> (Body, BodyReader) {
        let (tx, rx) = mpsc::unbounded_channel();
        let s = stream.map(move |frame| {
            if let Ok(bytes) = &frame {
                // receiver may be gone if the logger task finished early
                let _ = tx.send(bytes.clone());
            }
            frame
        });
        (Body::from_stream(s), BodyReader { rx })
    }

    /// Drains the tee until the client-facing stream ends (or is dropped on
    /// client disconnect) and returns everything received.
    pub async fn collect(mut self) -> Bytes {
        let mut buf = BytesMut::new();
        while let Some(bytes) = self.rx.recv().await {
            buf.extend_from_slice(&bytes);
        }
        buf.freeze()
    }
}

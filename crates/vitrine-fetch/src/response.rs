//! Single-read responses and stream duplication

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, stream};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

use crate::error::FetchError;

/// Boxed single-read stream of body chunks
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, FetchError>> + Send>>;

/// A network response with a single-read body.
///
/// The body stream can be consumed exactly once. Any policy that needs to
/// both return a response and store it must call [`AssetResponse::tee`]
/// exactly once before either consumer reads.
pub struct AssetResponse {
    pub status: u16,
    pub content_type: String,
    pub body: BodyStream,
}

impl std::fmt::Debug for AssetResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl AssetResponse {
    /// Wrap an already-buffered body
    pub fn from_bytes(status: u16, content_type: impl Into<String>, body: Bytes) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: Box::pin(stream::once(async move { Ok(body) })),
        }
    }

    /// Wrap a live body stream
    pub fn from_stream(status: u16, content_type: impl Into<String>, body: BodyStream) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
        }
    }

    /// Duplicate the single-read body into two independently consumable
    /// responses.
    ///
    /// A pump task drains the source and forwards every chunk to both
    /// copies, so either copy can be read in full regardless of whether or
    /// when the other one is. A source error is delivered to both copies
    /// and ends the stream.
    pub fn tee(self) -> (AssetResponse, AssetResponse) {
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();

        let mut source = self.body;
        tokio::spawn(async move {
            while let Some(chunk) = source.next().await {
                match chunk {
                    Ok(bytes) => {
                        // Bytes clones share the underlying buffer
                        let _ = tx_a.send(Ok(bytes.clone()));
                        let _ = tx_b.send(Ok(bytes));
                    }
                    Err(e) => {
                        let msg = e.to_string();
                        debug!("Tee source stream failed: {}", msg);
                        let _ = tx_a.send(Err(FetchError::Stream(msg.clone())));
                        let _ = tx_b.send(Err(FetchError::Stream(msg)));
                        break;
                    }
                }
            }
        });

        let a = AssetResponse::from_stream(
            self.status,
            self.content_type.clone(),
            Box::pin(UnboundedReceiverStream::new(rx_a)),
        );
        let b = AssetResponse::from_stream(
            self.status,
            self.content_type,
            Box::pin(UnboundedReceiverStream::new(rx_b)),
        );
        (a, b)
    }

    /// Drain the body fully into memory
    pub async fn buffer(self) -> Result<(u16, String, Bytes), FetchError> {
        let mut buf = BytesMut::new();
        let mut body = self.body;
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok((self.status, self.content_type, buf.freeze()))
    }
}

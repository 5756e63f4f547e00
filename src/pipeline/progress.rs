//! Event delivery seam between the pipeline and its transport.
//!
//! The pipeline is a producer of [`StreamEvent`]s; the transport (WebSocket,
//! plain request/response, or an in-memory buffer in tests) is a consumer
//! behind the [`EventSink`] trait. The pipeline never touches a socket.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::StreamEvent;

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event in order. Returns false once the consumer is gone;
    /// the producer must stop emitting and abandon the session.
    async fn emit(&self, event: StreamEvent) -> bool;
}

/// Sink backed by a bounded channel; the transport owns the receiver.
/// A dropped receiver (client disconnect) surfaces as a failed emit.
pub struct ChannelSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: StreamEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }
}

/// Sink for the non-streaming path: progress is dropped, the caller only
/// sees the final result.
pub struct DiscardSink;

#[async_trait]
impl EventSink for DiscardSink {
    async fn emit(&self, _event: StreamEvent) -> bool {
        true
    }
}

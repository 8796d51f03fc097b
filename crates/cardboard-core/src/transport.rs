//! Transport seams used by the synchronization client.

use async_trait::async_trait;
use cardboard_api::{ApiError, QueryBatch, QueryResponse, UpdateEnvelope};
use tokio::sync::mpsc;

/// Outbound half of a connection.
///
/// `send` hands the envelope to the transport and returns immediately; it
/// must not wait for a network round trip. Acknowledgment arrives later, as
/// the update id showing up in the authoritative update-id stream.
pub trait UpdateSink: Send + Sync {
    fn send(&self, envelope: UpdateEnvelope) -> Result<(), ApiError>;
}

impl UpdateSink for mpsc::UnboundedSender<UpdateEnvelope> {
    fn send(&self, envelope: UpdateEnvelope) -> Result<(), ApiError> {
        mpsc::UnboundedSender::send(self, envelope).map_err(|_| ApiError::ConnectionClosed {
            message: "update channel closed".to_string(),
        })
    }
}

/// Query endpoint: answers a whole batch against one snapshot.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn query(&self, batch: QueryBatch) -> Result<QueryResponse, ApiError>;
}

//! Wire and domain value types shared by every cardboard component.
//!
//! Nothing in this crate performs I/O or holds state. The engine crate
//! (`cardboard`) builds snapshots, queries and the synchronization client on
//! top of these types.

use serde::{Deserialize, Serialize};

pub mod card;
pub mod category;
pub mod ids;
pub mod mutation;
pub mod query;
pub mod streaming;
pub mod time;
pub mod validation;
pub mod wire;

pub use card::{BoardId, Card, CardEvent, CardStatus, CardTree, Comment};
pub use category::{Category, CategoryWithColor, PresetColor, Project};
pub use ids::{CardId, CategoryId, CommentId, PresetColorId, ProjectId, UpdateId};
pub use mutation::{
    CardAdd, CardEdit, CardEdits, CardMove, CardMoveToAfter, CardMoveToBefore, CategoryAdd,
    CategoryReorder, CommentAdd, MoveDirection, Mutation, ProjectAdd, UpdateEnvelope,
    UpdateResponse,
};
pub use query::{QueryBatch, QueryRequest, QueryResponse, QueryResult};
pub use streaming::ConnectionStatus;
pub use time::Timestamp;
pub use validation::ValidationError;

/// Structured error type for the serialization boundary and the transport.
///
/// Domain operations (mutations, queries, tree building) never produce one of
/// these; a stale reference in a mutation is a no-op, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ApiError {
    #[error("Not connected: no transport is available to send updates")]
    NotConnected,

    #[error("Connection closed: {message}")]
    ConnectionClosed { message: String },

    #[error("Update {update_id} was not acknowledged before the correlation timeout")]
    CorrelationTimeout { update_id: UpdateId },

    #[error("Update {update_id} was abandoned before it was acknowledged")]
    UpdateAbandoned { update_id: UpdateId },

    #[error("Update {update_id} has already been applied")]
    DuplicateUpdate { update_id: UpdateId },

    #[error("Malformed payload at {path}: {message}")]
    Deserialization { path: String, message: String },

    #[error("Query result mismatch: expected {expected}, found {found}")]
    ResultMismatch { expected: String, found: String },

    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl ApiError {
    pub fn deserialization(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ApiError::Deserialization {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        ApiError::Transport {
            message: err.to_string(),
        }
    }
}

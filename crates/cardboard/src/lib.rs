//! Snapshot-based state and synchronization engine for hierarchical boards.
//!
//! - [`snapshot`]: the immutable [`AppSnapshot`] aggregate
//! - [`mutations`]: pure snapshot transitions, one per mutation kind
//! - [`state`]: append-only snapshot history with time travel
//! - [`query`]: typed queries, the executor and batches
//! - [`tree`]: board-scoped card trees
//! - [`sync`]: the optimistic client and update correlation
//! - [`server`]: an in-memory authoritative server and local transport

pub mod config;
pub mod logging;
pub mod mutations;
pub mod query;
pub mod server;
pub mod snapshot;
pub mod state;
pub mod sync;
pub mod tree;
pub mod validation;

pub use config::{CardboardConfig, SyncConfig};
pub use mutations::apply_mutation;
pub use query::{execute, Batch, BatchKey, Is, Query};
pub use server::{LocalConnection, MemoryServer};
pub use snapshot::AppSnapshot;
pub use state::{apply_app_update, initial_app_state, replay, AppState, HistoryCursor};
pub use sync::{PendingUpdate, SyncClient};
pub use tree::build_card_trees;

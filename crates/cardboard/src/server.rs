//! In-memory authoritative store and an in-process connection to it.
//!
//! `MemoryServer` is the single serialization point for updates: it applies
//! envelopes one at a time, refuses ids it has already applied, and
//! broadcasts every new state. `LocalConnection` plays the transport between
//! a [`SyncClient`] and a server in the same process.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use cardboard_api::{
    wire, ApiError, ConnectionStatus, QueryBatch, QueryResponse, UpdateEnvelope, UpdateId,
    UpdateResponse,
};
use cardboard_core::QueryTransport;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::query::execute_batch;
use crate::state::{apply_app_update, AppState};
use crate::sync::SyncClient;

#[derive(Debug, Default)]
struct Authority {
    state: Arc<AppState>,
    applied: HashSet<UpdateId>,
}

/// Authoritative update log held in memory.
///
/// # Example
///
/// ```rust,no_run
/// use cardboard::server::MemoryServer;
/// use cardboard::{query, SyncConfig};
/// use cardboard_core::QueryTransport;
///
/// async fn example() -> anyhow::Result<()> {
///     let server = MemoryServer::new(&SyncConfig::default());
///     let mut batch = query::Batch::new();
///     let colors = batch.add("colors", &query::all_colors());
///     let response = server.query(batch.into_requests()).await?;
///     assert_eq!(colors.get(&response)?.len(), 8);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MemoryServer {
    authority: RwLock<Authority>,
    pushes: broadcast::Sender<Arc<AppState>>,
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}

impl MemoryServer {
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_state(AppState::default(), config)
    }

    /// Start from an existing history, e.g. one rebuilt with `replay`.
    pub fn with_state(state: AppState, config: &SyncConfig) -> Self {
        let applied = state.update_ids().iter().cloned().collect();
        Self {
            authority: RwLock::new(Authority {
                state: Arc::new(state),
                applied,
            }),
            pushes: broadcast::channel(config.push_buffer.max(1)).0,
        }
    }

    pub async fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.authority.read().await.state)
    }

    /// Every state produced from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AppState>> {
        self.pushes.subscribe()
    }

    /// Apply one envelope on top of the latest snapshot.
    #[tracing::instrument(name = "server.apply_update", skip(self, envelope), fields(update_id = %envelope.update_id, kind = envelope.mutation.kind()))]
    pub async fn apply_update(&self, envelope: UpdateEnvelope) -> Result<UpdateResponse, ApiError> {
        let mut authority = self.authority.write().await;
        if authority.applied.contains(&envelope.update_id) {
            warn!("Rejecting duplicate update {}", envelope.update_id);
            return Err(ApiError::DuplicateUpdate {
                update_id: envelope.update_id,
            });
        }

        let next = Arc::new(apply_app_update(&authority.state, &envelope));
        let snapshot_index = next.snapshot_index();
        authority.applied.insert(envelope.update_id);
        authority.state = Arc::clone(&next);

        // No subscribers is fine.
        let _ = self.pushes.send(next);
        debug!("Applied update, now at snapshot {}", snapshot_index);
        Ok(UpdateResponse { snapshot_index })
    }

    /// Update endpoint over JSON.
    pub async fn handle_update_json(&self, json: &str) -> Result<UpdateResponse, ApiError> {
        let envelope = wire::decode_envelope(json)?;
        self.apply_update(envelope).await
    }

    /// Query endpoint over JSON.
    pub async fn handle_query_json(&self, json: &str) -> Result<QueryResponse, ApiError> {
        let batch = wire::decode_query_batch(json)?;
        self.query(batch).await
    }
}

#[async_trait]
impl QueryTransport for MemoryServer {
    /// Answer the whole batch from one snapshot.
    #[tracing::instrument(name = "server.query", skip(self, batch), fields(size = batch.len()))]
    async fn query(&self, batch: QueryBatch) -> Result<QueryResponse, ApiError> {
        let authority = self.authority.read().await;
        Ok(QueryResponse {
            snapshot_index: authority.state.snapshot_index(),
            results: execute_batch(authority.state.latest_snapshot(), &batch),
        })
    }
}

/// Query transport that doesn't keep the server alive.
struct LocalQueries(Weak<MemoryServer>);

#[async_trait]
impl QueryTransport for LocalQueries {
    async fn query(&self, batch: QueryBatch) -> Result<QueryResponse, ApiError> {
        let server = self.0.upgrade().ok_or_else(|| ApiError::ConnectionClosed {
            message: "server is gone".to_string(),
        })?;
        server.query(batch).await
    }
}

/// In-process transport between one client and one server.
///
/// Holds only weak references to the server: once the last strong reference is
/// dropped the client sees a `connection-error`.
pub struct LocalConnection {
    forward: JoinHandle<()>,
    relay: JoinHandle<()>,
    client: SyncClient,
}

impl LocalConnection {
    /// Attach `client` to `server` and start moving updates and states.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(server: &Arc<MemoryServer>, client: SyncClient) -> Result<Self, ApiError> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Subscribe before reading the current state so no push falls between.
        let pushes = server.subscribe();

        client.attach(
            Arc::new(tx),
            Arc::new(LocalQueries(Arc::downgrade(server))),
        )?;

        let forward = tokio::spawn(forward_updates(
            Arc::downgrade(server),
            rx,
            client.clone(),
        ));
        let relay = tokio::spawn(relay_states(
            Arc::downgrade(server),
            pushes,
            client.clone(),
        ));
        info!("Local connection established");

        Ok(Self {
            forward,
            relay,
            client,
        })
    }

    /// Stop both tasks and report the connection as lost.
    pub fn disconnect(self) {
        self.forward.abort();
        self.relay.abort();
        self.client.report_status(ConnectionStatus::ConnectionError {
            message: "disconnected".to_string(),
        });
    }
}

async fn forward_updates(
    server: Weak<MemoryServer>,
    mut updates: mpsc::UnboundedReceiver<UpdateEnvelope>,
    client: SyncClient,
) {
    while let Some(envelope) = updates.recv().await {
        let Some(server) = server.upgrade() else {
            client.report_status(ConnectionStatus::ConnectionError {
                message: "server is gone".to_string(),
            });
            return;
        };
        if let Err(err) = server.apply_update(envelope).await {
            error!("Update rejected by server: {}", err);
            client.report_status(ConnectionStatus::SyncError {
                message: err.to_string(),
            });
            return;
        }
    }
}

async fn relay_states(
    server: Weak<MemoryServer>,
    mut pushes: broadcast::Receiver<Arc<AppState>>,
    client: SyncClient,
) {
    if let Some(server) = server.upgrade() {
        client.receive_state(server.state().await);
    }

    loop {
        match pushes.recv().await {
            Ok(state) => client.receive_state(state),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Missed {} state push(es), resynchronizing", skipped);
                if let Some(server) = server.upgrade() {
                    client.receive_state(server.state().await);
                }
            }
            Err(broadcast::error::RecvError::Closed) => {
                client.report_status(ConnectionStatus::ConnectionError {
                    message: "push channel closed".to_string(),
                });
                return;
            }
        }
    }
}

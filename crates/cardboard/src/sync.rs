//! Synchronization client.
//!
//! The client sends mutations optimistically and tracks each one by its update
//! id. It never learns about success from the send itself: an update counts as
//! applied once its id shows up in an authoritative state pushed by the
//! transport. Each push is scanned only past the watermark, the number of
//! update ids already seen, so an id resolves its handle at most once.
//!
//! Architecture:
//! - `send` registers a oneshot handle and forwards the envelope, under one lock
//! - `receive_state` resolves handles for new ids and publishes the state
//! - Connection status lives in a `watch` channel; an error status detaches
//!   the transport but leaves pending handles alone

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use cardboard_api::{
    ApiError, ConnectionStatus, Mutation, QueryBatch, QueryResponse, Timestamp, UpdateEnvelope,
    UpdateId,
};
use cardboard_core::{QueryTransport, UpdateSink};
use tokio::sync::{oneshot, watch};
use tokio::time::Sleep;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::mutations::apply_mutation;
use crate::query::{Batch, Query};
use crate::snapshot::AppSnapshot;
use crate::state::{initial_app_state, AppState};

type Completion = oneshot::Sender<Result<(), ApiError>>;

/// Everything that must change together when sending or correlating.
#[derive(Default)]
struct Session {
    sink: Option<Arc<dyn UpdateSink>>,
    queries: Option<Arc<dyn QueryTransport>>,
    handles: HashMap<UpdateId, Completion>,
    /// Sent but not yet seen in an authoritative state, in send order.
    in_flight: Vec<UpdateEnvelope>,
    watermark: usize,
}

struct Shared {
    session: Mutex<Session>,
    state: watch::Sender<Arc<AppState>>,
    status: watch::Sender<ConnectionStatus>,
    correlation_timeout: Option<Duration>,
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Client side of the update protocol. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncClient {
    shared: Arc<Shared>,
}

impl Default for SyncClient {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}

impl SyncClient {
    /// A client in the `connecting` state with no transport attached.
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(Session::default()),
                state: watch::channel(Arc::new(initial_app_state())).0,
                status: watch::channel(ConnectionStatus::Connecting).0,
                correlation_timeout: config.correlation_timeout(),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Connection
    // -------------------------------------------------------------------------

    /// Install the transport and move to `connected`.
    ///
    /// Fails once the client has entered an error state.
    pub fn attach(
        &self,
        sink: Arc<dyn UpdateSink>,
        queries: Arc<dyn QueryTransport>,
    ) -> Result<(), ApiError> {
        let current = self.status();
        if current.is_error() {
            return Err(ApiError::ConnectionClosed {
                message: format!("client is in a terminal state: {current:?}"),
            });
        }

        {
            let mut session = self.shared.session();
            session.sink = Some(sink);
            session.queries = Some(queries);
        }
        self.report_status(ConnectionStatus::Connected);
        Ok(())
    }

    /// Record a status change reported by the transport.
    ///
    /// Transitions the state machine doesn't allow are ignored. Entering an
    /// error state detaches the transport; pending updates stay pending.
    pub fn report_status(&self, next: ConnectionStatus) {
        let mut previous = None;
        self.shared.status.send_if_modified(|current| {
            if *current == next || !current.can_transition_to(&next) {
                debug!("Ignoring status transition {:?} -> {:?}", current, next);
                return false;
            }
            previous = Some(std::mem::replace(current, next.clone()));
            true
        });
        let Some(previous) = previous else {
            return;
        };

        if next.is_error() {
            let mut session = self.shared.session();
            session.sink = None;
            session.queries = None;
            warn!(
                "Connection lost ({:?}), {} update(s) still pending",
                next,
                session.handles.len()
            );
        } else {
            info!("Connection status {:?} -> {:?}", previous, next);
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.borrow().clone()
    }

    /// Current status followed by every change.
    pub fn watch_status(&self) -> WatchStream<ConnectionStatus> {
        WatchStream::new(self.shared.status.subscribe())
    }

    // -------------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------------

    /// Stamp `mutation` with a fresh id and hand it to the transport.
    ///
    /// Returns as soon as the transport has accepted the envelope; await the
    /// returned [`PendingUpdate`] to learn when it was applied. Nothing is
    /// registered when sending fails.
    pub fn send(&self, mutation: Mutation) -> Result<PendingUpdate, ApiError> {
        let envelope = UpdateEnvelope::new(UpdateId::generate(), mutation);
        let update_id = envelope.update_id.clone();
        let (tx, rx) = oneshot::channel();

        let mut session = self.shared.session();
        let sink = session.sink.clone().ok_or(ApiError::NotConnected)?;

        // Register before sending so an immediate echo can't be missed.
        session.handles.insert(update_id.clone(), tx);
        session.in_flight.push(envelope.clone());
        if let Err(err) = sink.send(envelope) {
            session.handles.remove(&update_id);
            session.in_flight.retain(|e| e.update_id != update_id);
            return Err(err);
        }
        debug!(
            "Sent update {} ({} pending)",
            update_id,
            session.handles.len()
        );
        drop(session);

        Ok(PendingUpdate {
            update_id,
            receiver: rx,
            timeout: self.shared.correlation_timeout,
            deadline: None,
            shared: Arc::clone(&self.shared),
        })
    }

    /// Send a mutation and wait until the authoritative state contains it.
    #[tracing::instrument(name = "sync.mutate", skip(self, mutation), fields(kind = mutation.kind()))]
    pub async fn mutate(&self, mutation: Mutation) -> Result<UpdateId, ApiError> {
        let pending = self.send(mutation)?;
        let update_id = pending.update_id().clone();
        pending.await?;
        Ok(update_id)
    }

    /// Adopt an authoritative state pushed by the transport.
    ///
    /// Ids past the watermark resolve their pending handles. A state with
    /// fewer updates than already seen is stale and ignored.
    pub fn receive_state(&self, state: Arc<AppState>) {
        let mut session = self.shared.session();
        let seen = state.snapshot_index();
        if seen < session.watermark {
            debug!(
                "Ignoring stale state at {} (watermark {})",
                seen, session.watermark
            );
            return;
        }

        let fresh: HashSet<UpdateId> = state
            .update_ids_since(session.watermark)
            .iter()
            .cloned()
            .collect();
        let resolved: Vec<(UpdateId, Completion)> = fresh
            .iter()
            .filter_map(|id| session.handles.remove_entry(id))
            .collect();
        if !fresh.is_empty() {
            session
                .in_flight
                .retain(|envelope| !fresh.contains(&envelope.update_id));
        }
        session.watermark = seen;

        // A woken waiter must already see its update in `state()`.
        self.shared.state.send_replace(state);
        drop(session);

        for (update_id, handle) in resolved {
            // The waiter may have given up; that's fine.
            let _ = handle.send(Ok(()));
            debug!("Update {} applied", update_id);
        }
    }

    /// Reject every pending update with [`ApiError::UpdateAbandoned`].
    ///
    /// The updates may still be applied by the server; only the local waiters
    /// are released. Returns how many were abandoned.
    pub fn abandon_pending(&self) -> usize {
        let mut session = self.shared.session();
        session.in_flight.clear();
        let handles: Vec<_> = session.handles.drain().collect();
        drop(session);

        let count = handles.len();
        for (update_id, handle) in handles {
            warn!("Abandoning update {}", update_id);
            let _ = handle.send(Err(ApiError::UpdateAbandoned { update_id }));
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.shared.session().handles.len()
    }

    pub fn watermark(&self) -> usize {
        self.shared.session().watermark
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Latest authoritative state.
    pub fn state(&self) -> Arc<AppState> {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<Arc<AppState>> {
        self.shared.state.subscribe()
    }

    /// Latest authoritative snapshot with every in-flight update applied on
    /// top, in send order.
    pub fn optimistic_snapshot(&self) -> AppSnapshot {
        // State and in-flight list change together under the session lock.
        let (state, in_flight) = {
            let session = self.shared.session();
            (self.state(), session.in_flight.clone())
        };
        in_flight
            .iter()
            .fold(state.latest_snapshot().clone(), |snapshot, envelope| {
                let at = envelope.update_id.timestamp().unwrap_or(Timestamp::EPOCH);
                apply_mutation(&snapshot, &envelope.mutation, at)
            })
    }

    /// Run one typed query through the transport.
    #[tracing::instrument(name = "sync.query", skip(self, query), fields(kind = query.to_request().kind()))]
    pub async fn query<R: Clone>(&self, query: &Query<R>) -> Result<R, ApiError> {
        let mut batch = Batch::new();
        let key = batch.add("query", query);
        let response = self.query_batch(batch.into_requests()).await?;
        key.get(&response)
    }

    pub async fn query_batch(&self, batch: QueryBatch) -> Result<QueryResponse, ApiError> {
        let transport = self
            .shared
            .session()
            .queries
            .clone()
            .ok_or(ApiError::NotConnected)?;
        transport.query(batch).await
    }
}

/// Completion handle of one sent update.
///
/// Resolves with `Ok(())` once the update id appears in an authoritative
/// state. Without a configured timeout it may never resolve.
pub struct PendingUpdate {
    update_id: UpdateId,
    receiver: oneshot::Receiver<Result<(), ApiError>>,
    timeout: Option<Duration>,
    deadline: Option<Pin<Box<Sleep>>>,
    shared: Arc<Shared>,
}

impl PendingUpdate {
    pub fn update_id(&self) -> &UpdateId {
        &self.update_id
    }
}

impl Future for PendingUpdate {
    type Output = Result<(), ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;

        if let Poll::Ready(outcome) = Pin::new(&mut this.receiver).poll(cx) {
            return Poll::Ready(outcome.unwrap_or_else(|_| {
                Err(ApiError::UpdateAbandoned {
                    update_id: this.update_id.clone(),
                })
            }));
        }

        let Some(timeout) = this.timeout else {
            return Poll::Pending;
        };
        // Created on first poll so `send` works outside a runtime.
        let deadline = this
            .deadline
            .get_or_insert_with(|| Box::pin(tokio::time::sleep(timeout)));
        if deadline.as_mut().poll(cx).is_pending() {
            return Poll::Pending;
        }

        let mut session = this.shared.session();
        session.handles.remove(&this.update_id);
        session
            .in_flight
            .retain(|envelope| envelope.update_id != this.update_id);
        drop(session);

        // Resolution may have raced the deadline.
        if let Ok(outcome) = this.receiver.try_recv() {
            return Poll::Ready(outcome);
        }
        warn!(
            "Update {} not acknowledged within {:?}",
            this.update_id, timeout
        );
        Poll::Ready(Err(ApiError::CorrelationTimeout {
            update_id: this.update_id.clone(),
        }))
    }
}

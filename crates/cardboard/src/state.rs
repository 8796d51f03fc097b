//! Snapshot history.
//!
//! [`AppState`] is the append-only list of snapshots together with the id of
//! the update that produced each one after the first. Applying an update
//! extends the history from the latest snapshot; earlier snapshots stay
//! readable for time travel.

use std::sync::Arc;

use cardboard_api::{Timestamp, UpdateEnvelope, UpdateId};

use crate::mutations::apply_mutation;
use crate::snapshot::AppSnapshot;

/// Ordered history of snapshots and the update ids between them.
///
/// There is always exactly one more snapshot than there are update ids: the
/// initial snapshot has no id.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    snapshots: Vec<Arc<AppSnapshot>>,
    update_ids: Vec<UpdateId>,
}

impl Default for AppState {
    fn default() -> Self {
        initial_app_state()
    }
}

/// A history holding only the empty snapshot.
pub fn initial_app_state() -> AppState {
    AppState {
        snapshots: vec![Arc::new(AppSnapshot::empty())],
        update_ids: Vec::new(),
    }
}

/// Apply one update on top of the latest snapshot.
///
/// Comment creation times come from the time embedded in the update id, so the
/// same log always replays to the same snapshots.
pub fn apply_app_update(state: &AppState, envelope: &UpdateEnvelope) -> AppState {
    let at = envelope.update_id.timestamp().unwrap_or(Timestamp::EPOCH);
    let next = apply_mutation(state.latest_snapshot(), &envelope.mutation, at);
    state.add_snapshot(envelope.update_id.clone(), next)
}

/// Fold a recorded update log from the initial state.
pub fn replay<'a>(envelopes: impl IntoIterator<Item = &'a UpdateEnvelope>) -> AppState {
    envelopes
        .into_iter()
        .fold(initial_app_state(), |state, envelope| {
            apply_app_update(&state, envelope)
        })
}

impl AppState {
    pub fn latest_snapshot(&self) -> &AppSnapshot {
        // Never empty: every constructor starts from one snapshot.
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn latest(&self) -> Arc<AppSnapshot> {
        Arc::clone(&self.snapshots[self.snapshots.len() - 1])
    }

    /// The snapshot at `index`, where 0 is the initial snapshot.
    pub fn snapshot(&self, index: usize) -> Option<&Arc<AppSnapshot>> {
        self.snapshots.get(index)
    }

    /// Index of the latest snapshot, which is also the number of applied updates.
    pub fn snapshot_index(&self) -> usize {
        self.update_ids.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; present for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn update_ids(&self) -> &[UpdateId] {
        &self.update_ids
    }

    /// Ids applied after the first `watermark` updates.
    pub fn update_ids_since(&self, watermark: usize) -> &[UpdateId] {
        self.update_ids.get(watermark..).unwrap_or(&[])
    }

    /// Index of the snapshot produced by `update_id`.
    pub fn position_of(&self, update_id: &UpdateId) -> Option<usize> {
        self.update_ids
            .iter()
            .position(|id| id == update_id)
            .map(|position| position + 1)
    }

    /// Append a snapshot and the id of the update that produced it.
    pub fn add_snapshot(&self, update_id: UpdateId, snapshot: AppSnapshot) -> AppState {
        let mut snapshots = self.snapshots.clone();
        let mut update_ids = self.update_ids.clone();
        snapshots.push(Arc::new(snapshot));
        update_ids.push(update_id);
        AppState {
            snapshots,
            update_ids,
        }
    }
}

/// A time-travel selection over an [`AppState`].
///
/// The cursor either follows the latest snapshot or holds an explicit index.
/// An explicit index stays put as history grows, and is clamped to the
/// history it is resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryCursor {
    selected: Option<usize>,
}

impl HistoryCursor {
    pub fn following_latest() -> Self {
        Self { selected: None }
    }

    pub fn at(index: usize) -> Self {
        Self {
            selected: Some(index),
        }
    }

    pub fn select(&mut self, index: usize) {
        self.selected = Some(index);
    }

    pub fn follow_latest(&mut self) {
        self.selected = None;
    }

    pub fn is_following_latest(&self) -> bool {
        self.selected.is_none()
    }

    pub fn index(&self, state: &AppState) -> usize {
        let latest = state.snapshot_index();
        self.selected.map_or(latest, |index| index.min(latest))
    }

    pub fn snapshot(&self, state: &AppState) -> Arc<AppSnapshot> {
        Arc::clone(&state.snapshots[self.index(state)])
    }

    /// Select the previous snapshot, stopping at the initial one.
    pub fn step_back(&mut self, state: &AppState) {
        self.selected = Some(self.index(state).saturating_sub(1));
    }

    /// Select the next snapshot; stepping onto the latest resumes following.
    pub fn step_forward(&mut self, state: &AppState) {
        let next = self.index(state) + 1;
        if next >= state.snapshot_index() {
            self.selected = None;
        } else {
            self.selected = Some(next);
        }
    }
}

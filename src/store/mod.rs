//! Selection store: the canonical client-side snapshot.
//!
//! Readers get an `Arc<SyncState>` that never changes underneath them. Writers
//! submit a [`Transition`]; the store applies it to a copy of the current
//! snapshot, checks invariants, recomputes derived values and publishes the
//! copy. Transitions are serialized by a single write lock, so no reader ever
//! sees a half-applied change.

pub mod state;
mod transition;

pub use state::{
    AccountMode, AccountSelection, GroupSelection, MarketSelection, Settings, SyncState,
    TradeForm, TradeType,
};
pub use transition::{Transition, UpdateOutcome};

use crate::domain::group::GroupConfig;
use crate::error::{InputError, InvariantViolation};
use async_lock::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct SelectionStore {
    state: RwLock<Arc<SyncState>>,
    version: AtomicU64,
    /// Latest account selection request handed out.
    selection_ticket: AtomicU64,
}

impl SelectionStore {
    pub fn new(config: GroupConfig) -> Result<Self, InputError> {
        Ok(Self::from_state(SyncState::new(config)?))
    }

    pub(crate) fn from_state(mut state: SyncState) -> Self {
        state.refresh_derived();
        Self {
            state: RwLock::new(Arc::new(state)),
            version: AtomicU64::new(0),
            selection_ticket: AtomicU64::new(0),
        }
    }

    /// Current snapshot.
    pub async fn read(&self) -> Arc<SyncState> {
        self.state.read().await.clone()
    }

    /// Number of snapshots published so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Register a new account selection request.
    ///
    /// A transition carrying an older ticket is reported `Stale` instead of
    /// being applied, so a slow fetch never replaces a newer selection.
    pub fn begin_account_selection(&self) -> u64 {
        self.selection_ticket.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Apply one transition atomically.
    ///
    /// A transition that would break an invariant is rejected and the
    /// published snapshot is left as it was.
    pub async fn update(&self, transition: Transition) -> Result<UpdateOutcome, InvariantViolation> {
        let name = transition.name();
        let mut guard = self.state.write().await;
        if let Some(ticket) = transition.selection_ticket() {
            let latest = self.selection_ticket.load(Ordering::Acquire);
            if ticket != latest {
                tracing::debug!(transition = name, ticket, latest, "superseded account selection");
                return Ok(UpdateOutcome::Stale);
            }
        }
        let mut next = SyncState::clone(&guard);

        match transition.apply(&mut next) {
            UpdateOutcome::Changed => {}
            outcome => {
                tracing::debug!(transition = name, ?outcome, "store transition skipped");
                return Ok(outcome);
            }
        }

        if let Err(violation) = next.check_invariants() {
            tracing::error!(transition = name, %violation, "store transition rejected");
            return Err(violation);
        }
        next.refresh_derived();

        if next == **guard {
            return Ok(UpdateOutcome::Unchanged);
        }

        *guard = Arc::new(next);
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(transition = name, version, "store snapshot published");
        Ok(UpdateOutcome::Changed)
    }
}

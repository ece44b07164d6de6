//! Durable flow-state slot
//!
//! One logical slot holding the state of the single in-flight OAuth flow.
//! The slot is always wholesale replaced or deleted, never
//! read-modified-written, which is what lets three independently scheduled
//! contexts share it without a lock.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::local::LocalStore;
use st_types::{AppResult, FlowState};

/// Storage key for the in-flight flow state
pub const FLOW_STATE_SLOT: &str = "oauth_flow_state";

/// Persistence surface for the single in-flight flow
///
/// Injected into the flow orchestrator so the single-slot concurrency model
/// is a visible constructor parameter and tests can run against
/// [`MemoryFlowStateStore`].
#[async_trait]
pub trait FlowStateStore: Send + Sync {
    /// Persist a flow state, unconditionally overwriting any existing one.
    ///
    /// Last-writer-wins is acceptable because only one flow is supported at
    /// a time.
    async fn save(&self, state: &FlowState) -> AppResult<()>;

    /// Load the current flow state, if one is pending
    async fn load(&self) -> AppResult<Option<FlowState>>;

    /// Delete the slot. Clearing an already-absent slot is not an error.
    async fn clear(&self) -> AppResult<()>;

    /// Whether a flow state is currently persisted
    async fn exists(&self) -> AppResult<bool> {
        Ok(self.load().await?.is_some())
    }
}

/// Flow-state slot backed by the shared [`LocalStore`]
pub struct LocalFlowStateStore {
    store: Arc<LocalStore>,
}

impl LocalFlowStateStore {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FlowStateStore for LocalFlowStateStore {
    async fn save(&self, state: &FlowState) -> AppResult<()> {
        self.store.set(FLOW_STATE_SLOT, state).await?;
        debug!("Persisted flow state");
        Ok(())
    }

    async fn load(&self) -> AppResult<Option<FlowState>> {
        self.store.get(FLOW_STATE_SLOT).await
    }

    async fn clear(&self) -> AppResult<()> {
        self.store.remove(FLOW_STATE_SLOT).await?;
        debug!("Cleared flow state");
        Ok(())
    }
}

/// In-memory flow-state slot for tests
#[derive(Default)]
pub struct MemoryFlowStateStore {
    slot: Mutex<Option<FlowState>>,
}

impl MemoryFlowStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStateStore for MemoryFlowStateStore {
    async fn save(&self, state: &FlowState) -> AppResult<()> {
        *self.slot.lock() = Some(state.clone());
        Ok(())
    }

    async fn load(&self) -> AppResult<Option<FlowState>> {
        Ok(self.slot.lock().clone())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

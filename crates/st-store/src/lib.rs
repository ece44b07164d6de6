//! Extension-local durable storage for SideTab
//!
//! Everything here must be safe to call from a freshly restarted background
//! process with no in-memory knowledge of prior calls. That restart-survival
//! property is the entire reason this layer exists instead of plain
//! in-memory variables.

pub mod credentials;
pub mod flow_state;
pub mod local;

pub use credentials::{
    CredentialStore, LocalCredentialStore, MemoryCredentialStore, API_KEY_SLOT,
};
pub use flow_state::{
    FlowStateStore, LocalFlowStateStore, MemoryFlowStateStore, FLOW_STATE_SLOT,
};
pub use local::LocalStore;

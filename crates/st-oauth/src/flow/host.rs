//! Browser tab surface the flow core drives
//!
//! The host owns tab creation, tab removal, and the navigation-event feed.
//! It is injected so tests can run against a recording fake.

use async_trait::async_trait;
use std::fmt;

use st_types::AppResult;

/// Host-assigned tab identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loading state reported with a navigation event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The tab is still loading the URL
    Loading,
    /// The navigation finished
    Complete,
}

/// A tab's URL changing, as reported by the host browser
///
/// Ephemeral input: the host may redeliver events for the same navigation,
/// and the watcher must tolerate that.
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    /// Tab the navigation happened in
    pub tab: TabId,

    /// The tab's URL after the change
    pub url: String,

    /// Whether the navigation has finished loading
    pub status: LoadStatus,
}

/// Tab operations provided by the host browser
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Open a new foreground tab at the given URL
    async fn open_tab(&self, url: &str) -> AppResult<TabId>;

    /// Close a tab
    async fn close_tab(&self, tab: TabId) -> AppResult<()>;
}

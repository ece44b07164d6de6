//! Panel-side authentication controller
//!
//! A thin consumer of the flow core: it renders a phase, starts flows, and
//! reacts to resolution broadcasts. It contains no flow logic of its own.
//!
//! Its notification subscription is scoped to the controller's lifetime
//! (mount to drop), unlike the orchestrator's process-lifetime navigation
//! subscription. Because delivery is best-effort, the controller also
//! checks flow-state presence on mount to recover a flow that was pending
//! while no panel was listening.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::warn;

use st_oauth::{FlowResult, OAuthOrchestrator};
use st_types::AuthNotification;

/// What the panel should currently render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    /// Show the connect screen
    #[default]
    Idle,
    /// A flow is in progress; show the waiting screen
    Pending,
    /// The flow completed; the credential is available
    Success,
    /// The flow failed; show the message and a retry action
    Error,
}

#[derive(Default)]
struct DisplayState {
    phase: AuthPhase,
    error_message: Option<String>,
    api_key: Option<String>,
}

/// Auth flow client held by a mounted panel
///
/// Dropping the controller tears down its notification listener, so a
/// remounted panel never leaves a dangling subscription behind.
pub struct AuthController {
    orchestrator: Arc<OAuthOrchestrator>,
    display: Arc<Mutex<DisplayState>>,
    listener: JoinHandle<()>,
}

impl AuthController {
    /// Mount the controller: recover pending display state from the
    /// durable slot and subscribe to resolutions
    pub async fn mount(orchestrator: Arc<OAuthOrchestrator>) -> Self {
        let display = Arc::new(Mutex::new(DisplayState::default()));

        match orchestrator.has_pending_flow().await {
            Ok(true) => display.lock().phase = AuthPhase::Pending,
            Ok(false) => {}
            Err(e) => warn!("Failed to check for pending flow: {}", e),
        }

        let mut rx = orchestrator.notifier().subscribe();
        let listener_display = Arc::clone(&display);
        let listener = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notification) => apply_notification(&listener_display, notification),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Dropped {} auth notifications", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self {
            orchestrator,
            display,
            listener,
        }
    }

    /// Phase the panel should render
    pub fn phase(&self) -> AuthPhase {
        self.display.lock().phase
    }

    /// Provider or transport message for the error phase, if any
    pub fn error_message(&self) -> Option<String> {
        self.display.lock().error_message.clone()
    }

    /// Credential delivered by the last completed flow, if any
    pub fn api_key(&self) -> Option<String> {
        self.display.lock().api_key.clone()
    }

    /// Start an authorization flow and switch the panel to pending
    pub async fn start_auth(&self) -> FlowResult<()> {
        {
            let mut display = self.display.lock();
            display.phase = AuthPhase::Pending;
            display.error_message = None;
        }

        if let Err(e) = self.orchestrator.start_flow().await {
            let mut display = self.display.lock();
            display.phase = AuthPhase::Error;
            display.error_message = Some(e.to_string());
            return Err(e);
        }

        Ok(())
    }

    /// Return the panel to the connect screen after a failure
    ///
    /// Resets display state only; the durable flow state is untouched. The
    /// next `start_auth` begins an entirely new attempt with fresh PKCE
    /// material.
    pub fn retry(&self) {
        let mut display = self.display.lock();
        display.phase = AuthPhase::Idle;
        display.error_message = None;
    }
}

impl Drop for AuthController {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn apply_notification(display: &Mutex<DisplayState>, notification: AuthNotification) {
    let mut display = display.lock();
    match notification {
        AuthNotification::Complete { api_key } => {
            display.phase = AuthPhase::Success;
            display.error_message = None;
            display.api_key = Some(api_key);
        }
        AuthNotification::Error { error } => {
            display.phase = AuthPhase::Error;
            display.error_message = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use st_oauth::{
        CodeExchanger, FlowError, OAuthConfig, TabHost, TabId,
    };
    use st_store::{
        CredentialStore, FlowStateStore, MemoryCredentialStore, MemoryFlowStateStore,
    };
    use st_types::{AppError, AppResult, FlowState};
    use std::time::Duration;

    struct FakeTabHost {
        fail_open: bool,
    }

    #[async_trait]
    impl TabHost for FakeTabHost {
        async fn open_tab(&self, _url: &str) -> AppResult<TabId> {
            if self.fail_open {
                return Err(AppError::TabHost("tab creation denied".to_string()));
            }
            Ok(TabId(1))
        }

        async fn close_tab(&self, _tab: TabId) -> AppResult<()> {
            Ok(())
        }
    }

    struct FakeExchanger;

    #[async_trait]
    impl CodeExchanger for FakeExchanger {
        async fn exchange(&self, _code: &str, _code_verifier: &str) -> Result<String, FlowError> {
            Ok("sk-or-v1-abc".to_string())
        }
    }

    fn orchestrator_with(
        store: Arc<MemoryFlowStateStore>,
        fail_open: bool,
    ) -> Arc<OAuthOrchestrator> {
        Arc::new(OAuthOrchestrator::new(
            OAuthConfig::default(),
            store as Arc<dyn FlowStateStore>,
            Arc::new(MemoryCredentialStore::new()) as Arc<dyn CredentialStore>,
            Arc::new(FakeTabHost { fail_open }),
            Arc::new(FakeExchanger),
        ))
    }

    async fn wait_for_phase(controller: &AuthController, phase: AuthPhase) {
        for _ in 0..200 {
            if controller.phase() == phase {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Controller never reached {:?}", phase);
    }

    #[tokio::test]
    async fn test_mount_with_no_pending_flow_is_idle() {
        let store = Arc::new(MemoryFlowStateStore::new());
        let controller = AuthController::mount(orchestrator_with(store, false)).await;

        assert_eq!(controller.phase(), AuthPhase::Idle);
        assert!(controller.error_message().is_none());
    }

    #[tokio::test]
    async fn test_mount_recovers_pending_flow() {
        let store = Arc::new(MemoryFlowStateStore::new());
        store
            .save(&FlowState::new(
                "verifier".to_string(),
                "challenge".to_string(),
                "http://localhost:3000/auth/callback".to_string(),
            ))
            .await
            .unwrap();

        let controller = AuthController::mount(orchestrator_with(store, false)).await;

        assert_eq!(controller.phase(), AuthPhase::Pending);
    }

    #[tokio::test]
    async fn test_start_auth_switches_to_pending() {
        let store = Arc::new(MemoryFlowStateStore::new());
        let orchestrator = orchestrator_with(Arc::clone(&store), false);
        let controller = AuthController::mount(orchestrator).await;

        controller.start_auth().await.unwrap();

        assert_eq!(controller.phase(), AuthPhase::Pending);
        assert!(store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_start_auth_failure_shows_error() {
        let store = Arc::new(MemoryFlowStateStore::new());
        let controller = AuthController::mount(orchestrator_with(store, true)).await;

        let err = controller.start_auth().await.unwrap_err();
        assert!(matches!(err, FlowError::Start(_)));

        assert_eq!(controller.phase(), AuthPhase::Error);
        assert!(controller.error_message().is_some());
    }

    #[tokio::test]
    async fn test_complete_notification_switches_to_success() {
        let store = Arc::new(MemoryFlowStateStore::new());
        let orchestrator = orchestrator_with(store, false);
        let controller = AuthController::mount(Arc::clone(&orchestrator)).await;

        orchestrator.notifier().notify(AuthNotification::Complete {
            api_key: "sk-or-v1-abc".to_string(),
        });

        wait_for_phase(&controller, AuthPhase::Success).await;
        assert_eq!(controller.api_key(), Some("sk-or-v1-abc".to_string()));
        assert!(controller.error_message().is_none());
    }

    #[tokio::test]
    async fn test_error_notification_switches_to_error() {
        let store = Arc::new(MemoryFlowStateStore::new());
        let orchestrator = orchestrator_with(store, false);
        let controller = AuthController::mount(Arc::clone(&orchestrator)).await;

        orchestrator.notifier().notify(AuthNotification::Error {
            error: "Invalid code".to_string(),
        });

        wait_for_phase(&controller, AuthPhase::Error).await;
        assert_eq!(controller.error_message(), Some("Invalid code".to_string()));
    }

    #[tokio::test]
    async fn test_retry_resets_display_without_touching_store() {
        let store = Arc::new(MemoryFlowStateStore::new());
        let orchestrator = orchestrator_with(Arc::clone(&store), false);
        let controller = AuthController::mount(Arc::clone(&orchestrator)).await;

        controller.start_auth().await.unwrap();
        orchestrator.notifier().notify(AuthNotification::Error {
            error: "boom".to_string(),
        });
        wait_for_phase(&controller, AuthPhase::Error).await;

        controller.retry();

        assert_eq!(controller.phase(), AuthPhase::Idle);
        assert!(controller.error_message().is_none());
        // retry is display-only: the pending slot is untouched
        assert!(store.exists().await.unwrap());
    }
}

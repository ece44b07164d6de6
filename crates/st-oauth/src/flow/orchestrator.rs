//! OAuth flow orchestrator
//!
//! Drives one authorization attempt at a time through
//! `Idle -> Starting -> AwaitingCallback -> Exchanging -> Completed | Failed`,
//! with the durable flow-state slot as the only shared mutable resource.
//! The slot is always wholesale replaced or deleted, never
//! read-modified-written.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::OAuthConfig;
use crate::errors::{FlowError, FlowResult};
use crate::flow::host::{LoadStatus, NavigationEvent, TabHost, TabId};
use crate::flow::notifications::AuthNotifier;
use crate::flow::pkce::{build_authorization_url, extract_authorization_code, generate_pkce_pair};
use crate::flow::token_exchange::CodeExchanger;
use st_store::{CredentialStore, FlowStateStore};
use st_types::{AuthNotification, FlowState};

/// Phase of the current authorization attempt
///
/// `Completed` and `Failed` are terminal per attempt; the flow state they
/// leave behind is already cleared, so a new `start_flow` is permitted from
/// either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    Starting,
    AwaitingCallback,
    Exchanging,
    Completed,
    Failed,
}

/// Orchestrates the authorization code flow across the background process,
/// the foreground authorization tab, and the panel
///
/// Owns exactly one navigation-event subscription for its whole process
/// lifetime (see [`OAuthOrchestrator::run`]); panel clients hold their own
/// mount-scoped subscriptions on the notifier instead.
pub struct OAuthOrchestrator {
    config: OAuthConfig,

    /// Durable slot for the single in-flight flow
    store: Arc<dyn FlowStateStore>,

    /// Destination for the exchanged API key
    credentials: Arc<dyn CredentialStore>,

    /// Browser tab surface
    host: Arc<dyn TabHost>,

    /// Token endpoint client
    exchanger: Arc<dyn CodeExchanger>,

    /// Resolution broadcast to panels
    notifier: AuthNotifier,

    /// In-memory phase of the current attempt. Deliberately not durable:
    /// after a restart the machine is Idle and the stale slot resolves
    /// through the orphaned-callback path.
    phase: Mutex<FlowPhase>,
}

impl OAuthOrchestrator {
    pub fn new(
        config: OAuthConfig,
        store: Arc<dyn FlowStateStore>,
        credentials: Arc<dyn CredentialStore>,
        host: Arc<dyn TabHost>,
        exchanger: Arc<dyn CodeExchanger>,
    ) -> Self {
        Self {
            config,
            store,
            credentials,
            host,
            exchanger,
            notifier: AuthNotifier::new(),
            phase: Mutex::new(FlowPhase::Idle),
        }
    }

    /// Resolution broadcast handle for panel subscriptions
    pub fn notifier(&self) -> &AuthNotifier {
        &self.notifier
    }

    /// Phase of the current attempt
    pub fn phase(&self) -> FlowPhase {
        *self.phase.lock()
    }

    /// Whether a flow state is persisted, i.e. an attempt is pending from
    /// the panel's perspective (possibly started before a restart)
    pub async fn has_pending_flow(&self) -> FlowResult<bool> {
        Ok(self.store.exists().await?)
    }

    /// Start a new authorization flow
    ///
    /// Generates fresh PKCE material, persists the flow state, and opens
    /// exactly one tab at the authorization URL. Rejected while an attempt
    /// is awaiting its callback or exchanging, so a second call cannot
    /// orphan a live flow. On failure no flow state is left behind.
    pub async fn start_flow(&self) -> FlowResult<()> {
        {
            let mut phase = self.phase.lock();
            if matches!(
                *phase,
                FlowPhase::Starting | FlowPhase::AwaitingCallback | FlowPhase::Exchanging
            ) {
                return Err(FlowError::Start(
                    "An authentication flow is already in progress".to_string(),
                ));
            }
            *phase = FlowPhase::Starting;
        }

        match self.open_authorization_tab().await {
            Ok(()) => {
                *self.phase.lock() = FlowPhase::AwaitingCallback;
                info!("OAuth flow started, awaiting callback");
                Ok(())
            }
            Err(e) => {
                *self.phase.lock() = FlowPhase::Idle;
                error!("Failed to start OAuth flow: {}", e);
                Err(e)
            }
        }
    }

    async fn open_authorization_tab(&self) -> FlowResult<()> {
        let pair = generate_pkce_pair()
            .map_err(|e| FlowError::Start(format!("Failed to generate PKCE material: {}", e)))?;

        let state = FlowState::new(
            pair.code_verifier,
            pair.code_challenge.clone(),
            self.config.callback_url.clone(),
        );
        self.store
            .save(&state)
            .await
            .map_err(|e| FlowError::Start(format!("Failed to persist flow state: {}", e)))?;

        let auth_url = build_authorization_url(
            &self.config.auth_endpoint,
            &self.config.callback_url,
            &pair.code_challenge,
        );

        if let Err(e) = self.host.open_tab(&auth_url).await {
            // Roll back so a failed start leaves no pending flow behind
            if let Err(clear_err) = self.store.clear().await {
                warn!("Failed to roll back flow state: {}", clear_err);
            }
            return Err(FlowError::Start(format!(
                "Failed to open authorization tab: {}",
                e
            )));
        }

        Ok(())
    }

    /// Consume navigation events for the lifetime of the process
    ///
    /// Subscribed once at process start. Events are handled strictly in
    /// delivery order with the callback awaited inline, which, combined
    /// with the single slot, makes redelivered navigations resolve as
    /// orphaned instead of re-exchanging.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<NavigationEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_navigation(event).await;
        }
        debug!("Navigation event stream closed");
    }

    /// Inspect one navigation event, resolving the flow if it is the
    /// awaited callback
    ///
    /// A callback match requires a finished load, the configured callback
    /// URL as an exact prefix (never a substring match, which would trip on
    /// intermediate redirect URLs), and a present authorization code.
    /// Everything else is ignored with no side effect.
    async fn handle_navigation(&self, event: NavigationEvent) {
        if event.status != LoadStatus::Complete {
            return;
        }
        if !event.url.starts_with(&self.config.callback_url) {
            return;
        }
        let Some(code) = extract_authorization_code(&event.url) else {
            return;
        };

        info!("Authorization callback received in tab {}", event.tab);
        *self.phase.lock() = FlowPhase::Exchanging;

        let result = self.complete_flow(&code).await;

        // The authorization tab has served its purpose either way.
        // Best-effort: a close failure is logged, never escalated.
        if let Err(e) = self.host.close_tab(event.tab).await {
            warn!("Failed to close authorization tab {}: {}", event.tab, e);
        }

        match result {
            Ok(api_key) => {
                *self.phase.lock() = FlowPhase::Completed;
                info!("OAuth flow completed");
                self.notifier.notify(AuthNotification::Complete { api_key });
            }
            Err(e) => {
                *self.phase.lock() = FlowPhase::Failed;
                error!("OAuth flow failed: {}", e);
                self.notifier.notify(AuthNotification::Error {
                    error: e.to_string(),
                });
            }
        }
    }

    /// Exchange the callback's code against the pending flow state
    async fn complete_flow(&self, code: &str) -> FlowResult<String> {
        let Some(state) = self.store.load().await? else {
            // Restart lost the state, or this navigation was replayed
            // after the slot was already cleared. No exchange is attempted.
            return Err(FlowError::OrphanedCallback);
        };

        let exchanged = self.exchanger.exchange(code, &state.code_verifier).await;

        // Codes are single-use, so the state is spent regardless of the
        // outcome and must not leak into the next attempt.
        if let Err(e) = self.store.clear().await {
            warn!("Failed to clear flow state: {}", e);
        }

        let api_key = exchanged?;

        self.credentials.store(&api_key).await?;

        Ok(api_key)
    }

    /// Abandon the pending flow, if any
    ///
    /// Clears the slot idempotently and returns the machine to `Idle`. A
    /// late callback from the abandoned tab then resolves as orphaned.
    pub async fn cancel_flow(&self) -> FlowResult<()> {
        self.store.clear().await?;
        *self.phase.lock() = FlowPhase::Idle;
        info!("OAuth flow cancelled");
        Ok(())
    }
}

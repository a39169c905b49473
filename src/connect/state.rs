//! The connection state for one identity + provider pair.

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::Credentials;
use crate::error::ConnectError;
use crate::identity::Identity;
use crate::provider::ProviderKind;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(Credentials),
    Error(String),
}

impl ConnectionState {
    /// Rebuild the state from the params the host carries around.
    /// Connected iff credentials are present and were issued for `provider`.
    pub fn derive(params: &IntegrationParams, provider: ProviderKind) -> Self {
        match (&params.credentials, params.provider) {
            (Some(credentials), Some(p)) if p == provider => {
                ConnectionState::Connected(credentials.clone())
            }
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            ConnectionState::Connected(credentials) => Some(credentials),
            _ => None,
        }
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, ConnectionState::Connecting)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected(_) => "connected",
            ConnectionState::Error(_) => "error",
        }
    }
}

/// What the host hands to downstream consumers: credentials plus the
/// provider they belong to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrationParams {
    pub credentials: Option<Credentials>,
    pub provider: Option<ProviderKind>,
}

/// One authorization attempt. Results tagged with an older attempt are
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt(u64);

struct Attempts {
    current: u64,
    exchanging: bool,
}

/// Single source of truth for a connection.
///
/// Every transition happens under one lock and is published on a watch
/// channel, so observers never see a half-applied change.
pub struct ConnectionHolder {
    identity: Identity,
    provider: ProviderKind,
    attempts: Mutex<Attempts>,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionHolder {
    pub fn new(identity: Identity, provider: ProviderKind) -> Self {
        Self::with_params(identity, provider, &IntegrationParams::default())
    }

    pub fn with_params(identity: Identity, provider: ProviderKind, params: &IntegrationParams) -> Self {
        let (state, _) = watch::channel(ConnectionState::derive(params, provider));
        Self {
            identity,
            provider,
            attempts: Mutex::new(Attempts {
                current: 0,
                exchanging: false,
            }),
            state,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Credentials, only while connected.
    pub fn credentials(&self) -> Option<Credentials> {
        self.state.borrow().credentials().cloned()
    }

    pub fn params(&self) -> IntegrationParams {
        match self.credentials() {
            Some(credentials) => IntegrationParams {
                credentials: Some(credentials),
                provider: Some(self.provider),
            },
            None => IntegrationParams::default(),
        }
    }

    /// Start a new attempt. Whatever was in flight becomes stale.
    pub fn mark_connecting(&self) -> Attempt {
        let mut attempts = self.attempts.lock().unwrap();
        attempts.current += 1;
        attempts.exchanging = false;
        self.state.send_replace(ConnectionState::Connecting);
        info!(identity = %self.identity, provider = %self.provider, attempt = attempts.current, "connecting");
        Attempt(attempts.current)
    }

    /// Replace the state with one derived from carried params.
    /// `set_credentials(None, None)` is the disconnect.
    pub fn set_credentials(
        &self,
        credentials: Option<Credentials>,
        provider: Option<ProviderKind>,
    ) -> ConnectionState {
        let next = ConnectionState::derive(
            &IntegrationParams {
                credentials,
                provider,
            },
            self.provider,
        );

        let mut attempts = self.attempts.lock().unwrap();
        attempts.current += 1;
        attempts.exchanging = false;
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next.clone();
                true
            }
        });
        if changed {
            info!(identity = %self.identity, provider = %self.provider, state = next.label(), "credentials replaced");
        }
        next
    }

    pub fn is_current(&self, attempt: Attempt) -> bool {
        self.attempts.lock().unwrap().current == attempt.0
    }

    /// Reserve the single exchange for `attempt`. Only succeeds while the
    /// attempt is current, still connecting, and nothing is in flight.
    pub fn claim_exchange(&self, attempt: Attempt) -> bool {
        let mut attempts = self.attempts.lock().unwrap();
        let claimable = attempts.current == attempt.0
            && !attempts.exchanging
            && self.state.borrow().is_connecting();
        if claimable {
            attempts.exchanging = true;
        }
        claimable
    }

    /// Give up on `attempt` before any exchange started, back to
    /// Disconnected. No-op once the attempt is stale or exchanging.
    pub fn abandon(&self, attempt: Attempt) -> bool {
        let mut attempts = self.attempts.lock().unwrap();
        if attempts.current != attempt.0 || attempts.exchanging || !self.state.borrow().is_connecting() {
            return false;
        }
        attempts.current += 1;
        self.state.send_replace(ConnectionState::Disconnected);
        info!(identity = %self.identity, provider = %self.provider, "authorization abandoned");
        true
    }

    /// Finish `attempt` with a result. Returns false, changing nothing,
    /// when the attempt is stale or the state has moved on.
    pub fn resolve(&self, attempt: Attempt, result: Result<Credentials, ConnectError>) -> bool {
        let mut attempts = self.attempts.lock().unwrap();
        if attempts.current != attempt.0 || !self.state.borrow().is_connecting() {
            debug!(identity = %self.identity, provider = %self.provider, "dropping result of a stale attempt");
            return false;
        }
        debug_assert!(
            result.is_err() || attempts.exchanging,
            "credentials resolved without a claimed exchange"
        );
        attempts.exchanging = false;

        let next = match result {
            Ok(credentials) => {
                info!(identity = %self.identity, provider = %self.provider, "connected");
                ConnectionState::Connected(credentials)
            }
            Err(e) => {
                warn!(identity = %self.identity, provider = %self.provider, error = %e, "connection failed");
                ConnectionState::Error(e.to_string())
            }
        };
        self.state.send_replace(next);
        true
    }
}

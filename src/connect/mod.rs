//! The credential-acquisition flow.
//!
//! [`Connector::begin_authorization`] moves a connection to Connecting,
//! fetches the consent URL and opens it. A [`Detector`] then waits for the
//! window to close and triggers exactly one credentials exchange, whose
//! result lands in the pair's [`ConnectionHolder`].

pub mod detector;
pub mod state;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::backend::{Backend, Credentials, Item};
use crate::error::ConnectError;
use crate::identity::Identity;
use crate::provider::ProviderKind;
use crate::window::{Browser, WindowFeatures};

use detector::{Completion, Detector, PollPolicy};
use state::{Attempt, ConnectionHolder, ConnectionState};

/// A live authorization: the opened window and the task watching it.
///
/// Dropping or cancelling the session stops the polling and, unless an
/// exchange already started, returns a still-current attempt to
/// Disconnected. A started exchange still finishes and is applied if its
/// attempt is still current.
pub struct AuthorizationSession {
    attempt: Attempt,
    url: String,
    holder: Arc<ConnectionHolder>,
    detector: Detector,
}

impl AuthorizationSession {
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// The consent URL that was opened.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_finished(&self) -> bool {
        self.detector.is_finished()
    }

    /// Wait until the window closed and its exchange (if any) settled.
    /// Cancel-safe, so it can sit in a `select!` next to [`Self::cancel`].
    pub async fn wait(&mut self) {
        if self.detector.wait().await.is_err() {
            // the task died without resolving, so nothing else will
            if !self.holder.abandon(self.attempt) {
                self.holder
                    .resolve(self.attempt, Err(ConnectError::ExchangeIncomplete));
            }
        }
    }

    pub async fn finished(mut self) {
        self.wait().await;
    }

    /// Stop polling and wait for the attempt to settle.
    pub async fn cancel(mut self) {
        self.detector.cancel();
        self.wait().await;
    }
}

type HolderKey = (Identity, ProviderKind);

pub struct Connector {
    backend: Arc<dyn Backend>,
    browser: Arc<dyn Browser>,
    policy: PollPolicy,
    holders: Mutex<HashMap<HolderKey, Arc<ConnectionHolder>>>,
}

impl Connector {
    pub fn new(backend: Arc<dyn Backend>, browser: Arc<dyn Browser>) -> Self {
        Self {
            backend,
            browser,
            policy: PollPolicy::default(),
            holders: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// The holder for this pair, created Disconnected on first use.
    pub fn holder(&self, identity: &Identity, provider: ProviderKind) -> Arc<ConnectionHolder> {
        let mut holders = self.holders.lock().unwrap();
        let holder = holders
            .entry((identity.clone(), provider))
            .or_insert_with(|| Arc::new(ConnectionHolder::new(identity.clone(), provider)));
        Arc::clone(holder)
    }

    pub fn state(&self, identity: &Identity, provider: ProviderKind) -> ConnectionState {
        self.holder(identity, provider).state()
    }

    /// Start connecting `identity` to `provider`.
    ///
    /// The state is Connecting before the backend is asked for the URL.
    /// Failures are recorded as Error in the holder and returned as well;
    /// in that case no window is left open and nothing polls.
    pub async fn begin_authorization(
        &self,
        identity: &Identity,
        provider: ProviderKind,
    ) -> Result<AuthorizationSession, ConnectError> {
        let holder = self.holder(identity, provider);
        let attempt = holder.mark_connecting();

        let url = match self.backend.authorization_url(provider, identity).await {
            Ok(url) => url,
            Err(e) => {
                holder.resolve(attempt, Err(e.clone()));
                return Err(e);
            }
        };

        let window = match self
            .browser
            .open(&url, &WindowFeatures::for_provider(provider))
        {
            Ok(window) => window,
            Err(e) => {
                holder.resolve(attempt, Err(e.clone()));
                return Err(e);
            }
        };
        info!(%identity, %provider, "authorization window opened");

        let backend = Arc::clone(&self.backend);
        let watched = Arc::clone(&holder);
        let detector = Detector::spawn(window, self.policy, move |completion| async move {
            complete(backend.as_ref(), &watched, attempt, completion).await;
        });

        Ok(AuthorizationSession {
            attempt,
            url,
            holder,
            detector,
        })
    }

    /// Feed a completion signal for `attempt` by hand. Returns whether it
    /// led to an exchange call.
    pub async fn handle_completion(
        &self,
        identity: &Identity,
        provider: ProviderKind,
        attempt: Attempt,
        completion: Completion,
    ) -> bool {
        let holder = self.holder(identity, provider);
        complete(self.backend.as_ref(), &holder, attempt, completion).await
    }

    /// Ask the backend for the credentials it stored for `identity`.
    /// An empty answer is [`ConnectError::ExchangeIncomplete`].
    pub async fn exchange_credentials(
        &self,
        identity: &Identity,
        provider: ProviderKind,
    ) -> Result<Credentials, ConnectError> {
        exchange_credentials(self.backend.as_ref(), identity, provider).await
    }

    /// Forget the credentials and return to Disconnected. Safe to repeat.
    pub fn disconnect(&self, identity: &Identity, provider: ProviderKind) -> ConnectionState {
        self.holder(identity, provider).set_credentials(None, None)
    }

    /// Load the provider's items with the pair's current credentials.
    pub async fn load_items(
        &self,
        identity: &Identity,
        provider: ProviderKind,
    ) -> Result<Vec<Item>, ConnectError> {
        let credentials = self
            .holder(identity, provider)
            .credentials()
            .ok_or(ConnectError::NotConnected)?;
        let items = self.backend.load_items(provider, &credentials).await?;
        debug!(%identity, %provider, count = items.len(), "items loaded");
        Ok(items)
    }
}

async fn exchange_credentials(
    backend: &dyn Backend,
    identity: &Identity,
    provider: ProviderKind,
) -> Result<Credentials, ConnectError> {
    match backend.credentials(provider, identity).await? {
        Some(credentials) => Ok(credentials),
        None => {
            warn!(%identity, %provider, "window closed without credentials");
            Err(ConnectError::ExchangeIncomplete)
        }
    }
}

/// React to a completion signal. The exchange is gated on the holder's
/// state, so repeated or late signals never produce a second call.
async fn complete(
    backend: &dyn Backend,
    holder: &ConnectionHolder,
    attempt: Attempt,
    completion: Completion,
) -> bool {
    match completion {
        Completion::TimedOut(after) => {
            holder.resolve(attempt, Err(ConnectError::TimedOut(after)));
            false
        }
        Completion::Cancelled => {
            holder.abandon(attempt);
            false
        }
        Completion::Closed => {
            if !holder.claim_exchange(attempt) {
                debug!(identity = %holder.identity(), provider = %holder.provider(), "completion ignored");
                return false;
            }
            let result = exchange_credentials(backend, holder.identity(), holder.provider()).await;
            holder.resolve(attempt, result);
            true
        }
    }
}

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Backend, Credentials, Item};
use crate::error::ConnectError;
use crate::identity::Identity;
use crate::provider::ProviderKind;

/// A scripted backend for tests. Every call returns the configured
/// response and is counted.
pub struct MockBackend {
    authorize: Mutex<Result<String, ConnectError>>,
    credentials: Mutex<Result<Option<serde_json::Value>, ConnectError>>,
    items: Mutex<Result<Vec<Item>, ConnectError>>,
    exchange_delay: Option<Duration>,
    authorize_calls: AtomicUsize,
    credential_calls: AtomicUsize,
    load_calls: AtomicUsize,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Authorizes to `https://auth.test/authorize` and has no credentials.
    pub fn new() -> Self {
        Self {
            authorize: Mutex::new(Ok("https://auth.test/authorize".to_string())),
            credentials: Mutex::new(Ok(None)),
            items: Mutex::new(Ok(Vec::new())),
            exchange_delay: None,
            authorize_calls: AtomicUsize::new(0),
            credential_calls: AtomicUsize::new(0),
            load_calls: AtomicUsize::new(0),
        }
    }

    pub fn authorize_with(self, result: Result<String, ConnectError>) -> Self {
        *self.authorize.lock().unwrap() = result;
        self
    }

    pub fn credentials_with(self, result: Result<Option<serde_json::Value>, ConnectError>) -> Self {
        *self.credentials.lock().unwrap() = result;
        self
    }

    pub fn items_with(self, result: Result<Vec<Item>, ConnectError>) -> Self {
        *self.items.lock().unwrap() = result;
        self
    }

    /// Hold every credentials call open for `delay` before answering.
    pub fn exchange_delay(mut self, delay: Duration) -> Self {
        self.exchange_delay = Some(delay);
        self
    }

    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn credential_calls(&self) -> usize {
        self.credential_calls.load(Ordering::SeqCst)
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn authorization_url(
        &self,
        _provider: ProviderKind,
        _identity: &Identity,
    ) -> Result<String, ConnectError> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize.lock().unwrap().clone()
    }

    async fn credentials(
        &self,
        _provider: ProviderKind,
        _identity: &Identity,
    ) -> Result<Option<Credentials>, ConnectError> {
        self.credential_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.exchange_delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.credentials.lock().unwrap().clone();
        scripted.map(|value| value.and_then(Credentials::from_value))
    }

    async fn load_items(
        &self,
        _provider: ProviderKind,
        _credentials: &Credentials,
    ) -> Result<Vec<Item>, ConnectError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        self.items.lock().unwrap().clone()
    }
}

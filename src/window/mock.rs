use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{AuthWindow, Browser, WindowFeatures};
use crate::error::ConnectError;

/// A scripted browser for tests.
pub struct MockBrowser {
    blocked: bool,
    close_after_polls: Option<usize>,
    windows: Mutex<Vec<(String, MockWindowHandle)>>,
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrowser {
    /// Windows stay open until a test closes them through their handle.
    pub fn new() -> Self {
        Self {
            blocked: false,
            close_after_polls: None,
            windows: Mutex::new(Vec::new()),
        }
    }

    /// Windows report closed on the `polls`-th check.
    pub fn closing_after(polls: usize) -> Self {
        Self {
            close_after_polls: Some(polls),
            ..Self::new()
        }
    }

    /// Refuses to open anything.
    pub fn blocked() -> Self {
        Self {
            blocked: true,
            ..Self::new()
        }
    }

    pub fn opened_urls(&self) -> Vec<String> {
        let windows = self.windows.lock().unwrap();
        windows.iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn last_window(&self) -> Option<MockWindowHandle> {
        let windows = self.windows.lock().unwrap();
        windows.last().map(|(_, handle)| handle.clone())
    }
}

impl Browser for MockBrowser {
    fn open(
        &self,
        url: &str,
        _features: &WindowFeatures,
    ) -> Result<Box<dyn AuthWindow>, ConnectError> {
        if self.blocked {
            return Err(ConnectError::PopupBlocked);
        }
        let handle = MockWindowHandle::default();
        self.windows
            .lock()
            .unwrap()
            .push((url.to_string(), handle.clone()));
        Ok(Box::new(MockWindow {
            handle,
            close_after_polls: self.close_after_polls,
        }))
    }
}

/// Test-side view of a [`MockBrowser`] window.
#[derive(Clone, Default)]
pub struct MockWindowHandle {
    closed_by_user: Arc<AtomicBool>,
    closed_by_app: Arc<AtomicBool>,
    polls: Arc<AtomicUsize>,
}

impl MockWindowHandle {
    /// Simulate the user closing the window.
    pub fn close(&self) {
        self.closed_by_user.store(true, Ordering::SeqCst);
    }

    /// How many times the window was checked.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Whether the application closed the window itself.
    pub fn closed_by_app(&self) -> bool {
        self.closed_by_app.load(Ordering::SeqCst)
    }
}

struct MockWindow {
    handle: MockWindowHandle,
    close_after_polls: Option<usize>,
}

impl AuthWindow for MockWindow {
    fn is_closed(&mut self) -> bool {
        let polls = self.handle.polls.fetch_add(1, Ordering::SeqCst) + 1;
        self.handle.closed_by_user.load(Ordering::SeqCst)
            || self.handle.closed_by_app.load(Ordering::SeqCst)
            || self.close_after_polls.is_some_and(|n| polls >= n)
    }

    fn close(&mut self) {
        self.handle.closed_by_app.store(true, Ordering::SeqCst);
    }
}

//! Watches an authorization window until it closes.
//!
//! The consent page cannot message us, so the window's closed state is
//! polled on a fixed interval. The detector reports exactly one
//! [`Completion`] and never outlives its [`Detector`] handle.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error};

use crate::consts::{DEFAULT_AUTHORIZATION_TIMEOUT, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
use crate::window::AuthWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The window went away: finished, cancelled, or closed by hand.
    Closed,
    /// The window stayed open past the timeout and was closed by us.
    TimedOut(Duration),
    /// Polling was stopped before the window closed.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_AUTHORIZATION_TIMEOUT),
        }
    }
}

/// Poll `window` until it closes, the timeout passes, or `cancel` fires.
/// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
pub async fn wait_for_close(
    window: &mut dyn AuthWindow,
    policy: PollPolicy,
    mut cancel: watch::Receiver<bool>,
) -> Completion {
    let interval = policy.interval.max(MIN_POLL_INTERVAL);
    let start = Instant::now();
    let mut ticker = tokio::time::interval_at(start + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            // a dropped sender counts as cancellation too
            _ = cancel.changed() => return Completion::Cancelled,
        }

        if window.is_closed() {
            return Completion::Closed;
        }

        if let Some(timeout) = policy.timeout
            && start.elapsed() >= timeout
        {
            window.close();
            return Completion::TimedOut(timeout);
        }
    }
}

/// A running detector task. Dropping it stops the polling.
pub struct Detector {
    handle: Option<JoinHandle<()>>,
    cancel: watch::Sender<bool>,
}

impl Detector {
    /// Poll `window` in the background and hand the completion to
    /// `on_complete`, which runs exactly once, on cancellation too.
    pub fn spawn<F, Fut>(mut window: Box<dyn AuthWindow>, policy: PollPolicy, on_complete: F) -> Self
    where
        F: FnOnce(Completion) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let completion = wait_for_close(window.as_mut(), policy, cancel_rx).await;
            debug!(?completion, "authorization window finished");
            drop(window);
            on_complete(completion).await;
        });
        Self {
            handle: Some(handle),
            cancel,
        }
    }

    /// Stop polling. A completion that already fired still runs to the end.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Wait for the task, including any completion work. Safe to call
    /// again after it returned, or from a `select!` that may drop it.
    pub async fn wait(&mut self) -> Result<(), JoinError> {
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        let result = handle.await;
        self.handle = None;
        if let Err(e) = &result {
            error!(error = %e, "authorization detector failed");
        }
        result
    }
}

impl Drop for Detector {
    fn drop(&mut self) {
        self.cancel();
    }
}

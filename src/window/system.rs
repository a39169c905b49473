use tokio::sync::watch;
use tracing::warn;

use super::{AuthWindow, Browser, WindowFeatures};
use crate::error::ConnectError;

/// Opens consent pages in the user's default browser.
///
/// A tab in the default browser cannot be watched from here, so its window
/// counts as closed once the host calls [`SystemBrowser::confirm_closed`]
/// (the REPL does this when the user presses Enter).
pub struct SystemBrowser {
    confirmations: watch::Sender<u64>,
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBrowser {
    pub fn new() -> Self {
        let (confirmations, _) = watch::channel(0);
        Self { confirmations }
    }

    /// Treat every window opened so far as closed by the user.
    pub fn confirm_closed(&self) {
        self.confirmations.send_modify(|n| *n += 1);
    }

    #[cfg(test)]
    pub(crate) fn confirmations(&self) -> u64 {
        *self.confirmations.borrow()
    }

    fn window(&self) -> SystemWindow {
        let confirmations = self.confirmations.subscribe();
        let opened_at = *confirmations.borrow();
        SystemWindow {
            opened_at,
            confirmations,
            closed: false,
        }
    }
}

impl Browser for SystemBrowser {
    fn open(
        &self,
        url: &str,
        _features: &WindowFeatures,
    ) -> Result<Box<dyn AuthWindow>, ConnectError> {
        if let Err(e) = open::that(url) {
            warn!(error = %e, "could not launch the default browser");
            return Err(ConnectError::PopupBlocked);
        }
        Ok(Box::new(self.window()))
    }
}

struct SystemWindow {
    opened_at: u64,
    confirmations: watch::Receiver<u64>,
    closed: bool,
}

impl AuthWindow for SystemWindow {
    fn is_closed(&mut self) -> bool {
        self.closed || *self.confirmations.borrow() > self.opened_at
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_open_until_confirmed() {
        let browser = SystemBrowser::new();
        let mut window = browser.window();
        assert!(!window.is_closed());
        browser.confirm_closed();
        assert!(window.is_closed());
    }

    #[test]
    fn earlier_confirmation_does_not_close_later_window() {
        let browser = SystemBrowser::new();
        browser.confirm_closed();
        let mut window = browser.window();
        assert!(!window.is_closed());
    }

    #[test]
    fn close_from_our_side() {
        let browser = SystemBrowser::new();
        let mut window = browser.window();
        window.close();
        assert!(window.is_closed());
    }
}

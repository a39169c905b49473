//! Detached browser contexts that host the third-party consent screen.
//!
//! The consent page never talks back to us. All we can observe is whether
//! its window is still open, so that is the whole [`AuthWindow`] contract.

pub mod command;
pub mod mock;
pub mod system;

use crate::consts::{WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::error::ConnectError;
use crate::provider::ProviderKind;

pub use command::CommandBrowser;
pub use system::SystemBrowser;

/// How the authorization window should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFeatures {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl WindowFeatures {
    pub fn for_provider(provider: ProviderKind) -> Self {
        Self {
            title: format!("{} Authorization", provider.display_name()),
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
        }
    }
}

/// Handle to an opened authorization window.
pub trait AuthWindow: Send {
    /// Whether the window is gone, for whatever reason.
    fn is_closed(&mut self) -> bool;

    /// Close the window from our side.
    fn close(&mut self);
}

/// Something that can open authorization windows.
pub trait Browser: Send + Sync {
    /// Open `url` in a new window. Fails with [`ConnectError::PopupBlocked`]
    /// when no window could be opened.
    fn open(&self, url: &str, features: &WindowFeatures)
    -> Result<Box<dyn AuthWindow>, ConnectError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_for_hubspot() {
        let f = WindowFeatures::for_provider(ProviderKind::Hubspot);
        assert_eq!(f.title, "HubSpot Authorization");
        assert_eq!((f.width, f.height), (800, 700));
    }
}

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::{AuthWindow, Browser, WindowFeatures};
use crate::error::ConnectError;

/// Runs a dedicated browser process per authorization, e.g.
/// `chromium --app={url} --window-size={width},{height}`.
///
/// The window is closed when the process exits, and the process is
/// killed when its window handle is dropped. `{url}`, `{width}`,
/// `{height}` and `{title}` are substituted; without a `{url}` placeholder
/// the URL is appended as the last argument.
pub struct CommandBrowser {
    template: String,
}

impl CommandBrowser {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn argv(&self, url: &str, features: &WindowFeatures) -> Vec<String> {
        let width = features.width.to_string();
        let height = features.height.to_string();
        let mut has_url = false;
        let mut argv: Vec<String> = self
            .template
            .split_whitespace()
            .map(|part| {
                has_url |= part.contains("{url}");
                part.replace("{url}", url)
                    .replace("{width}", &width)
                    .replace("{height}", &height)
                    .replace("{title}", &features.title)
            })
            .collect();
        if !has_url {
            argv.push(url.to_string());
        }
        argv
    }

    /// Must be called inside a Tokio runtime.
    fn spawn(&self, url: &str, features: &WindowFeatures) -> Result<ProcessWindow, ConnectError> {
        let argv = self.argv(url, features);
        let Some((program, args)) = argv.split_first() else {
            warn!("browser command is empty");
            return Err(ConnectError::PopupBlocked);
        };

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                warn!(%program, error = %e, "could not start browser");
                ConnectError::PopupBlocked
            })?;

        debug!(%program, pid = ?child.id(), "browser window started");
        Ok(ProcessWindow { child })
    }
}

impl Browser for CommandBrowser {
    fn open(
        &self,
        url: &str,
        features: &WindowFeatures,
    ) -> Result<Box<dyn AuthWindow>, ConnectError> {
        Ok(Box::new(self.spawn(url, features)?))
    }
}

struct ProcessWindow {
    child: Child,
}

impl AuthWindow for ProcessWindow {
    fn is_closed(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "lost track of browser process");
                true
            }
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!(error = %e, "browser process already gone");
        }
    }
}

//! A minimal terminal spinner for visual feedback during async operations.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::connect::state::ConnectionState;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const INTERVAL: Duration = Duration::from_millis(80);

/// A terminal spinner that runs in a background task.
///
/// The spinner writes to stderr so it doesn't interfere with stdout output.
pub struct Spinner {
    handle: JoinHandle<()>,
    cancel: watch::Sender<bool>,
}

impl Spinner {
    /// Spin until [`Spinner::stop`] is called.
    pub fn start(message: &str) -> Self {
        Self::until(message, std::future::pending())
    }

    /// Spin while the connection is Connecting. Any other state, or a
    /// dropped holder, clears the line on its own.
    pub fn follow(message: &str, mut state: watch::Receiver<ConnectionState>) -> Self {
        Self::until(message, async move {
            let _ = state.wait_for(|s| !s.is_connecting()).await;
        })
    }

    fn until<F>(message: &str, done: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let message = message.to_string();

        let handle = tokio::spawn(async move {
            tokio::pin!(done);
            let mut i = 0;
            loop {
                let frame = FRAMES[i % FRAMES.len()];
                // \r moves to start of line, \x1b[2K clears the line
                eprint!("\x1b[2K\r{frame} {message}");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    _ = cancel_rx.changed() => break,
                    _ = &mut done => break,
                }
                i += 1;
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle,
            cancel: cancel_tx,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.handle.await;
    }
}

use async_trait::async_trait;

use super::{Command, CommandResult, Input, SessionInfo, StateChange};
use crate::connect::state::ConnectionState;
use crate::provider::ProviderKind;
use crate::spinner::Spinner;
use crate::window::SystemBrowser;

pub struct ConnectCommand;

#[async_trait]
impl Command for ConnectCommand {
    fn name(&self) -> &str {
        "/connect"
    }

    fn usage(&self) -> &str {
        "[provider]"
    }

    fn description(&self) -> &str {
        "authorize the provider in a browser window"
    }

    async fn execute(&self, args: &[&str], info: &SessionInfo<'_>) -> CommandResult {
        let provider = match args.first() {
            Some(name) => match name.parse::<ProviderKind>() {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("  ✗ {e}");
                    return CommandResult::Handled;
                }
            },
            None => info.provider,
        };

        let holder = info.connector.holder(info.identity, provider);
        if holder.state().is_connected() {
            println!("  {provider} is already connected, /disconnect first");
            return switched(info, provider);
        }

        let mut session = match info
            .connector
            .begin_authorization(info.identity, provider)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                eprintln!("  ✗ {e}");
                if e.is_retryable() {
                    println!("  run /connect to try again");
                }
                return switched(info, provider);
            }
        };

        println!("  opened {provider} authorization:");
        println!("  {}", session.url());
        let message = match (info.confirm, info.input) {
            (Some(_), Some(_)) => format!("waiting for {provider}, press Enter once you are done"),
            _ => format!("waiting for {provider}, close the window when done"),
        };
        let spinner = Spinner::follow(&message, holder.subscribe());

        let interrupted = tokio::select! {
            _ = session.wait() => false,
            _ = confirm_on_enter(info.confirm, info.input) => false,
            _ = tokio::signal::ctrl_c() => true,
        };
        if interrupted {
            session.cancel().await;
        }
        spinner.stop().await;

        match holder.state() {
            ConnectionState::Connected(_) => println!("  ✓ {provider} connected"),
            ConnectionState::Error(reason) => eprintln!("  ✗ {reason}"),
            ConnectionState::Disconnected => println!("  cancelled"),
            ConnectionState::Connecting => {}
        }
        switched(info, provider)
    }
}

/// Report the window closed when the user presses Enter, then wait for
/// the detector to pick it up. Reads from the REPL's own reader, and
/// dropping it mid-read leaves the line for the prompt.
async fn confirm_on_enter(browser: Option<&SystemBrowser>, input: Option<&Input>) {
    if let (Some(browser), Some(input)) = (browser, input)
        && let Ok(Some(_)) = input.lock().await.next_line().await
    {
        browser.confirm_closed();
    }
    std::future::pending::<()>().await
}

fn switched(info: &SessionInfo<'_>, provider: ProviderKind) -> CommandResult {
    if provider == info.provider {
        CommandResult::Handled
    } else {
        CommandResult::StateChanged(StateChange::Provider(provider))
    }
}

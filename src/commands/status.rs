use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::connect::state::ConnectionState;

pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &str {
        "/status"
    }

    fn aliases(&self) -> &[&str] {
        &["/whoami"]
    }

    fn description(&self) -> &str {
        "show identity, provider, and connection state"
    }

    async fn execute(&self, _args: &[&str], info: &SessionInfo<'_>) -> CommandResult {
        println!("  backend   {}", info.backend_url);
        println!("  identity  {}", info.identity);
        println!("  provider  {}", info.provider);
        println!("  state     {}", describe(&info.connector.state(info.identity, info.provider)));
        println!("  items     {}", info.items.len());
        CommandResult::Handled
    }
}

fn describe(state: &ConnectionState) -> String {
    match state {
        ConnectionState::Connected(credentials) => match credentials.as_value().as_object() {
            Some(fields) => format!("connected ({} credential field(s))", fields.len()),
            None => "connected".to_string(),
        },
        ConnectionState::Error(reason) => format!("error: {reason}"),
        other => other.label().to_string(),
    }
}

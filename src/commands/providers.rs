use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::provider::ProviderKind;

pub struct ProvidersCommand;

#[async_trait]
impl Command for ProvidersCommand {
    fn name(&self) -> &str {
        "/providers"
    }

    fn description(&self) -> &str {
        "list providers and their connection state"
    }

    async fn execute(&self, _args: &[&str], info: &SessionInfo<'_>) -> CommandResult {
        for kind in ProviderKind::ALL {
            let marker = if kind == info.provider { "*" } else { " " };
            let state = info.connector.state(info.identity, kind);
            println!(
                "  {marker} {:<10} {:<9} {}",
                kind.slug(),
                kind.display_name(),
                state.label()
            );
        }
        CommandResult::Handled
    }
}

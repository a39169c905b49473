use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::provider::ProviderKind;

pub struct ProviderCommand;

#[async_trait]
impl Command for ProviderCommand {
    fn name(&self) -> &str {
        "/provider"
    }

    fn usage(&self) -> &str {
        "<name>"
    }

    fn description(&self) -> &str {
        "select the provider to work with"
    }

    async fn execute(&self, args: &[&str], info: &SessionInfo<'_>) -> CommandResult {
        let Some(name) = args.first() else {
            println!("  provider  {}", info.provider);
            return CommandResult::Handled;
        };
        match name.parse::<ProviderKind>() {
            Ok(p) if p == info.provider => {
                println!("  {p} is already selected");
                CommandResult::Handled
            }
            Ok(p) => {
                println!("  ✓ provider set to {p}");
                CommandResult::StateChanged(StateChange::Provider(p))
            }
            Err(e) => {
                eprintln!("  ✗ {e}");
                CommandResult::Handled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::fixture;

    #[tokio::test]
    async fn switches_provider() {
        let fx = fixture();
        assert!(matches!(
            ProviderCommand.execute(&["Airtable"], &fx.info()).await,
            CommandResult::StateChanged(StateChange::Provider(ProviderKind::Airtable))
        ));
    }

    #[tokio::test]
    async fn same_or_unknown_is_handled() {
        let fx = fixture();
        for args in [&["hubspot"][..], &["salesforce"][..], &[][..]] {
            assert!(matches!(
                ProviderCommand.execute(args, &fx.info()).await,
                CommandResult::Handled
            ));
        }
    }
}

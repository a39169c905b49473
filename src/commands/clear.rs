use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};

pub struct ClearCommand;

#[async_trait]
impl Command for ClearCommand {
    fn name(&self) -> &str {
        "/clear"
    }

    fn description(&self) -> &str {
        "forget the loaded items"
    }

    async fn execute(&self, _args: &[&str], info: &SessionInfo<'_>) -> CommandResult {
        if info.items.is_empty() {
            println!("  nothing to clear");
            return CommandResult::Handled;
        }
        println!("  ✓ cleared {} item(s)", info.items.len());
        CommandResult::StateChanged(StateChange::ItemsCleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Item;
    use crate::commands::tests::fixture;

    #[tokio::test]
    async fn clears_loaded_items() {
        let fx = fixture();
        let items = vec![Item::default()];
        assert!(matches!(
            ClearCommand.execute(&[], &fx.info_with(&items)).await,
            CommandResult::StateChanged(StateChange::ItemsCleared)
        ));
    }

    #[tokio::test]
    async fn nothing_loaded_is_handled() {
        let fx = fixture();
        assert!(matches!(
            ClearCommand.execute(&[], &fx.info()).await,
            CommandResult::Handled
        ));
    }
}

use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

/// Listed in `/help` itself; the registry prints the table.
pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "/help"
    }

    fn aliases(&self) -> &[&str] {
        &["/h", "/?"]
    }

    fn description(&self) -> &str {
        "show available commands"
    }

    async fn execute(&self, _args: &[&str], _info: &SessionInfo<'_>) -> CommandResult {
        CommandResult::Handled
    }
}

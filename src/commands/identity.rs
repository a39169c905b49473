use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::identity::Identity;

pub struct IdentityCommand;

#[async_trait]
impl Command for IdentityCommand {
    fn name(&self) -> &str {
        "/identity"
    }

    fn aliases(&self) -> &[&str] {
        &["/id"]
    }

    fn usage(&self) -> &str {
        "[user org]"
    }

    fn description(&self) -> &str {
        "show or change the user and organization"
    }

    async fn execute(&self, args: &[&str], info: &SessionInfo<'_>) -> CommandResult {
        match args {
            [] => {
                println!("  user  {}", info.identity.user_id());
                println!("  org   {}", info.identity.org_id());
                CommandResult::Handled
            }
            [user, org] => match Identity::new(*user, *org) {
                Ok(identity) if &identity == info.identity => CommandResult::Handled,
                Ok(identity) => {
                    println!("  ✓ identity set to {identity}");
                    CommandResult::StateChanged(StateChange::Identity(identity))
                }
                Err(e) => {
                    eprintln!("  ✗ {e}");
                    CommandResult::Handled
                }
            },
            _ => {
                eprintln!("  ✗ usage: /identity <user> <org>");
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
    async fn changes_identity() {
        let fx = fixture();
        match IdentityCommand.execute(&["u2", "o2"], &fx.info()).await {
            CommandResult::StateChanged(StateChange::Identity(identity)) => {
                assert_eq!(identity, Identity::new("u2", "o2").unwrap());
            }
            _ => panic!("expected identity change"),
        }
    }

    #[tokio::test]
    async fn bad_arity_is_handled() {
        let fx = fixture();
        assert!(matches!(
            IdentityCommand.execute(&["only-user"], &fx.info()).await,
            CommandResult::Handled
        ));
    }

    #[tokio::test]
    async fn same_identity_is_unchanged() {
        let fx = fixture();
        assert!(matches!(
            IdentityCommand.execute(&["TestUser", "TestOrg"], &fx.info()).await,
            CommandResult::Handled
        ));
    }
}

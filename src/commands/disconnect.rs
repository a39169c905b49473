use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};

pub struct DisconnectCommand;

#[async_trait]
impl Command for DisconnectCommand {
    fn name(&self) -> &str {
        "/disconnect"
    }

    fn description(&self) -> &str {
        "forget the credentials for the current provider"
    }

    async fn execute(&self, _args: &[&str], info: &SessionInfo<'_>) -> CommandResult {
        let before = info.connector.state(info.identity, info.provider);
        info.connector.disconnect(info.identity, info.provider);
        if before.is_connected() {
            println!("  ✓ {} disconnected", info.provider);
        } else {
            println!("  {} was not connected", info.provider);
        }
        if info.items.is_empty() {
            CommandResult::Handled
        } else {
            CommandResult::StateChanged(StateChange::ItemsCleared)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Credentials, Item};
    use crate::commands::tests::fixture;
    use crate::connect::state::ConnectionState;
    use crate::provider::ProviderKind;
    use serde_json::json;

    #[tokio::test]
    async fn clears_credentials_and_items() {
        let fx = fixture();
        let credentials = Credentials::from_value(json!({ "access_token": "abc" }));
        fx.connector
            .holder(&fx.identity, ProviderKind::Hubspot)
            .set_credentials(credentials, Some(ProviderKind::Hubspot));
        let items = vec![Item::default()];

        assert!(matches!(
            DisconnectCommand.execute(&[], &fx.info_with(&items)).await,
            CommandResult::StateChanged(StateChange::ItemsCleared)
        ));
        assert_eq!(
            fx.connector.state(&fx.identity, ProviderKind::Hubspot),
            ConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn twice_is_harmless() {
        let fx = fixture();
        DisconnectCommand.execute(&[], &fx.info()).await;
        assert!(matches!(
            DisconnectCommand.execute(&[], &fx.info()).await,
            CommandResult::Handled
        ));
        assert_eq!(
            fx.connector.state(&fx.identity, ProviderKind::Hubspot),
            ConnectionState::Disconnected
        );
    }
}

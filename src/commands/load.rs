use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::backend::Item;
use crate::consts::format_number;
use crate::spinner::Spinner;

pub struct LoadCommand;

#[async_trait]
impl Command for LoadCommand {
    fn name(&self) -> &str {
        "/load"
    }

    fn description(&self) -> &str {
        "load items from the connected provider"
    }

    async fn execute(&self, _args: &[&str], info: &SessionInfo<'_>) -> CommandResult {
        let spinner = Spinner::start(&format!("loading {} items", info.provider));
        let result = info.connector.load_items(info.identity, info.provider).await;
        spinner.stop().await;

        match result {
            Ok(items) => {
                print!("{}", format_items(&items));
                CommandResult::StateChanged(StateChange::Items(items))
            }
            Err(e) => {
                eprintln!("  ✗ {e}");
                CommandResult::Handled
            }
        }
    }
}

/// Render a listing. Missing names and types get placeholders so every
/// entry stays addressable.
pub fn format_items(items: &[Item]) -> String {
    if items.is_empty() {
        return "  No data available\n".to_string();
    }

    let mut out = format!("  Loaded Items: {}\n", format_number(items.len() as u64));
    for (i, item) in items.iter().enumerate() {
        let n = i + 1;
        let name = match item.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Item {n}"),
        };
        let kind = item.kind.as_deref().unwrap_or("Unknown");
        out.push_str(&format!("  {n:>3}. {name} ({kind})"));
        if let Some(parent) = &item.parent_id {
            out.push_str(&format!(" in {parent}"));
        }
        if let Some(id) = &item.id {
            out.push_str(&format!(" [{id}]"));
        }
        out.push('\n');
    }
    out
}

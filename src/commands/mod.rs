//! Built-in REPL commands prefixed with `/`.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. The registry handles dispatch, alias resolution,
//! and dynamic help generation.

mod clear;
mod connect;
mod disconnect;
mod help;
mod identity;
mod load;
mod provider;
mod providers;
mod quit;
mod status;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::Mutex;

use crate::backend::Item;
use crate::connect::Connector;
use crate::identity::Identity;
use crate::provider::ProviderKind;
use crate::window::SystemBrowser;

pub use load::format_items;

/// The REPL's line reader. Commands that need a keypress read from it
/// instead of opening stdin again, so no line is lost between them.
pub type Input = Mutex<Lines<Box<dyn AsyncBufRead + Send + Unpin>>>;

pub fn input<R>(reader: R) -> Input
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
    Mutex::new(reader.lines())
}

/// Session info available to commands during execution.
pub struct SessionInfo<'a> {
    pub identity: &'a Identity,
    pub provider: ProviderKind,
    pub connector: &'a Connector,
    /// Set when authorization windows are opened in the system browser,
    /// which cannot report closure on its own.
    pub confirm: Option<&'a SystemBrowser>,
    pub input: Option<&'a Input>,
    pub backend_url: &'a str,
    pub items: &'a [Item],
}

/// A state change the REPL needs to apply after a command runs.
#[derive(Debug, Clone)]
pub enum StateChange {
    Identity(Identity),
    Provider(ProviderKind),
    /// Freshly loaded items replace the previous listing.
    Items(Vec<Item>),
    ItemsCleared,
}

/// What the REPL should do after a command runs.
pub enum CommandResult {
    /// Not a command.
    NotACommand,
    /// Command handled, continue the REPL loop.
    Handled,
    /// Command produced a state change the REPL must apply.
    StateChanged(StateChange),
    /// Exit the REPL.
    Quit,
}

/// A REPL command. Implement this trait to add new commands.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"/status"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["/h", "/?"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument synopsis shown in `/help`, e.g. `"[provider]"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `/help`.
    fn description(&self) -> &str;

    /// Run the command with the words that followed its name.
    async fn execute(&self, args: &[&str], info: &SessionInfo<'_>) -> CommandResult;
}

/// Holds registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(help::HelpCommand),
            Arc::new(connect::ConnectCommand),
            Arc::new(disconnect::DisconnectCommand),
            Arc::new(status::StatusCommand),
            Arc::new(load::LoadCommand),
            Arc::new(clear::ClearCommand),
            Arc::new(identity::IdentityCommand),
            Arc::new(provider::ProviderCommand),
            Arc::new(providers::ProvidersCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Dispatch input to a matching command, or return `NotACommand`.
    pub async fn dispatch(&self, input: &str, info: &SessionInfo<'_>) -> CommandResult {
        let mut words = input.split_whitespace();
        let Some(cmd) = words.next() else {
            return CommandResult::NotACommand;
        };
        let args: Vec<&str> = words.collect();

        for command in &self.commands {
            if cmd == command.name() || command.aliases().contains(&cmd) {
                // /help is special, it needs the registry to list all commands
                if command.name() == "/help" {
                    print!("{}", self.help_text());
                    return CommandResult::Handled;
                }
                return command.execute(&args, info).await;
            }
        }

        if cmd.starts_with('/') {
            println!("unknown command: {cmd}");
            println!("type /help for available commands");
            return CommandResult::Handled;
        }

        CommandResult::NotACommand
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.usage(), c.aliases()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases (for duplicate detection).
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let mut label = name.to_string();
    if !usage.is_empty() {
        label.push(' ');
        label.push_str(usage);
    }
    if !aliases.is_empty() {
        label.push_str(&format!(" ({})", aliases.join(", ")));
    }
    label
}

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use tether::backend::http::HttpBackend;
use tether::backend::{Backend, Item};
use tether::banner::{BannerInfo, print_banner, print_session_summary};
use tether::commands::{CommandRegistry, CommandResult, SessionInfo, StateChange, input};
use tether::config::{Config, KEYS, Settings, timeout_from_secs};
use tether::connect::Connector;
use tether::consts::default_db_path;
use tether::identity::Identity;
use tether::provider::ProviderKind;
use tether::window::{Browser, CommandBrowser, SystemBrowser};

#[derive(Parser)]
#[command(
    name = "tether",
    version,
    about = "Connect third-party accounts through an integration backend."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Base URL of the integration backend
    #[arg(long)]
    backend_url: Option<String>,

    /// User id to connect as
    #[arg(short, long)]
    user: Option<String>,

    /// Organization id to connect as
    #[arg(short, long)]
    org: Option<String>,

    /// Provider selected at startup (notion, airtable, hubspot)
    #[arg(short, long)]
    provider: Option<ProviderKind>,

    /// How often the authorization window is checked, in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval_ms: Option<u64>,

    /// Give up on an open authorization window after this many seconds (0 = never)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Browser command for a dedicated window, e.g. "chromium --app={url}"
    #[arg(short, long)]
    browser: Option<String>,

    /// SQLite database for stored settings (default: ~/.tether/tether.db)
    #[arg(short, long)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List the supported providers and their endpoints
    Providers,
    /// Read or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print one stored setting
    Get { key: String },
    /// Store a setting
    Set { key: String, value: String },
    /// Remove a stored setting
    Unset { key: String },
    /// Print all stored settings
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tether=warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Some(Command::Providers) = &cli.command {
        print_providers();
        return Ok(());
    }

    let db = match &cli.db {
        Some(db) => db.clone(),
        None => {
            let path = default_db_path()?;
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            path.to_string_lossy().into_owned()
        }
    };
    let config = Config::open(&db)?;

    if let Some(Command::Config { action }) = &cli.command {
        return handle_config(&config, action);
    }

    let settings = apply_flags(Settings::load(&config)?, &cli);
    let identity = Identity::new(&settings.user_id, &settings.org_id)?;

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&settings.backend_url)?);
    let system_browser = Arc::new(SystemBrowser::new());
    let (browser, browser_label): (Arc<dyn Browser>, String) = match &settings.browser {
        Some(template) => (
            Arc::new(CommandBrowser::new(template.clone())) as Arc<dyn Browser>,
            format!("command ({template})"),
        ),
        None => (
            system_browser.clone() as Arc<dyn Browser>,
            "system (press Enter when done)".to_string(),
        ),
    };
    let confirm = settings.browser.is_none().then_some(system_browser.as_ref());

    let connector = Connector::new(backend, browser).with_policy(settings.poll_policy());

    let timeout_label = match settings.timeout {
        Some(timeout) => format!("{}s", timeout.as_secs()),
        None => "none".to_string(),
    };
    let db_label = if db == ":memory:" { "ephemeral" } else { &db };
    print_banner(&BannerInfo {
        backend_url: &settings.backend_url,
        identity: &identity.to_string(),
        provider: settings.provider.display_name(),
        browser: &browser_label,
        timeout: &timeout_label,
        db: db_label,
    });

    let registry = CommandRegistry::new();
    let mut identity = identity;
    let mut provider = settings.provider;
    let mut items: Vec<Item> = Vec::new();
    let mut items_loaded: u64 = 0;

    // REPL, async stdin so Ctrl+C is caught at the prompt too. Commands
    // share this reader rather than opening stdin themselves.
    let lines = input(BufReader::new(tokio::io::stdin()));

    loop {
        print!("\ntether {}> ", provider.slug());
        io::stdout().flush()?;

        let line = tokio::select! {
            result = async { lines.lock().await.next_line().await } => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let info = SessionInfo {
            identity: &identity,
            provider,
            connector: &connector,
            confirm,
            input: Some(&lines),
            backend_url: &settings.backend_url,
            items: &items,
        };
        match registry.dispatch(input, &info).await {
            CommandResult::NotACommand => {
                println!("commands start with /, type /help for the list");
            }
            CommandResult::Handled => {}
            CommandResult::StateChanged(change) => match change {
                StateChange::Identity(next) => {
                    identity = next;
                    items.clear();
                }
                StateChange::Provider(next) => {
                    provider = next;
                    items.clear();
                }
                StateChange::Items(loaded) => {
                    items_loaded += loaded.len() as u64;
                    items = loaded;
                }
                StateChange::ItemsCleared => items.clear(),
            },
            CommandResult::Quit => break,
        }
    }

    let connected = ProviderKind::ALL
        .into_iter()
        .filter(|p| connector.state(&identity, *p).is_connected())
        .count();
    print_session_summary(connected, items_loaded);
    Ok(())
}

/// Command-line flags override stored settings.
fn apply_flags(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(url) = &cli.backend_url {
        settings.backend_url = url.clone();
    }
    if let Some(user) = &cli.user {
        settings.user_id = user.clone();
    }
    if let Some(org) = &cli.org {
        settings.org_id = org.clone();
    }
    if let Some(provider) = cli.provider {
        settings.provider = provider;
    }
    if let Some(ms) = cli.poll_interval_ms {
        settings.poll_interval = Duration::from_millis(ms);
    }
    if let Some(secs) = cli.timeout_secs {
        settings.timeout = timeout_from_secs(secs);
    }
    if let Some(browser) = &cli.browser {
        settings.browser = Some(browser.clone());
    }
    settings
}

fn print_providers() {
    for kind in ProviderKind::ALL {
        let endpoints = kind.endpoints();
        println!("{:<10} {}", kind.slug(), kind.display_name());
        println!("  authorize    {}", endpoints.authorize);
        println!("  credentials  {}", endpoints.credentials);
        println!("  load         {}", endpoints.load);
    }
}

fn handle_config(config: &Config, action: &ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match config.get(key)? {
            Some(value) => println!("{value}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config.set(key, value)?;
            println!("✓ {key} = {value}");
        }
        ConfigAction::Unset { key } => {
            config.remove(key)?;
            println!("✓ {key} unset");
        }
        ConfigAction::List => {
            let stored = config.entries()?;
            for (key, description) in KEYS {
                let value = stored
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("-");
                println!("{key:<18} {value:<30} {description}");
            }
        }
    }
    Ok(())
}

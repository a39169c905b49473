//! Key-value configuration storage backed by SQLite, and the typed
//! [`Settings`] built from it.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use std::sync::Mutex;

use crate::connect::detector::PollPolicy;
use crate::consts::{
    DEFAULT_AUTHORIZATION_TIMEOUT, DEFAULT_BACKEND_URL, DEFAULT_ORG_ID, DEFAULT_POLL_INTERVAL,
    DEFAULT_USER_ID,
};
use crate::provider::ProviderKind;

/// Keys `tether config` accepts.
pub const KEYS: &[(&str, &str)] = &[
    ("backend_url", "base URL of the integration backend"),
    ("user_id", "user id sent with every connection"),
    ("org_id", "organization id sent with every connection"),
    ("provider", "provider selected at startup"),
    ("poll_interval_ms", "how often the authorization window is checked"),
    ("timeout_secs", "give up on an open window after this long (0 = never)"),
    ("browser", "command that opens a dedicated browser window, {url} is substituted"),
];

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Set a config value (upsert). Unknown keys and values that would
    /// not load are rejected.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        validate(key, value)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }

    /// All stored pairs, sorted by key.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key, value FROM config ORDER BY key ASC")?;
        let entries = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn validate(key: &str, value: &str) -> Result<()> {
    match key {
        "backend_url" | "user_id" | "org_id" | "browser" => {
            if value.trim().is_empty() {
                bail!("{key} cannot be empty");
            }
        }
        "provider" => {
            value.parse::<ProviderKind>()?;
        }
        "poll_interval_ms" => {
            let ms: u64 = value
                .parse()
                .with_context(|| format!("{key} must be a whole number of milliseconds"))?;
            if ms == 0 {
                bail!("{key} must be greater than zero");
            }
        }
        "timeout_secs" => {
            value
                .parse::<u64>()
                .with_context(|| format!("{key} must be a whole number of seconds"))?;
        }
        _ => bail!("unknown config key: {key}"),
    }
    Ok(())
}

/// Effective settings: built-in defaults, overlaid by stored config.
/// Command-line flags are applied on top by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub user_id: String,
    pub org_id: String,
    pub provider: ProviderKind,
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
    pub browser: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            org_id: DEFAULT_ORG_ID.to_string(),
            provider: ProviderKind::Hubspot,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_AUTHORIZATION_TIMEOUT),
            browser: None,
        }
    }
}

impl Settings {
    pub fn load(config: &Config) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(url) = config.get("backend_url")? {
            settings.backend_url = url;
        }
        if let Some(user) = config.get("user_id")? {
            settings.user_id = user;
        }
        if let Some(org) = config.get("org_id")? {
            settings.org_id = org;
        }
        if let Some(provider) = config.get("provider")? {
            settings.provider = provider
                .parse()
                .context("stored provider is invalid")?;
        }
        if let Some(ms) = config.get("poll_interval_ms")? {
            let ms: u64 = ms.parse().context("stored poll_interval_ms is invalid")?;
            settings.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(secs) = config.get("timeout_secs")? {
            let secs: u64 = secs.parse().context("stored timeout_secs is invalid")?;
            settings.timeout = timeout_from_secs(secs);
        }
        if let Some(browser) = config.get("browser")? {
            settings.browser = Some(browser);
        }
        Ok(settings)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            timeout: self.timeout,
        }
    }
}

/// `0` disables the timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

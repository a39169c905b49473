//! Project-wide constants.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Backend used when neither config nor flags name one.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

pub const DEFAULT_USER_ID: &str = "TestUser";
pub const DEFAULT_ORG_ID: &str = "TestOrg";

/// How often the authorization window is checked for closure.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Shorter poll intervals are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Give up on an authorization window after this long. Matches the
/// backend's OAuth state expiry, after which the exchange cannot succeed.
pub const DEFAULT_AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Consent screens are laid out for roughly this size.
pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 700;

/// Default database path: `~/.tether/tether.db`.
pub fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".tether").join("tether.db"))
}

/// Format a number with comma separators (e.g. 1,234,567).
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consts_from_cargo_toml() {
        assert!(AUTHOR.contains("Assaf Sapir"));
        assert!(HOMEPAGE.contains("sapir.io"));
        assert!(REPO.contains("github.com/assapir/tether"));
    }

    #[test]
    fn poll_interval_is_shorter_than_timeout() {
        assert!(DEFAULT_POLL_INTERVAL < DEFAULT_AUTHORIZATION_TIMEOUT);
    }

    #[test]
    fn default_db_path_ends_in_tether_dir() {
        if let Ok(path) = default_db_path() {
            assert!(path.ends_with(".tether/tether.db"));
        }
    }

    #[test]
    fn format_number_small() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(42), "42");
        assert_eq!(format_number(999), "999");
    }

    #[test]
    fn format_number_thousands() {
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(123_456), "123,456");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}

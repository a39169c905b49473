//! Startup banner and session summary display.

use crate::consts::{AUTHOR, HOMEPAGE, REPO, format_number};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub backend_url: &'a str,
    pub identity: &'a str,
    pub provider: &'a str,
    pub browser: &'a str,
    pub timeout: &'a str,
    pub db: &'a str,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║             T E T H E R               ║
   ║   connect an account, bring it home   ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   backend   {}
   identity  {}
   provider  {}
   browser   {}
   timeout   {}
   config    {}

   type /help for commands
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.backend_url,
        info.identity,
        info.provider,
        info.browser,
        info.timeout,
        info.db,
    );
}

/// Print the session summary and a farewell.
pub fn print_session_summary(connected: usize, items_loaded: u64) {
    if connected > 0 || items_loaded > 0 {
        println!(
            "session: {} connection(s), {} item(s) loaded",
            connected,
            format_number(items_loaded),
        );
    }
    println!("goodbye.");
}

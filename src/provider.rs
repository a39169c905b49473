//! Supported third-party providers and the backend routes each one uses.
//!
//! The state machine never branches on the provider. Everything
//! provider-specific lives in [`ENDPOINTS`]; adding a provider is a new
//! [`ProviderKind`] variant plus one table row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Notion,
    Airtable,
    Hubspot,
}

/// Backend routes and labels for one provider.
#[derive(Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub kind: ProviderKind,
    /// Path segment and config value, e.g. `"hubspot"`.
    pub slug: &'static str,
    pub display_name: &'static str,
    pub authorize: &'static str,
    pub credentials: &'static str,
    pub load: &'static str,
}

/// Indexed by `ProviderKind as usize`.
pub static ENDPOINTS: [Endpoints; 3] = [
    Endpoints {
        kind: ProviderKind::Notion,
        slug: "notion",
        display_name: "Notion",
        authorize: "/integrations/notion/authorize",
        credentials: "/integrations/notion/credentials",
        load: "/integrations/notion/load",
    },
    Endpoints {
        kind: ProviderKind::Airtable,
        slug: "airtable",
        display_name: "Airtable",
        authorize: "/integrations/airtable/authorize",
        credentials: "/integrations/airtable/credentials",
        load: "/integrations/airtable/load",
    },
    Endpoints {
        kind: ProviderKind::Hubspot,
        slug: "hubspot",
        display_name: "HubSpot",
        authorize: "/integrations/hubspot/authorize",
        credentials: "/integrations/hubspot/credentials",
        load: "/integrations/hubspot/get_hubspot_items",
    },
];

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Notion,
        ProviderKind::Airtable,
        ProviderKind::Hubspot,
    ];

    pub fn endpoints(self) -> &'static Endpoints {
        &ENDPOINTS[self as usize]
    }

    pub fn slug(self) -> &'static str {
        self.endpoints().slug
    }

    pub fn display_name(self) -> &'static str {
        self.endpoints().display_name
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Error)]
#[error("unknown provider: {0} (expected one of: notion, airtable, hubspot)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|p| p.slug() == wanted)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_variant() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.endpoints().kind, kind);
        }
    }

    #[test]
    fn every_route_lives_under_its_slug() {
        for e in &ENDPOINTS {
            let prefix = format!("/integrations/{}/", e.slug);
            assert!(e.authorize.starts_with(&prefix));
            assert!(e.credentials.starts_with(&prefix));
            assert!(e.load.starts_with(&prefix));
        }
    }

    #[test]
    fn hubspot_loads_from_its_own_route() {
        assert_eq!(
            ProviderKind::Hubspot.endpoints().load,
            "/integrations/hubspot/get_hubspot_items"
        );
        assert_eq!(
            ProviderKind::Notion.endpoints().load,
            "/integrations/notion/load"
        );
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("HubSpot".parse::<ProviderKind>().unwrap(), ProviderKind::Hubspot);
        assert_eq!(" notion ".parse::<ProviderKind>().unwrap(), ProviderKind::Notion);
        assert_eq!("AIRTABLE".parse::<ProviderKind>().unwrap(), ProviderKind::Airtable);
    }

    #[test]
    fn parse_unknown_fails() {
        let err = "salesforce".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("salesforce"));
    }

    #[test]
    fn display_uses_brand_name() {
        assert_eq!(ProviderKind::Hubspot.to_string(), "HubSpot");
    }

    #[test]
    fn serde_uses_slug() {
        let json = serde_json::to_string(&ProviderKind::Hubspot).unwrap();
        assert_eq!(json, "\"hubspot\"");
    }
}

pub mod http;
pub mod mock;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConnectError;
use crate::identity::Identity;
use crate::provider::ProviderKind;

/// Opaque credentials handed out by the backend.
///
/// Never inspected here, only stored and forwarded. `Debug` is redacted so
/// tokens do not leak into logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(serde_json::Value);

impl Credentials {
    /// Wrap a payload, or `None` when it carries nothing
    /// (`null`, `""`, `{}` or `[]`).
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        let empty = match &value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        };
        if empty { None } else { Some(Self(value)) }
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Serialized form posted back to the backend when loading items.
    pub fn to_json(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

/// One entry of a provider's normalized item listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub directory: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub last_modified_time: Option<String>,
}

/// The integration backend. The real one speaks HTTP; tests script one.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ask for the provider's consent URL for this identity.
    async fn authorization_url(
        &self,
        provider: ProviderKind,
        identity: &Identity,
    ) -> Result<String, ConnectError>;

    /// Fetch the credentials the backend stored after the OAuth callback.
    /// `Ok(None)` means the backend answered but had nothing.
    async fn credentials(
        &self,
        provider: ProviderKind,
        identity: &Identity,
    ) -> Result<Option<Credentials>, ConnectError>;

    async fn load_items(
        &self,
        provider: ProviderKind,
        credentials: &Credentials,
    ) -> Result<Vec<Item>, ConnectError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Pull the `detail` string out of a `{"detail": "..."}` error body,
/// falling back when the body has any other shape.
pub fn error_detail(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| match b.detail {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        })
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payloads_are_not_credentials() {
        assert!(Credentials::from_value(json!(null)).is_none());
        assert!(Credentials::from_value(json!("")).is_none());
        assert!(Credentials::from_value(json!({})).is_none());
        assert!(Credentials::from_value(json!([])).is_none());
    }

    #[test]
    fn non_empty_payload_is_kept_verbatim() {
        let creds = Credentials::from_value(json!({"access_token": "abc"})).unwrap();
        assert_eq!(creds.as_value()["access_token"], "abc");
        assert_eq!(creds.to_json(), r#"{"access_token":"abc"}"#);
    }

    #[test]
    fn debug_is_redacted() {
        let creds = Credentials::from_value(json!({"access_token": "secret"})).unwrap();
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn error_detail_reads_detail() {
        assert_eq!(error_detail(r#"{"detail":"rate limited"}"#, "fallback"), "rate limited");
    }

    #[test]
    fn error_detail_falls_back_on_other_shapes() {
        assert_eq!(error_detail("", "fallback"), "fallback");
        assert_eq!(error_detail("<html>oops</html>", "fallback"), "fallback");
        assert_eq!(error_detail(r#"{"error":"x"}"#, "fallback"), "fallback");
        assert_eq!(error_detail(r#"{"detail":[{"msg":"x"}]}"#, "fallback"), "fallback");
        assert_eq!(error_detail(r#"{"detail":"  "}"#, "fallback"), "fallback");
    }

    #[test]
    fn item_tolerates_missing_fields() {
        let item: Item = serde_json::from_str(r#"{"id":"1","type":"contact"}"#).unwrap();
        assert_eq!(item.id.as_deref(), Some("1"));
        assert_eq!(item.kind.as_deref(), Some("contact"));
        assert!(item.name.is_none());
        assert!(item.parent_id.is_none());
        assert!(!item.directory);
    }

    #[test]
    fn item_accepts_null_fields() {
        let item: Item =
            serde_json::from_str(r#"{"id":"c","name":null,"type":"category","directory":true}"#)
                .unwrap();
        assert!(item.name.is_none());
        assert!(item.directory);
    }
}

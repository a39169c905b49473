use std::fmt;

use crate::error::ConnectError;

/// The user/organization pair a connection is made for.
///
/// Supplied by the host application. Both ids must be non-empty, which is
/// checked once here so nothing downstream has to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    user_id: String,
    org_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, org_id: impl Into<String>) -> Result<Self, ConnectError> {
        let user_id = user_id.into().trim().to_string();
        let org_id = org_id.into().trim().to_string();
        if user_id.is_empty() {
            return Err(ConnectError::InvalidIdentity("user_id is empty".to_string()));
        }
        if org_id.is_empty() {
            return Err(ConnectError::InvalidIdentity("org_id is empty".to_string()));
        }
        Ok(Self { user_id, org_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    /// Form fields sent with every identity-keyed backend call.
    pub fn form(&self) -> [(&'static str, &str); 2] {
        [("user_id", &self.user_id), ("org_id", &self.org_id)]
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user_id, self.org_id)
    }
}

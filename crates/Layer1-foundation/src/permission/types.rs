//! Permission types - 권한 노드와 허용/거부 그랜트

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalises a permission node (`"System.Permission.Add"` → `"system.permission.add"`).
pub fn normalize_node(node: &str) -> String {
    node.trim().to_lowercase()
}

/// Allow or deny
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    Allow,
    Deny,
}

impl Grant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Grant {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        if s.eq_ignore_ascii_case("allow") {
            Ok(Self::Allow)
        } else if s.eq_ignore_ascii_case("deny") {
            Ok(Self::Deny)
        } else {
            Err(crate::Error::InvalidArgument(format!("Unknown grant: {s}")))
        }
    }
}

/// A grant attached to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedPermission {
    pub node: String,
    pub grant: Grant,
    /// Display name of whoever issued the grant.
    pub granter: String,
    pub granted_at: DateTime<Utc>,
}

impl GrantedPermission {
    pub fn new(node: &str, grant: Grant, granter: impl Into<String>) -> Self {
        Self {
            node: normalize_node(node),
            grant,
            granter: granter.into(),
            granted_at: Utc::now(),
        }
    }
}

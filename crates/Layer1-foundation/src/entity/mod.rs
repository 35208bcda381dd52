//! Entity resolution - 명령 대상 조회
//!
//! Command-style callers name their targets (a user, a group, a conversation
//! or a platform) with a display name or id. [`EntityResolver`] turns that
//! name into an opaque [`EntityHandle`]; [`EntityDirectory`] is the in-memory
//! reference implementation.
//!
//! ```rust
//! use switchboard_foundation::entity::{EntityDirectory, EntityKind, EntityResolver};
//!
//! let directory = EntityDirectory::new();
//! let alice = directory.add(EntityKind::User, "Alice");
//!
//! assert_eq!(directory.resolve(EntityKind::User, "alice").unwrap(), alice);
//! assert!(directory.resolve(EntityKind::Group, "admins").is_err());
//! ```

use crate::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// EntityKind
// ============================================================================

/// 엔티티 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Group,
    Conversation,
    Platform,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Conversation => "conversation",
            Self::Platform => "platform",
        }
    }

    /// Users and groups are looked up by display name; the rest by id.
    fn case_insensitive(&self) -> bool {
        matches!(self, Self::User | Self::Group)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            "conversation" => Ok(Self::Conversation),
            "platform" => Ok(Self::Platform),
            other => Err(Error::InvalidArgument(format!(
                "Unknown entity type: {other}"
            ))),
        }
    }
}

// ============================================================================
// EntityHandle
// ============================================================================

/// Opaque reference to a resolved entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle {
    id: u64,
    kind: EntityKind,
    name: String,
}

impl EntityHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Display name (or id, for conversations and platforms).
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

// ============================================================================
// EntityResolver
// ============================================================================

/// 이름으로 엔티티 조회
///
/// Failure to resolve is [`Error::NotFound`] with the attempted name echoed.
pub trait EntityResolver: Send + Sync {
    fn resolve(&self, kind: EntityKind, name: &str) -> Result<EntityHandle>;
}

// ============================================================================
// EntityDirectory
// ============================================================================

/// In-memory [`EntityResolver`].
#[derive(Debug, Default)]
pub struct EntityDirectory {
    entries: RwLock<HashMap<(EntityKind, String), EntityHandle>>,
    next_id: AtomicU64,
}

impl EntityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(kind: EntityKind, name: &str) -> (EntityKind, String) {
        if kind.case_insensitive() {
            (kind, name.to_lowercase())
        } else {
            (kind, name.to_string())
        }
    }

    /// 엔티티 등록 (이미 있으면 기존 핸들 반환)
    pub fn add(&self, kind: EntityKind, name: impl Into<String>) -> EntityHandle {
        let name = name.into();
        let mut entries = self.entries.write();
        entries
            .entry(Self::key(kind, &name))
            .or_insert_with(|| EntityHandle {
                id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                kind,
                name,
            })
            .clone()
    }

    /// 엔티티 제거
    pub fn remove(&self, kind: EntityKind, name: &str) -> Option<EntityHandle> {
        self.entries.write().remove(&Self::key(kind, name))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityResolver for EntityDirectory {
    fn resolve(&self, kind: EntityKind, name: &str) -> Result<EntityHandle> {
        self.entries
            .read()
            .get(&Self::key(kind, name))
            .cloned()
            .ok_or_else(|| Error::not_found(kind, name))
    }
}

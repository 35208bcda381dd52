//! Permission service for Switchboard
//!
//! Holds per-entity grants and answers permission checks.
//! This is a pure data management layer - command parsing is handled elsewhere.

use super::types::{normalize_node, Grant, GrantedPermission};
use crate::entity::{EntityHandle, EntityKind};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Permission check capability consumed by command handlers.
///
/// Implementations fail with [`Error::AccessDenied`] when `principal` lacks an
/// allow grant for `node` after deny-overrides-allow resolution.
pub trait PermissionCheck: Send + Sync {
    fn check_permission(&self, principal: &EntityHandle, node: &str) -> Result<()>;

    /// Convenience wrapper around [`PermissionCheck::check_permission`].
    fn has_permission(&self, principal: &EntityHandle, node: &str) -> bool {
        self.check_permission(principal, node).is_ok()
    }
}

/// Permission check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// An allow grant applies and no deny does
    Granted,

    /// A deny grant applies (wins over any allow)
    Denied,

    /// No grant applies
    Unknown,
}

/// In-memory grant store
///
/// This service handles:
/// - grants per entity (users, groups, conversations)
/// - user → group membership
/// - permission checking over a user and the groups it belongs to
#[derive(Debug, Default)]
pub struct GrantStore {
    grants: RwLock<HashMap<EntityHandle, BTreeMap<String, GrantedPermission>>>,
    memberships: RwLock<HashMap<EntityHandle, HashSet<EntityHandle>>>,
}

impl GrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) the grant for `node` on `entity`.
    pub fn set_permission(
        &self,
        entity: &EntityHandle,
        node: &str,
        grant: Grant,
        granter: impl Into<String>,
    ) -> GrantedPermission {
        let granted = GrantedPermission::new(node, grant, granter);
        self.grants
            .write()
            .entry(entity.clone())
            .or_default()
            .insert(granted.node.clone(), granted.clone());
        granted
    }

    /// Sets the grant for `node` only if `entity` has none for it yet.
    ///
    /// The check and the insert happen under one write lock. On conflict the
    /// existing grant is returned as the error.
    pub fn try_set_permission(
        &self,
        entity: &EntityHandle,
        node: &str,
        grant: Grant,
        granter: impl Into<String>,
    ) -> std::result::Result<GrantedPermission, GrantedPermission> {
        let mut grants = self.grants.write();
        let nodes = grants.entry(entity.clone()).or_default();

        let node = normalize_node(node);
        if let Some(existing) = nodes.get(&node) {
            return Err(existing.clone());
        }

        let granted = GrantedPermission::new(&node, grant, granter);
        nodes.insert(node, granted.clone());
        Ok(granted)
    }

    pub fn get_permission(&self, entity: &EntityHandle, node: &str) -> Option<GrantedPermission> {
        self.grants
            .read()
            .get(entity)
            .and_then(|nodes| nodes.get(&normalize_node(node)))
            .cloned()
    }

    pub fn remove_permission(&self, entity: &EntityHandle, node: &str) -> Option<GrantedPermission> {
        let mut grants = self.grants.write();
        let nodes = grants.get_mut(entity)?;
        let removed = nodes.remove(&normalize_node(node));
        if nodes.is_empty() {
            grants.remove(entity);
        }
        removed
    }

    /// All grants of `entity`, ordered by node.
    pub fn permissions(&self, entity: &EntityHandle) -> Vec<GrantedPermission> {
        self.grants
            .read()
            .get(entity)
            .map(|nodes| nodes.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Adds `user` to `group`.
    pub fn add_member(&self, group: &EntityHandle, user: &EntityHandle) -> Result<()> {
        if group.kind() != EntityKind::Group {
            return Err(Error::InvalidArgument(format!("{group} is not a group")));
        }
        self.memberships
            .write()
            .entry(user.clone())
            .or_default()
            .insert(group.clone());
        Ok(())
    }

    pub fn remove_member(&self, group: &EntityHandle, user: &EntityHandle) -> bool {
        self.memberships
            .write()
            .get_mut(user)
            .map(|groups| groups.remove(group))
            .unwrap_or(false)
    }

    /// Resolves `node` for `principal`: its own grants plus those of its groups.
    pub fn status(&self, principal: &EntityHandle, node: &str) -> PermissionStatus {
        let node = normalize_node(node);
        let memberships = self.memberships.read();
        let grants = self.grants.read();

        let subjects = std::iter::once(principal)
            .chain(memberships.get(principal).into_iter().flatten());

        let mut status = PermissionStatus::Unknown;
        for subject in subjects {
            match grants.get(subject).and_then(|nodes| nodes.get(&node)) {
                Some(granted) if granted.grant == Grant::Deny => return PermissionStatus::Denied,
                Some(_) => status = PermissionStatus::Granted,
                None => {}
            }
        }
        status
    }
}

impl PermissionCheck for GrantStore {
    fn check_permission(&self, principal: &EntityHandle, node: &str) -> Result<()> {
        match self.status(principal, node) {
            PermissionStatus::Granted => Ok(()),
            PermissionStatus::Denied | PermissionStatus::Unknown => {
                tracing::debug!(principal = %principal, node, "permission check failed");
                Err(Error::access_denied(principal.name(), normalize_node(node)))
            }
        }
    }
}

//! Permission command - 엔티티 권한 조회/부여/회수

use crate::context::CommandContext;
use crate::error::{CommandError, Result};
use crate::events::{PermissionGranted, PermissionRevoked};
use crate::response::CommandResponse;
use std::sync::Arc;
use switchboard_event::EventDispatcher;
use switchboard_foundation::entity::{EntityHandle, EntityKind, EntityResolver};
use switchboard_foundation::permission::{Grant, GrantStore, GrantedPermission};
use tracing::info;

/// Manages the grants of users, groups and conversations.
pub struct PermissionCommand {
    grants: Arc<GrantStore>,
    entities: Arc<dyn EntityResolver>,
    dispatcher: Arc<EventDispatcher>,
}

impl PermissionCommand {
    pub const NODE_LIST: &'static str = "system.permission.list";
    pub const NODE_ADD: &'static str = "system.permission.add";
    pub const NODE_REMOVE: &'static str = "system.permission.remove";

    pub fn new(
        grants: Arc<GrantStore>,
        entities: Arc<dyn EntityResolver>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            grants,
            entities,
            dispatcher,
        }
    }

    pub fn description(&self) -> &'static str {
        "Manages permissions and security"
    }

    /// Lists the grants of an entity, one page at a time.
    pub fn list(
        &self,
        ctx: &CommandContext,
        kind: EntityKind,
        name: &str,
        page: usize,
    ) -> Result<CommandResponse> {
        ctx.require(Self::NODE_LIST)?;
        let entity = self.target(kind, name)?;

        let grants = self.grants.permissions(&entity);
        CommandResponse::paged(&grants, page, format_grant)
    }

    /// Grants `node` to an entity. Fails if the entity already has any grant
    /// (allow or deny) for it.
    pub fn add(
        &self,
        ctx: &CommandContext,
        kind: EntityKind,
        name: &str,
        node: &str,
        grant: Grant,
    ) -> Result<CommandResponse> {
        ctx.require(Self::NODE_ADD)?;
        let entity = self.target(kind, name)?;

        let permission = self
            .grants
            .try_set_permission(&entity, node, grant, ctx.principal.name())
            .map_err(|_| CommandError::invalid_argument("Permission already granted to entity."))?;
        info!(
            entity = %entity,
            node = %permission.node,
            grant = %grant,
            by = %ctx.principal,
            "Permission granted"
        );

        let message = format!("Granted \"{}\" to entity ({})", permission.node, grant);
        self.dispatcher.publish(PermissionGranted {
            entity,
            permission,
            granted_by: ctx.principal.clone(),
        })?;

        Ok(CommandResponse::message(message))
    }

    /// Removes `node` from an entity. The caller must hold `node` as well.
    pub fn remove(
        &self,
        ctx: &CommandContext,
        kind: EntityKind,
        name: &str,
        node: &str,
    ) -> Result<CommandResponse> {
        ctx.require(Self::NODE_REMOVE)?;
        ctx.require(node)?;
        let entity = self.target(kind, name)?;

        let permission = self
            .grants
            .remove_permission(&entity, node)
            .ok_or_else(|| CommandError::invalid_argument("Permission not granted to entity."))?;
        info!(
            entity = %entity,
            node = %permission.node,
            by = %ctx.principal,
            "Permission removed"
        );

        let message = format!("Removed \"{}\" from entity.", permission.node);
        self.dispatcher.publish(PermissionRevoked {
            entity,
            permission,
            revoked_by: ctx.principal.clone(),
        })?;

        Ok(CommandResponse::message(message))
    }

    /// Checks `node` against the caller's own permissions.
    pub fn test(&self, ctx: &CommandContext, node: &str) -> Result<CommandResponse> {
        ctx.require(node)?;
        Ok(CommandResponse::message("Permission was allowed."))
    }

    fn target(&self, kind: EntityKind, name: &str) -> Result<EntityHandle> {
        match kind {
            EntityKind::User | EntityKind::Group | EntityKind::Conversation => {
                Ok(self.entities.resolve(kind, name)?)
            }
            EntityKind::Platform => Err(CommandError::invalid_argument("Unknown entity type")),
        }
    }
}

fn format_grant(permission: &GrantedPermission) -> String {
    format!(
        "{} {} (granted by {} on {})",
        permission.grant,
        permission.node,
        permission.granter,
        permission.granted_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

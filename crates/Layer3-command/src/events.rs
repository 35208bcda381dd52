//! Domain events published by built-in commands
//!
//! Each event is published synchronously after the change it describes has
//! been applied. A listener failure is reported back to the command caller.

use switchboard_event::Event;
use switchboard_foundation::entity::EntityHandle;
use switchboard_foundation::permission::GrantedPermission;

/// A grant was added to an entity.
#[derive(Debug, Clone)]
pub struct PermissionGranted {
    pub entity: EntityHandle,
    pub permission: GrantedPermission,
    /// Whoever ran the command
    pub granted_by: EntityHandle,
}

impl Event for PermissionGranted {
    fn event_name(&self) -> &'static str {
        "permission.granted"
    }
}

/// A grant was removed from an entity.
#[derive(Debug, Clone)]
pub struct PermissionRevoked {
    pub entity: EntityHandle,
    pub permission: GrantedPermission,
    pub revoked_by: EntityHandle,
}

impl Event for PermissionRevoked {
    fn event_name(&self) -> &'static str {
        "permission.revoked"
    }
}

#[derive(Debug, Clone)]
pub struct PlatformConnected {
    pub platform: String,
    pub connected_by: EntityHandle,
}

impl Event for PlatformConnected {
    fn event_name(&self) -> &'static str {
        "platform.connected"
    }
}

#[derive(Debug, Clone)]
pub struct PlatformDisconnected {
    pub platform: String,
    pub disconnected_by: EntityHandle,
}

impl Event for PlatformDisconnected {
    fn event_name(&self) -> &'static str {
        "platform.disconnected"
    }
}

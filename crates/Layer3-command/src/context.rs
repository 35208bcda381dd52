//! Command context - 명령 실행 주체와 권한 확인

use crate::error::Result;
use std::sync::Arc;
use switchboard_foundation::entity::EntityHandle;
use switchboard_foundation::permission::PermissionCheck;

/// Who is running a command, and how their permissions are checked.
#[derive(Clone)]
pub struct CommandContext {
    /// The acting user
    pub principal: EntityHandle,

    pub permissions: Arc<dyn PermissionCheck>,
}

impl CommandContext {
    pub fn new(principal: EntityHandle, permissions: Arc<dyn PermissionCheck>) -> Self {
        Self {
            principal,
            permissions,
        }
    }

    /// Fails with `AccessDenied` unless the principal holds `node`.
    pub fn require(&self, node: &str) -> Result<()> {
        self.permissions.check_permission(&self.principal, node)?;
        Ok(())
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

//! Platform command - 플랫폼 목록/정보/연결/해제

use crate::context::CommandContext;
use crate::error::{CommandError, Result};
use crate::events::{PlatformConnected, PlatformDisconnected};
use crate::platform::{Platform, PlatformConnection, PlatformRegistry};
use crate::response::CommandResponse;
use std::sync::Arc;
use switchboard_event::EventDispatcher;
use switchboard_foundation::Error;
use tracing::{info, warn};

/// Lists, inspects, connects and disconnects platforms.
pub struct PlatformCommand {
    platforms: Arc<dyn PlatformRegistry>,
    dispatcher: Arc<EventDispatcher>,
}

impl PlatformCommand {
    pub const NODE_LIST: &'static str = "system.platform.list";
    pub const NODE_INFO: &'static str = "system.platform.info";
    pub const NODE_CONNECT: &'static str = "system.platform.connect";
    pub const NODE_DISCONNECT: &'static str = "system.platform.disconnect";

    pub fn new(platforms: Arc<dyn PlatformRegistry>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            platforms,
            dispatcher,
        }
    }

    pub fn description(&self) -> &'static str {
        "Manages platforms"
    }

    /// Platforms sorted by id, one page at a time.
    pub fn list(&self, ctx: &CommandContext, page: usize) -> Result<CommandResponse> {
        ctx.require(Self::NODE_LIST)?;

        let mut platforms = self.platforms.platforms();
        platforms.sort_by(|a, b| a.id().cmp(b.id()));

        CommandResponse::paged(&platforms, page, |platform| {
            let state = if platform.is_connected() {
                "(connected)"
            } else {
                "(disconnected)"
            };
            format!("{} {}", platform.id(), state)
        })
    }

    pub fn info(&self, ctx: &CommandContext, id: &str) -> Result<CommandResponse> {
        ctx.require(Self::NODE_INFO)?;
        let platform = self.find(id)?;

        let details = CommandResponse::details("Platform", platform.id())
            .item("Plugin", platform.plugin().unwrap_or("(none)"));

        let details = if platform.is_registered() {
            details
                .item("Registered", "true")
                .item("Connected", platform.is_connected().to_string())
        } else {
            details.item("Registered", "false")
        };

        Ok(details.build())
    }

    pub fn connect(&self, ctx: &CommandContext, id: &str) -> Result<CommandResponse> {
        ctx.require(Self::NODE_CONNECT)?;
        let platform = self.find(id)?;

        if platform.is_connected() {
            return Err(CommandError::invalid_argument("Platform is already connected."));
        }
        let connection = Self::registered(platform.as_ref())?;

        connection.connect().map_err(|err| {
            warn!(platform = platform.id(), error = %err, "Platform connect failed");
            CommandError::execution_caused_by(
                format!("Failed to connect to platform {}", platform.id()),
                err,
            )
        })?;

        if !connection.is_connected() {
            return Err(CommandError::execution(
                "Platform did not connect after attempting to make a connection.",
            ));
        }

        info!(platform = platform.id(), by = %ctx.principal, "Platform connected");
        self.dispatcher.publish(PlatformConnected {
            platform: platform.id().to_string(),
            connected_by: ctx.principal.clone(),
        })?;

        Ok(CommandResponse::message("Platform connected successfully."))
    }

    pub fn disconnect(&self, ctx: &CommandContext, id: &str) -> Result<CommandResponse> {
        ctx.require(Self::NODE_DISCONNECT)?;
        let platform = self.find(id)?;

        if !platform.is_connected() {
            return Err(CommandError::invalid_argument("Platform is already disconnected."));
        }
        let connection = Self::registered(platform.as_ref())?;

        match connection.disconnect() {
            Ok(()) => {}
            Err(Error::Unsupported(_)) => {
                return Err(CommandError::invalid_argument(
                    "Platform does not support disconnecting.",
                ))
            }
            Err(err) => {
                warn!(platform = platform.id(), error = %err, "Platform disconnect failed");
                return Err(CommandError::execution_caused_by(
                    format!("Failed to disconnect platform {}", platform.id()),
                    err,
                ));
            }
        }

        if connection.is_connected() {
            return Err(CommandError::execution(
                "Platform did not disconnect after attempting to close its connection.",
            ));
        }

        info!(platform = platform.id(), by = %ctx.principal, "Platform disconnected");
        self.dispatcher.publish(PlatformDisconnected {
            platform: platform.id().to_string(),
            disconnected_by: ctx.principal.clone(),
        })?;

        Ok(CommandResponse::message("Platform disconnected successfully."))
    }

    fn find(&self, id: &str) -> Result<Arc<dyn Platform>> {
        self.platforms
            .platform(id)
            .ok_or_else(|| CommandError::invalid_argument("Platform not found."))
    }

    fn registered(platform: &dyn Platform) -> Result<Arc<dyn PlatformConnection>> {
        platform
            .connection()
            .ok_or_else(|| CommandError::invalid_argument("Platform is not registered."))
    }
}

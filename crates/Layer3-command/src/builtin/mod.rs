//! Builtin commands for Switchboard

pub mod permission;
pub mod platform;

pub use permission::PermissionCommand;
pub use platform::PlatformCommand;

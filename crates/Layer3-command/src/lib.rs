//! # switchboard-command
//!
//! Built-in commands for Switchboard:
//! - Builtin: 권한/플랫폼 관리 명령 (PermissionCommand, PlatformCommand)
//! - Context: 실행 주체 + 권한 확인 (CommandContext)
//! - Response: 메시지/페이지 목록/상세 (CommandResponse)
//! - Events: 명령이 발행하는 도메인 이벤트
//! - Platform: 플랫폼 연결 계약 + 메모리 구현 (PlatformRegistry, PlatformDirectory)
//!
//! Argument parsing is not part of this crate: commands are plain method
//! calls. Every command checks its permission node first, applies its change
//! and then publishes a domain event through the shared [`EventDispatcher`].
//!
//! [`EventDispatcher`]: switchboard_event::EventDispatcher

pub mod builtin;
pub mod context;
pub mod error;
pub mod events;
pub mod platform;
pub mod response;

pub use builtin::{PermissionCommand, PlatformCommand};
pub use context::CommandContext;
pub use error::{CommandError, Result};
pub use events::{PermissionGranted, PermissionRevoked, PlatformConnected, PlatformDisconnected};
pub use platform::{
    ConnectBehavior, MemoryConnection, MemoryPlatform, Platform, PlatformConnection,
    PlatformDirectory, PlatformRegistry,
};
pub use response::{CommandResponse, DetailsBuilder, PAGE_SIZE};

//! # switchboard-foundation
//!
//! Foundation layer for Switchboard:
//! - Error: 공통 에러 타입 (Error, Result)
//! - Config: 통합 설정 (SwitchboardConfig, DispatchConfig, EngineConfig)
//! - Storage: JsonStore (설정 파일)
//! - Permission: 권한 확인 계약 + 메모리 구현 (PermissionCheck, GrantStore)
//! - Entity: 대상 조회 계약 + 메모리 구현 (EntityResolver, EntityDirectory)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Builtin Commands (Layer3)                               │
//! │        │                        │                        │
//! │        ▼                        ▼                        │
//! │  PermissionCheck          EntityResolver                 │
//! │  (deny overrides allow)   (user/group/conversation/...)  │
//! │        │                        │                        │
//! │        └──────────┬─────────────┘                        │
//! │                   ▼                                      │
//! │        Error::AccessDenied / Error::NotFound             │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod permission;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    ConfigLayer, DispatchConfig, DispatchLayer, EngineConfig, EngineLayer, SwitchboardConfig,
    SWITCHBOARD_CONFIG_FILE,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;

// ============================================================================
// Permission (권한 시스템)
// ============================================================================
pub use permission::{
    normalize_node, Grant, GrantStore, GrantedPermission, PermissionCheck, PermissionStatus,
};

// ============================================================================
// Entity (대상 조회)
// ============================================================================
pub use entity::{EntityDirectory, EntityHandle, EntityKind, EntityResolver};

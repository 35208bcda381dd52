//! Permission system for Switchboard
//!
//! - `types`: 권한 노드, 허용/거부 그랜트 (Grant, GrantedPermission)
//! - `service`: 권한 확인 (PermissionCheck, GrantStore)
//!
//! ## 사용 예시
//!
//! ```rust
//! use switchboard_foundation::entity::{EntityDirectory, EntityKind};
//! use switchboard_foundation::permission::{Grant, GrantStore, PermissionCheck};
//!
//! let directory = EntityDirectory::new();
//! let alice = directory.add(EntityKind::User, "alice");
//!
//! let store = GrantStore::new();
//! store.set_permission(&alice, "system.permission.add", Grant::Allow, "root");
//!
//! assert!(store.check_permission(&alice, "system.permission.add").is_ok());
//! assert!(store.check_permission(&alice, "system.platform.connect").is_err());
//! ```

mod service;
mod types;

pub use service::{GrantStore, PermissionCheck, PermissionStatus};
pub use types::{normalize_node, Grant, GrantedPermission};

//! Platform registry - 플랫폼 연결 계약 + 메모리 구현
//!
//! Connection lifecycle internals belong to platform plugins; commands only
//! see them through [`PlatformRegistry`], [`Platform`] and
//! [`PlatformConnection`].

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use switchboard_foundation::{Error, Result};

// ============================================================================
// Contracts
// ============================================================================

/// A live connection registered by a platform plugin.
pub trait PlatformConnection: Send + Sync {
    fn connect(&self) -> Result<()>;

    /// Returns [`Error::Unsupported`] if the connection cannot be closed.
    fn disconnect(&self) -> Result<()>;

    fn is_connected(&self) -> bool;
}

/// A chat platform known to the bot.
pub trait Platform: Send + Sync {
    fn id(&self) -> &str;

    /// Identifier of the plugin providing this platform
    fn plugin(&self) -> Option<&str>;

    /// `None` until a plugin registers a connection for the platform.
    fn connection(&self) -> Option<Arc<dyn PlatformConnection>>;

    fn is_registered(&self) -> bool {
        self.connection().is_some()
    }

    fn is_connected(&self) -> bool {
        self.connection().is_some_and(|c| c.is_connected())
    }
}

/// Lookup of platforms by id.
pub trait PlatformRegistry: Send + Sync {
    fn platform(&self, id: &str) -> Option<Arc<dyn Platform>>;

    fn platforms(&self) -> Vec<Arc<dyn Platform>>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// What [`MemoryConnection::connect`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectBehavior {
    Succeed,
    /// Fails with a platform error carrying this message
    Fail(String),
    /// Returns success without actually connecting
    Stall,
}

/// Connection whose behavior is fixed up front.
#[derive(Debug)]
pub struct MemoryConnection {
    connected: AtomicBool,
    on_connect: ConnectBehavior,
    can_disconnect: bool,
    platform: String,
}

impl MemoryConnection {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            connected: AtomicBool::new(false),
            on_connect: ConnectBehavior::Succeed,
            can_disconnect: true,
            platform: platform.into(),
        }
    }

    pub fn on_connect(mut self, behavior: ConnectBehavior) -> Self {
        self.on_connect = behavior;
        self
    }

    /// Makes `disconnect` fail with [`Error::Unsupported`].
    pub fn without_disconnect(mut self) -> Self {
        self.can_disconnect = false;
        self
    }
}

impl PlatformConnection for MemoryConnection {
    fn connect(&self) -> Result<()> {
        match &self.on_connect {
            ConnectBehavior::Succeed => {
                self.connected.store(true, Ordering::SeqCst);
                Ok(())
            }
            ConnectBehavior::Fail(message) => Err(Error::platform(&self.platform, message.clone())),
            ConnectBehavior::Stall => Ok(()),
        }
    }

    fn disconnect(&self) -> Result<()> {
        if !self.can_disconnect {
            return Err(Error::Unsupported(format!(
                "disconnecting platform {}",
                self.platform
            )));
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Platform entry held by a [`PlatformDirectory`].
pub struct MemoryPlatform {
    id: String,
    plugin: Option<String>,
    connection: RwLock<Option<Arc<dyn PlatformConnection>>>,
}

impl MemoryPlatform {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plugin: None,
            connection: RwLock::new(None),
        }
    }

    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    pub fn with_connection(self, connection: Arc<dyn PlatformConnection>) -> Self {
        *self.connection.write() = Some(connection);
        self
    }

    /// Registers (or replaces) the platform's connection.
    pub fn register(&self, connection: Arc<dyn PlatformConnection>) {
        *self.connection.write() = Some(connection);
    }

    pub fn unregister(&self) -> Option<Arc<dyn PlatformConnection>> {
        self.connection.write().take()
    }
}

impl Platform for MemoryPlatform {
    fn id(&self) -> &str {
        &self.id
    }

    fn plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    fn connection(&self) -> Option<Arc<dyn PlatformConnection>> {
        self.connection.read().clone()
    }
}

impl std::fmt::Debug for MemoryPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPlatform")
            .field("id", &self.id)
            .field("plugin", &self.plugin)
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// In-memory [`PlatformRegistry`], ordered by id.
#[derive(Default)]
pub struct PlatformDirectory {
    platforms: RwLock<BTreeMap<String, Arc<dyn Platform>>>,
}

impl PlatformDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, platform: Arc<dyn Platform>) {
        self.platforms
            .write()
            .insert(platform.id().to_string(), platform);
    }

    pub fn remove(&self, id: &str) -> Option<Arc<dyn Platform>> {
        self.platforms.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.platforms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.read().is_empty()
    }
}

impl PlatformRegistry for PlatformDirectory {
    fn platform(&self, id: &str) -> Option<Arc<dyn Platform>> {
        self.platforms.read().get(id).cloned()
    }

    fn platforms(&self) -> Vec<Arc<dyn Platform>> {
        self.platforms.read().values().cloned().collect()
    }
}

//! Switchboard Config - 통합 설정
//!
//! 디스패처와 실행 엔진 설정을 통합 관리하는 SwitchboardConfig

use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 설정 파일명
pub const SWITCHBOARD_CONFIG_FILE: &str = "config.json";

// ============================================================================
// Switchboard Config (통합)
// ============================================================================

/// Switchboard 통합 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwitchboardConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// 디스패처 설정
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// 실행 엔진(워커 풀) 설정
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            dispatch: DispatchConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl SwitchboardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let global = JsonStore::global().ok();
        let project = JsonStore::current_project().ok();
        Self::load_layered(global.as_ref(), project.as_ref())
    }

    /// Applies the `config.json` of `base`, then that of `overlay`, over the
    /// defaults. Either store may be absent, and so may its file.
    pub fn load_layered(base: Option<&JsonStore>, overlay: Option<&JsonStore>) -> Result<Self> {
        let mut config = Self::new();

        for store in [base, overlay].into_iter().flatten() {
            if let Some(layer) = store.read::<ConfigLayer>(SWITCHBOARD_CONFIG_FILE)? {
                config.merge(layer);
            }
        }

        Ok(config)
    }

    /// 특정 디렉토리에서 로드 (없으면 기본값)
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        Self::load_layered(Some(store), None)
    }

    /// 글로벌 설정 저장
    pub fn save_global(&self) -> Result<()> {
        self.save_to(&JsonStore::global()?)
    }

    /// 프로젝트 설정 저장
    pub fn save_project(&self) -> Result<()> {
        self.save_to(&JsonStore::current_project()?)
    }

    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.write(SWITCHBOARD_CONFIG_FILE, self)
    }

    /// Every value the layer sets wins, including ones equal to a default.
    pub fn merge(&mut self, layer: ConfigLayer) {
        if let Some(version) = layer.version {
            self.version = version;
        }
        self.dispatch.merge(layer.dispatch);
        self.engine.merge(layer.engine);
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn trace_deliveries(mut self, enabled: bool) -> Self {
        self.dispatch.trace_deliveries = enabled;
        self
    }

    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.engine.max_workers = max_workers;
        self
    }
}

// ============================================================================
// Dispatch Config
// ============================================================================

/// 디스패처 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    /// 핸들러 호출마다 trace 로그 출력
    #[serde(default)]
    pub trace_deliveries: bool,
}

impl DispatchConfig {
    fn merge(&mut self, layer: DispatchLayer) {
        if let Some(trace_deliveries) = layer.trace_deliveries {
            self.trace_deliveries = trace_deliveries;
        }
    }
}

// ============================================================================
// Engine Config
// ============================================================================

/// 실행 엔진 설정
///
/// The pool grows on demand up to `max_workers` and keeps idle threads around
/// for `keep_alive_ms` before retiring them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// 워커 스레드 이름
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// 최대 워커 수
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// 유휴 워커 유지 시간 (ms)
    #[serde(default = "default_keep_alive_ms")]
    pub keep_alive_ms: u64,

    /// 종료 시 대기 시간 (ms)
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            max_workers: default_max_workers(),
            keep_alive_ms: default_keep_alive_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl EngineConfig {
    #[inline]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    #[inline]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Worker limit clamped to a minimum of 1.
    #[inline]
    pub fn max_workers_clamped(&self) -> usize {
        self.max_workers.max(1)
    }

    fn merge(&mut self, layer: EngineLayer) {
        if let Some(thread_name) = layer.thread_name {
            self.thread_name = thread_name;
        }
        if let Some(max_workers) = layer.max_workers {
            self.max_workers = max_workers;
        }
        if let Some(keep_alive_ms) = layer.keep_alive_ms {
            self.keep_alive_ms = keep_alive_ms;
        }
        if let Some(shutdown_grace_ms) = layer.shutdown_grace_ms {
            self.shutdown_grace_ms = shutdown_grace_ms;
        }
    }
}

// ============================================================================
// Config Layer (파일 한 개의 명시적 값)
// ============================================================================

/// The values one config file sets explicitly. Keys absent from the file stay
/// `None` and leave the underlying value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    #[serde(default)]
    pub dispatch: DispatchLayer,

    #[serde(default)]
    pub engine: EngineLayer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_deliveries: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown_grace_ms: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

fn default_version() -> u32 {
    1
}

fn default_thread_name() -> String {
    "switchboard-worker".to_string()
}

fn default_max_workers() -> usize {
    512
}

fn default_keep_alive_ms() -> u64 {
    60_000
}

fn default_shutdown_grace_ms() -> u64 {
    5_000
}

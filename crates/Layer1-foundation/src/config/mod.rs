//! Config - 통합 설정 관리
//!
//! - `switchboard.rs` - SwitchboardConfig 통합 설정 (dispatch + engine), ConfigLayer 파일별 명시 값

mod switchboard;

pub use switchboard::{
    ConfigLayer, DispatchConfig, DispatchLayer, EngineConfig, EngineLayer, SwitchboardConfig,
    SWITCHBOARD_CONFIG_FILE,
};

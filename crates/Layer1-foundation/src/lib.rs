//! # hostplug-foundation
//!
//! Foundation layer for hostplug:
//! - Error: 공통 에러 타입 (로드 실패, hook 설치 실패, 슬롯 고갈)
//! - Config: 통합 설정 (HostConfig, StubConfig 등)과 설정 파일 층 (ConfigSource)

pub mod config;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    ActivitySlots,
    ConfigSource,
    HookSettings,
    HostConfig,
    PluginLoadConfig,
    StubConfig,
    MAX_STUB_SLOTS,
    HOST_CONFIG_FILE,
};

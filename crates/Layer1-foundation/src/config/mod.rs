//! Config - 통합 설정 관리
//!
//! - `stubs.rs` - placeholder 슬롯 수와 이름 규칙
//! - `host.rs` - HostConfig 통합 설정
//! - `source.rs` - 글로벌/프로젝트 설정 파일 층

mod host;
mod source;
mod stubs;

pub use host::{HookSettings, HostConfig, PluginLoadConfig, HOST_CONFIG_FILE};
pub use source::{ConfigSource, GLOBAL_CONFIG_DIR, PROJECT_CONFIG_DIR};
pub use stubs::{ActivitySlots, StubConfig, MAX_STUB_SLOTS};

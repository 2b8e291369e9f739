//! Host Config - 통합 설정
//!
//! Plugin host 전체 설정을 관리하는 HostConfig

use super::source::ConfigSource;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::StubConfig;

/// 설정 파일명
pub const HOST_CONFIG_FILE: &str = "hostplug.json";

// ============================================================================
// Host Config (통합)
// ============================================================================

/// hostplug 통합 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// Host 패키지 이름
    #[serde(default = "default_host_package")]
    pub host_package: String,

    /// Placeholder 풀
    #[serde(default)]
    pub stubs: StubConfig,

    /// 플러그인 로드 설정
    #[serde(default)]
    pub plugins: PluginLoadConfig,

    /// Hook 설정
    #[serde(default)]
    pub hooks: HookSettings,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            host_package: default_host_package(),
            stubs: StubConfig::default(),
            plugins: PluginLoadConfig::default(),
            hooks: HookSettings::default(),
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        Self::load_layers(&ConfigSource::default_layers())
    }

    /// 주어진 층을 순서대로 병합한 뒤 검증
    pub fn load_layers(sources: &[ConfigSource]) -> Result<Self> {
        let mut config = Self::new();
        for source in sources {
            if let Some(layer) = source.read()? {
                config.merge(layer);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// 특정 파일에서 로드
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let source = ConfigSource::File(path.as_ref().to_path_buf());
        let config = source.read()?.ok_or_else(|| {
            Error::Config(format!("Config file not found: {}", source.path().display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 프로젝트 설정 저장
    pub fn save_project(&self) -> Result<()> {
        ConfigSource::current_project()?.write(self)
    }

    /// 설정 검증
    pub fn validate(&self) -> Result<()> {
        if self.host_package.trim().is_empty() {
            return Err(Error::Config("hostPackage must not be empty".to_string()));
        }
        self.stubs.validate()
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    ///
    /// 섹션 단위로 교체한다. 파일에 없는 섹션은 serde 기본값이 들어오므로
    /// 기본값과 같으면 기존 값을 유지한다.
    pub fn merge(&mut self, other: HostConfig) {
        if other.host_package != default_host_package() {
            self.host_package = other.host_package;
        }
        if other.stubs != StubConfig::default() {
            self.stubs = other.stubs;
        }
        self.plugins.merge(other.plugins);
        self.hooks.merge(other.hooks);
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn host_package(mut self, package: impl Into<String>) -> Self {
        self.host_package = package.into();
        self
    }

    pub fn stubs(mut self, stubs: StubConfig) -> Self {
        self.stubs = stubs;
        self
    }

    pub fn plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugins.plugin_dir = Some(dir.into());
        self
    }

    pub fn lazy_provider_hook(mut self, lazy: bool) -> Self {
        self.hooks.lazy_provider_hook = lazy;
        self
    }

    /// Stub provider authority
    pub fn provider_authority(&self) -> String {
        self.stubs.provider_authority(&self.host_package)
    }
}

// ============================================================================
// Plugin Load Config
// ============================================================================

/// 플러그인 로드 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginLoadConfig {
    /// 플러그인 매니페스트 검색 경로
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_dir: Option<PathBuf>,

    /// 시작 시 자동 로드
    #[serde(default = "default_true")]
    pub auto_load: bool,

    /// 오류 시 계속 진행
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

impl Default for PluginLoadConfig {
    fn default() -> Self {
        Self {
            plugin_dir: None,
            auto_load: true,
            continue_on_error: true,
        }
    }
}

impl PluginLoadConfig {
    fn merge(&mut self, other: PluginLoadConfig) {
        if other.plugin_dir.is_some() {
            self.plugin_dir = other.plugin_dir;
        }
        self.auto_load = other.auto_load;
        self.continue_on_error = other.continue_on_error;
    }
}

// ============================================================================
// Hook Settings
// ============================================================================

/// Hook 설치 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSettings {
    /// 이미 설치되어 있으면 시작을 중단해야 하는 dispatcher 식별자 조각
    #[serde(default = "default_incompatible_markers")]
    pub incompatible_markers: Vec<String>,

    /// Provider hook을 첫 접근 시 설치
    #[serde(default = "default_true")]
    pub lazy_provider_hook: bool,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self {
            incompatible_markers: default_incompatible_markers(),
            lazy_provider_hook: true,
        }
    }
}

impl HookSettings {
    fn merge(&mut self, other: HookSettings) {
        for marker in other.incompatible_markers {
            if !self.incompatible_markers.contains(&marker) {
                self.incompatible_markers.push(marker);
            }
        }
        self.lazy_provider_hook = other.lazy_provider_hook;
    }

    /// dispatcher 식별자가 호환되지 않는 hook인지 확인
    pub fn is_incompatible(&self, identity: &str) -> Option<&str> {
        self.incompatible_markers
            .iter()
            .find(|marker| !marker.is_empty() && identity.contains(marker.as_str()))
            .map(|s| s.as_str())
    }
}

fn default_version() -> u32 {
    1
}

fn default_host_package() -> String {
    "com.hostplug.host".to_string()
}

fn default_true() -> bool {
    true
}

fn default_incompatible_markers() -> Vec<String> {
    vec!["lbe".to_string()]
}

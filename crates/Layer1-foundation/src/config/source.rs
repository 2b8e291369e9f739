//! Config Source - 설정 파일 위치와 읽기/쓰기
//!
//! 적용 순서는 글로벌 → 프로젝트이며 뒤의 층이 앞의 값을 덮는다.
//! 파일이 없는 층은 건너뛰지만, 있는데 읽을 수 없으면 어느 층인지 담아 실패한다.

use super::host::{HostConfig, HOST_CONFIG_FILE};
use crate::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// 글로벌 설정 디렉토리 (config_dir 아래)
pub const GLOBAL_CONFIG_DIR: &str = "hostplug";

/// 프로젝트 설정 디렉토리 (프로젝트 루트 아래)
pub const PROJECT_CONFIG_DIR: &str = ".hostplug";

/// 설정 한 층의 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// ~/.config/hostplug/hostplug.json
    Global(PathBuf),
    /// <root>/.hostplug/hostplug.json
    Project(PathBuf),
    /// 명시적으로 지정한 파일
    File(PathBuf),
}

impl ConfigSource {
    /// 플랫폼 config 디렉토리가 없으면 None
    pub fn global() -> Option<Self> {
        dirs::config_dir().map(|dir| {
            Self::Global(dir.join(GLOBAL_CONFIG_DIR).join(HOST_CONFIG_FILE))
        })
    }

    pub fn project(root: impl AsRef<Path>) -> Self {
        Self::Project(root.as_ref().join(PROJECT_CONFIG_DIR).join(HOST_CONFIG_FILE))
    }

    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self::project(cwd))
    }

    /// 글로벌, 현재 프로젝트 순서의 기본 층
    pub fn default_layers() -> Vec<Self> {
        Self::global()
            .into_iter()
            .chain(Self::current_project().ok())
            .collect()
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Global(path) | Self::Project(path) | Self::File(path) => path,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Global(_) => "global",
            Self::Project(_) => "project",
            Self::File(_) => "file",
        }
    }

    /// 층 하나 읽기. 파일이 없으면 None
    ///
    /// 검증은 병합이 끝난 뒤에 한다 (한 층만으로는 불완전할 수 있다).
    pub fn read(&self) -> Result<Option<HostConfig>> {
        let path = self.path();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(source = self.label(), path = %path.display(), "No host config layer");
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "Failed to read {} config {}: {}",
                    self.label(),
                    path.display(),
                    e
                )))
            }
        };

        let config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Malformed {} config {}: {}",
                self.label(),
                path.display(),
                e
            ))
        })?;
        debug!(source = self.label(), path = %path.display(), "Host config layer loaded");
        Ok(Some(config))
    }

    /// 검증을 통과한 설정만 기록한다
    pub fn write(&self, config: &HostConfig) -> Result<()> {
        config.validate()?;

        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write {}: {}", path.display(), e)))?;
        info!(source = self.label(), path = %path.display(), "Host config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_layout() {
        let source = ConfigSource::project("/work/app");
        assert_eq!(
            source.path(),
            Path::new("/work/app/.hostplug/hostplug.json")
        );
        assert_eq!(source.label(), "project");
    }

    #[test]
    fn test_missing_layer_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = ConfigSource::project(dir.path());
        assert!(source.read().unwrap().is_none());
    }

    #[test]
    fn test_malformed_layer_names_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = ConfigSource::project(dir.path());
        std::fs::create_dir_all(dir.path().join(PROJECT_CONFIG_DIR)).unwrap();
        std::fs::write(source.path(), "{ not json").unwrap();

        let err = source.read().unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.starts_with("Malformed project config")));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let source = ConfigSource::project(dir.path());
        let config = HostConfig::default().host_package("com.saved");

        source.write(&config).unwrap();
        let loaded = source.read().unwrap().unwrap();
        assert_eq!(loaded.host_package, "com.saved");
        assert_eq!(loaded.stubs, config.stubs);
    }

    #[test]
    fn test_write_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let source = ConfigSource::File(dir.path().join("bad.json"));
        let config = HostConfig::default().host_package("");

        assert!(source.write(&config).is_err());
        assert!(!source.path().exists());
    }
}

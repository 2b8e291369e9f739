//! Package Loader - 패키지 파일 → PluginDescriptor
//!
//! 매니페스트를 읽고, 이름으로 지정된 진입점/팩토리/바인딩 매퍼를
//! 미리 등록된 구현과 연결한다.

use super::binding::{BindingMapper, StaticBindingMapper};
use super::descriptor::PluginDescriptor;
use super::manifest::{PluginManifest, MANIFEST_FILE};
use super::traits::ApplicationEntry;
use crate::platform::ComponentFactory;
use hostplug_foundation::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// 패키지 로더
pub trait PackageLoader: Send + Sync {
    /// 패키지 파일을 읽어 디스크립터 생성
    ///
    /// 파일이 없거나 잘못된 경우 `Error::InvalidPackage`.
    fn load(&self, path: &Path) -> Result<PluginDescriptor>;
}

// ============================================================================
// ManifestLoader
// ============================================================================

/// JSON 매니페스트 로더
#[derive(Default)]
pub struct ManifestLoader {
    /// 진입점 (이름 -> 구현)
    applications: HashMap<String, Arc<dyn ApplicationEntry>>,

    /// 팩토리 (이름 또는 패키지 -> 구현)
    factories: HashMap<String, Arc<dyn ComponentFactory>>,

    /// 바인딩 매퍼 (패키지 -> 구현)
    binding_mappers: HashMap<String, Arc<dyn BindingMapper>>,

    /// 연결할 팩토리가 없을 때 사용
    default_factory: Option<Arc<dyn ComponentFactory>>,

    /// 알 수 없는 진입점 이름을 무시할지
    lenient: bool,
}

impl ManifestLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 진입점 등록 (매니페스트 application 이름과 매칭)
    pub fn with_application(mut self, entry: Arc<dyn ApplicationEntry>) -> Self {
        self.applications.insert(entry.name().to_string(), entry);
        self
    }

    /// 팩토리 등록 (매니페스트 factory 이름 또는 패키지 이름과 매칭)
    pub fn with_factory(mut self, name: impl Into<String>, factory: Arc<dyn ComponentFactory>) -> Self {
        self.factories.insert(name.into(), factory);
        self
    }

    /// 바인딩 매퍼 등록 (패키지 이름과 매칭)
    pub fn with_binding_mapper(mut self, package: impl Into<String>, mapper: Arc<dyn BindingMapper>) -> Self {
        self.binding_mappers.insert(package.into(), mapper);
        self
    }

    pub fn with_default_factory(mut self, factory: Arc<dyn ComponentFactory>) -> Self {
        self.default_factory = Some(factory);
        self
    }

    /// 알 수 없는 진입점/팩토리 이름을 경고만 하고 건너뛴다
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// 경로가 디렉토리면 내부의 매니페스트 파일
    pub fn manifest_path(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        }
    }

    fn read_manifest(&self, path: &Path) -> Result<PluginManifest> {
        if !path.exists() {
            return Err(Error::invalid_package(path, "file not found"));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::invalid_package(path, format!("unreadable: {}", e)))?;
        PluginManifest::parse(&content)
            .map_err(|e| Error::invalid_package(path, format!("malformed manifest: {}", e)))
    }

    fn link_application(&self, path: &Path, name: &str) -> Result<Option<Arc<dyn ApplicationEntry>>> {
        match self.applications.get(name) {
            Some(entry) => Ok(Some(Arc::clone(entry))),
            None if self.lenient => {
                warn!(entry = name, path = %path.display(), "Unknown application entry, skipped");
                Ok(None)
            }
            None => Err(Error::invalid_package(
                path,
                format!("unknown application entry: {}", name),
            )),
        }
    }

    fn link_factory(&self, path: &Path, manifest: &PluginManifest) -> Result<Option<Arc<dyn ComponentFactory>>> {
        if let Some(name) = &manifest.factory {
            return match self.factories.get(name) {
                Some(factory) => Ok(Some(Arc::clone(factory))),
                None if self.lenient => {
                    warn!(factory = %name, path = %path.display(), "Unknown component factory, using default");
                    Ok(self.default_factory.clone())
                }
                None => Err(Error::invalid_package(
                    path,
                    format!("unknown component factory: {}", name),
                )),
            };
        }
        Ok(self
            .factories
            .get(&manifest.package)
            .cloned()
            .or_else(|| self.default_factory.clone()))
    }
}

impl PackageLoader for ManifestLoader {
    fn load(&self, path: &Path) -> Result<PluginDescriptor> {
        let manifest_path = Self::manifest_path(path);
        let manifest = self.read_manifest(&manifest_path)?;
        debug!(
            package = %manifest.package,
            components = manifest.components.len(),
            path = %manifest_path.display(),
            "Parsed plugin manifest"
        );

        let mut builder = PluginDescriptor::builder(&manifest.package, &manifest_path)
            .version(&manifest.version)
            .components(manifest.components.iter().cloned());

        if let Some(name) = &manifest.application {
            if let Some(entry) = self.link_application(&manifest_path, name)? {
                builder = builder.application(entry);
            }
        }
        if let Some(factory) = self.link_factory(&manifest_path, &manifest)? {
            builder = builder.factory(factory);
        }

        // 코드로 등록된 매퍼가 매니페스트 테이블보다 우선
        if let Some(mapper) = self.binding_mappers.get(&manifest.package) {
            builder = builder.binding_mapper(Arc::clone(mapper));
        } else if !manifest.bindings.is_empty() {
            builder = builder.binding_mapper(Arc::new(StaticBindingMapper::new(
                manifest.bindings.clone(),
            )));
        }

        builder.build()
    }
}

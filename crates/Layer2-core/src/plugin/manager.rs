//! Plugin Manager - 플러그인 라이프사이클 관리
//!
//! 프로세스에 하나씩 만들어 `Arc`로 공유하는 명시적 컨텍스트.
//!
//! 생성 시:
//! 1. 바인딩 매퍼 집계기를 첫 콜백으로 등록
//! 2. host hook 설치 (실패하면 생성 실패)
//!
//! 로드 시: 패키지 파싱 → 레지스트리 등록 → 콜백 통지 → 진입점 호출

use super::binding::{BindingMapper, BindingMapperProxy};
use super::descriptor::PluginDescriptor;
use super::events::PluginCallback;
use super::loader::{ManifestLoader, PackageLoader};
use super::manifest::MANIFEST_FILE;
use super::registry::PluginRegistry;
use crate::component::{ComponentRequest, ResolutionFlags, ResolutionResult};
use crate::platform::{DispatchInterceptor, PlatformAdapter, ProviderAccess};
use crate::resolver::ComponentResolver;
use crate::stub::StubMapper;
use chrono::{DateTime, Utc};
use hostplug_foundation::{Error, HostConfig, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 플러그인 요약 (조회/출력용)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSummary {
    pub package: String,
    pub version: String,
    pub file_path: PathBuf,
    pub components: usize,
    pub loaded_at: DateTime<Utc>,
    pub application_invoked: bool,
}

impl From<&PluginDescriptor> for PluginSummary {
    fn from(plugin: &PluginDescriptor) -> Self {
        Self {
            package: plugin.package_name().to_string(),
            version: plugin.version().to_string(),
            file_path: plugin.file_path().to_path_buf(),
            components: plugin.components().len(),
            loaded_at: plugin.loaded_at(),
            application_invoked: plugin.is_application_invoked(),
        }
    }
}

/// 플러그인 매니저
pub struct PluginManager {
    /// 설정
    config: HostConfig,

    /// host 런타임
    platform: Arc<dyn PlatformAdapter>,

    /// 패키지 로더
    loader: Arc<dyn PackageLoader>,

    /// 플러그인 레지스트리
    registry: Arc<PluginRegistry>,

    /// 컴포넌트 해석기
    resolver: ComponentResolver,

    /// placeholder 매퍼
    stubs: Arc<StubMapper>,

    /// hook 설치기
    interceptor: DispatchInterceptor,

    /// 바인딩 매퍼 집계
    binding_mapper: Arc<BindingMapperProxy>,
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("host_package", &self.config.host_package)
            .field("plugins", &self.registry.len())
            .field("hooked", &self.is_hooked())
            .finish_non_exhaustive()
    }
}

impl PluginManager {
    /// 매니저 생성 후 hook 설치
    pub fn new(
        config: HostConfig,
        platform: Arc<dyn PlatformAdapter>,
        loader: Arc<dyn PackageLoader>,
    ) -> Result<Arc<Self>> {
        Self::builder(platform).config(config).loader(loader).build()
    }

    pub fn builder(platform: Arc<dyn PlatformAdapter>) -> PluginManagerBuilder {
        PluginManagerBuilder::new(platform)
    }

    fn start(&self) -> Result<()> {
        self.registry
            .add_callback(Arc::clone(&self.binding_mapper) as Arc<dyn PluginCallback>);

        if let Err(e) = self.interceptor.install() {
            error!("Hook installation failed: {}", e);
            return Err(e);
        }
        if !self.config.hooks.lazy_provider_hook {
            self.interceptor.provider_access()?;
        }

        info!(
            host = %self.config.host_package,
            stubs = self.stubs.placeholders().len(),
            "Plugin manager ready"
        );
        Ok(())
    }

    // ========================================================================
    // 플러그인 로드
    // ========================================================================

    /// 패키지 파일 로드
    ///
    /// 파일이 없거나 잘못되면 `Error::InvalidPackage`이고 레지스트리는 바뀌지 않는다.
    /// 진입점 실패는 `Error::EntryPoint`이며 플러그인은 등록된 채로 남는다.
    pub fn load_plugin(&self, path: impl AsRef<Path>) -> Result<Arc<PluginDescriptor>> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading plugin");

        let descriptor = self.loader.load(path).map_err(|e| {
            let e = match e {
                Error::InvalidPackage { .. } => e,
                other => Error::invalid_package(path, other.to_string()),
            };
            warn!("Plugin load failed: {}", e);
            e
        })?;

        let descriptor = Arc::new(descriptor);
        self.registry.register(Arc::clone(&descriptor));
        descriptor.invoke_application(self)?;

        Ok(descriptor)
    }

    /// 블로킹 작업 스레드에서 로드
    pub fn load_plugin_in_background(
        self: &Arc<Self>,
        path: impl Into<PathBuf>,
    ) -> JoinHandle<Result<Arc<PluginDescriptor>>> {
        let manager = Arc::clone(self);
        let path = path.into();
        tokio::task::spawn_blocking(move || manager.load_plugin(&path))
    }

    /// 설정된 디렉토리의 패키지를 이름 순으로 로드
    pub fn load_configured_plugins(&self) -> Result<Vec<Arc<PluginDescriptor>>> {
        let settings = &self.config.plugins;
        let Some(dir) = settings.plugin_dir.as_ref().filter(|_| settings.auto_load) else {
            debug!("No plugin directory configured");
            return Ok(Vec::new());
        };

        let mut loaded = Vec::new();
        for path in Self::discover(dir)? {
            match self.load_plugin(&path) {
                Ok(plugin) => loaded.push(plugin),
                Err(e) if settings.continue_on_error => {
                    warn!(path = %path.display(), "Skipping plugin: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(count = loaded.len(), dir = %dir.display(), "Configured plugins loaded");
        Ok(loaded)
    }

    /// `*.json` 파일과 매니페스트를 가진 하위 디렉토리
    fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "plugin directory not found: {}",
                dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                (path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
                    || (path.is_dir() && path.join(MANIFEST_FILE).is_file())
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn lookup(&self, package: &str) -> Option<Arc<PluginDescriptor>> {
        self.registry.lookup(package)
    }

    pub fn lookup_for_request(&self, request: &ComponentRequest) -> Option<Arc<PluginDescriptor>> {
        self.registry.lookup_for_request(request)
    }

    pub fn list_all(&self) -> Vec<Arc<PluginDescriptor>> {
        self.registry.list_all()
    }

    pub fn summaries(&self) -> Vec<PluginSummary> {
        self.list_all()
            .iter()
            .map(|plugin| PluginSummary::from(plugin.as_ref()))
            .collect()
    }

    pub fn resolve_activity(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.resolver.resolve_activity(request, flags)
    }

    pub fn resolve_service(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.resolver.resolve_service(request, flags)
    }

    pub fn resolve_content_provider(
        &self,
        authority: &str,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.resolver.resolve_content_provider(authority, flags)
    }

    pub fn query_intent_activities(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Vec<ResolutionResult> {
        self.resolver.query_intent_activities(request, flags)
    }

    pub fn query_intent_services(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Vec<ResolutionResult> {
        self.resolver.query_intent_services(request, flags)
    }

    pub fn query_broadcast_receivers(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Vec<ResolutionResult> {
        self.resolver.query_broadcast_receivers(request, flags)
    }

    // ========================================================================
    // 콜백
    // ========================================================================

    pub fn add_callback(&self, callback: Arc<dyn PluginCallback>) {
        self.registry.add_callback(callback);
    }

    pub fn subscribe_with_snapshot(
        &self,
        callback: Arc<dyn PluginCallback>,
    ) -> Vec<Arc<PluginDescriptor>> {
        self.registry.subscribe_with_snapshot(callback)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// stub provider 프록시 (첫 호출 시 hook 설치)
    pub fn provider_access(&self) -> Result<Option<Arc<dyn ProviderAccess>>> {
        self.interceptor.provider_access()
    }

    pub fn binding_for(&self, layout: &str) -> Option<String> {
        self.binding_mapper.binding_for(layout)
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn host_package(&self) -> &str {
        &self.config.host_package
    }

    pub fn platform(&self) -> &Arc<dyn PlatformAdapter> {
        &self.platform
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &ComponentResolver {
        &self.resolver
    }

    pub fn stub_mapper(&self) -> &Arc<StubMapper> {
        &self.stubs
    }

    pub fn binding_mapper(&self) -> &Arc<BindingMapperProxy> {
        &self.binding_mapper
    }

    pub fn is_hooked(&self) -> bool {
        self.interceptor.is_installed()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// PluginManager 빌더
pub struct PluginManagerBuilder {
    platform: Arc<dyn PlatformAdapter>,
    config: HostConfig,
    loader: Option<Arc<dyn PackageLoader>>,
    host_binding_mapper: Option<Arc<dyn BindingMapper>>,
}

impl PluginManagerBuilder {
    fn new(platform: Arc<dyn PlatformAdapter>) -> Self {
        Self {
            platform,
            config: HostConfig::default(),
            loader: None,
            host_binding_mapper: None,
        }
    }

    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn loader(mut self, loader: Arc<dyn PackageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn host_binding_mapper(mut self, mapper: Arc<dyn BindingMapper>) -> Self {
        self.host_binding_mapper = Some(mapper);
        self
    }

    /// 매니저 생성 및 hook 설치
    pub fn build(self) -> Result<Arc<PluginManager>> {
        self.config.validate()?;
        if self.platform.host_package() != self.config.host_package {
            warn!(
                platform = self.platform.host_package(),
                config = %self.config.host_package,
                "Host package differs between platform and config"
            );
        }

        let registry = Arc::new(PluginRegistry::new());
        let resolver = ComponentResolver::new(Arc::clone(&registry));
        let stubs = Arc::new(StubMapper::from_config(
            &self.config.host_package,
            &self.config.stubs,
        ));
        let interceptor = DispatchInterceptor::new(
            Arc::clone(&self.platform),
            resolver.clone(),
            Arc::clone(&stubs),
            self.config.hooks.clone(),
            self.config.provider_authority(),
        );

        let manager = Arc::new(PluginManager {
            loader: self
                .loader
                .unwrap_or_else(|| Arc::new(ManifestLoader::new())),
            binding_mapper: Arc::new(BindingMapperProxy::new(self.host_binding_mapper)),
            config: self.config,
            platform: self.platform,
            registry,
            resolver,
            stubs,
            interceptor,
        });
        manager.start()?;
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, ComponentName};
    use crate::platform::SimulatedHost;
    use std::fs;

    fn manager() -> (Arc<SimulatedHost>, Arc<PluginManager>) {
        let config = HostConfig::default().host_package("com.host");
        let host = Arc::new(SimulatedHost::for_config(&config));
        let manager = PluginManager::builder(host.clone())
            .config(config)
            .build()
            .unwrap();
        (host, manager)
    }

    #[test]
    fn test_new_installs_hooks() {
        let (host, manager) = manager();
        assert!(manager.is_hooked());
        assert_eq!(host.dispatcher_identity(), crate::platform::INTERCEPTING_DISPATCHER_ID);
        assert_eq!(manager.registry().callback_count(), 1);
    }

    #[test]
    fn test_debug_summarizes_state() {
        let (_, manager) = manager();
        let debug = format!("{:?}", manager);
        assert!(debug.contains("com.host"));
        assert!(debug.contains("plugins: 0"));
        assert!(debug.contains("hooked: true"));
    }

    #[test]
    fn test_load_missing_file_leaves_registry() {
        let (_, manager) = manager();
        let err = manager.load_plugin("/definitely/missing.json").unwrap_err();
        assert!(matches!(err, Error::InvalidPackage { .. }));
        assert!(manager.list_all().is_empty());
    }

    #[test]
    fn test_load_configured_plugins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), r#"{"package": "com.b"}"#).unwrap();
        fs::write(dir.path().join("a.json"), r#"{"package": "com.a"}"#).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let config = HostConfig::default()
            .host_package("com.host")
            .plugin_dir(dir.path());
        let host = Arc::new(SimulatedHost::for_config(&config));
        let manager = PluginManager::builder(host).config(config).build().unwrap();

        let loaded = manager.load_configured_plugins().unwrap();
        let names: Vec<_> = loaded.iter().map(|p| p.package_name().to_string()).collect();
        assert_eq!(names, vec!["com.a", "com.b"]);
        assert_eq!(manager.summaries().len(), 2);
    }

    #[test]
    fn test_resolve_through_manager() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(
            &path,
            r#"{"package": "com.a", "components": [{"kind": "activity", "className": ".Main"}]}"#,
        )
        .unwrap();

        let (_, manager) = manager();
        manager.load_plugin(&path).unwrap();

        let result = manager
            .resolve_activity(&ComponentRequest::explicit("com.a", ".Main"), ResolutionFlags::NONE)
            .unwrap();
        assert_eq!(result.kind(), ComponentKind::Activity);
        assert_eq!(result.component_name(), ComponentName::new("com.a", "com.a.Main"));
    }
}

//! Plugin Descriptor - 로드된 플러그인 패키지 한 개의 불변 레코드
//!
//! 선언된 컴포넌트, 진입점, 컴포넌트 팩토리를 묶고
//! 패키지 단위 컴포넌트 매칭을 제공한다.

use super::binding::BindingMapper;
use super::manager::PluginManager;
use super::traits::ApplicationEntry;
use crate::component::{
    ComponentDeclaration, ComponentKind, ComponentName, ComponentRequest, ResolutionFlags,
    ResolutionResult, MATCH_EXACT,
};
use crate::platform::{ComponentFactory, HostComponent};
use chrono::{DateTime, Utc};
use hostplug_foundation::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// PluginDescriptor
// ============================================================================

/// 로드된 플러그인
pub struct PluginDescriptor {
    package_name: String,
    version: String,
    file_path: PathBuf,
    components: Vec<ComponentDeclaration>,
    loaded_at: DateTime<Utc>,
    application: Option<Arc<dyn ApplicationEntry>>,
    factory: Option<Arc<dyn ComponentFactory>>,
    binding_mapper: Option<Arc<dyn BindingMapper>>,
    application_invoked: AtomicBool,
}

impl PluginDescriptor {
    pub fn builder(package_name: impl Into<String>, file_path: impl Into<PathBuf>) -> PluginDescriptorBuilder {
        PluginDescriptorBuilder::new(package_name, file_path)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn components(&self) -> &[ComponentDeclaration] {
        &self.components
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn application(&self) -> Option<&Arc<dyn ApplicationEntry>> {
        self.application.as_ref()
    }

    pub fn binding_mapper(&self) -> Option<&Arc<dyn BindingMapper>> {
        self.binding_mapper.as_ref()
    }

    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// 특정 종류의 선언된 컴포넌트
    pub fn components_of(&self, kind: ComponentKind) -> impl Iterator<Item = &ComponentDeclaration> {
        self.components.iter().filter(move |c| c.kind == kind)
    }

    /// 정규화된 클래스 이름으로 선언 조회
    pub fn find_component(&self, kind: ComponentKind, class: &str) -> Option<&ComponentDeclaration> {
        let wanted = ComponentName::qualify(&self.package_name, class);
        self.components_of(kind)
            .find(|c| ComponentName::qualify(&self.package_name, &c.class_name) == wanted)
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// 첫 번째로 매칭되는 activity
    pub fn resolve_activity(
        self: &Arc<Self>,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.query(ComponentKind::Activity, request, flags, true)
            .into_iter()
            .next()
    }

    /// 첫 번째로 매칭되는 service
    pub fn resolve_service(
        self: &Arc<Self>,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.query(ComponentKind::Service, request, flags, true)
            .into_iter()
            .next()
    }

    /// authority로 provider 매칭
    pub fn resolve_content_provider(
        self: &Arc<Self>,
        authority: &str,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.components_of(ComponentKind::Provider)
            .filter(|c| c.is_visible(flags))
            .find(|c| c.matches_authority(authority))
            .map(|c| ResolutionResult::new(self, c, MATCH_EXACT))
    }

    pub fn query_activities(
        self: &Arc<Self>,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Vec<ResolutionResult> {
        self.query(ComponentKind::Activity, request, flags, false)
    }

    pub fn query_services(
        self: &Arc<Self>,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Vec<ResolutionResult> {
        self.query(ComponentKind::Service, request, flags, false)
    }

    pub fn query_receivers(
        self: &Arc<Self>,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Vec<ResolutionResult> {
        self.query(ComponentKind::Receiver, request, flags, false)
    }

    /// 매칭되는 컴포넌트 (선언 순서)
    pub fn query(
        self: &Arc<Self>,
        kind: ComponentKind,
        request: &ComponentRequest,
        flags: ResolutionFlags,
        first_only: bool,
    ) -> Vec<ResolutionResult> {
        let flags = flags | request.flags;

        if let Some(package) = &request.target_package {
            if package != &self.package_name {
                return Vec::new();
            }
        }

        let candidates = self
            .components_of(kind)
            .filter(|c| c.is_visible(flags));

        // 명시적 클래스 지정이 filter 매칭보다 우선
        if let Some(class) = &request.target_class {
            let wanted = ComponentName::qualify(&self.package_name, class);
            return candidates
                .filter(|c| ComponentName::qualify(&self.package_name, &c.class_name) == wanted)
                .take(1)
                .map(|c| ResolutionResult::new(self, c, MATCH_EXACT))
                .collect();
        }

        let action = request.action.as_deref();
        let scheme = request.data_scheme();
        let matches = candidates.filter_map(|c| {
            c.best_filter_score(action, &request.categories, scheme, flags)
                .map(|score| ResolutionResult::new(self, c, score))
        });

        if first_only {
            matches.take(1).collect()
        } else {
            matches.collect()
        }
    }

    // ========================================================================
    // Runtime
    // ========================================================================

    /// 진입점을 최대 한 번 호출
    ///
    /// 호출했으면 true, 진입점이 없거나 이미 호출했으면 false.
    pub fn invoke_application(&self, manager: &PluginManager) -> Result<bool> {
        let Some(application) = &self.application else {
            return Ok(false);
        };
        if self.application_invoked.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }

        info!(
            package = %self.package_name,
            entry = application.name(),
            "Invoking plugin entry point"
        );
        application
            .on_create(manager)
            .map_err(|e| Error::EntryPoint {
                package: self.package_name.clone(),
                message: e.to_string(),
            })?;
        Ok(true)
    }

    pub fn is_application_invoked(&self) -> bool {
        self.application_invoked.load(Ordering::Acquire)
    }

    /// 플러그인 코드로 컴포넌트 인스턴스 생성
    pub fn instantiate(&self, kind: ComponentKind, class: &str) -> Result<Box<dyn HostComponent>> {
        let declared = self.find_component(kind, class).ok_or_else(|| {
            Error::NotFound(format!("{} {} in {}", kind, class, self.package_name))
        })?;
        let factory = self.factory.as_ref().ok_or_else(|| {
            Error::Dispatch(format!(
                "Plugin {} has no component factory",
                self.package_name
            ))
        })?;

        let class = ComponentName::qualify(&self.package_name, &declared.class_name);
        debug!(package = %self.package_name, class = %class, kind = %kind, "Instantiating plugin component");
        factory.instantiate(kind, &class).ok_or_else(|| {
            Error::Dispatch(format!("Factory cannot instantiate {}", class))
        })
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("package_name", &self.package_name)
            .field("version", &self.version)
            .field("file_path", &self.file_path)
            .field("components", &self.components.len())
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// PluginDescriptor 빌더
pub struct PluginDescriptorBuilder {
    package_name: String,
    version: String,
    file_path: PathBuf,
    components: Vec<ComponentDeclaration>,
    application: Option<Arc<dyn ApplicationEntry>>,
    factory: Option<Arc<dyn ComponentFactory>>,
    binding_mapper: Option<Arc<dyn BindingMapper>>,
}

impl PluginDescriptorBuilder {
    fn new(package_name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            package_name: package_name.into(),
            version: "0.0.0".to_string(),
            file_path: file_path.into(),
            components: Vec::new(),
            application: None,
            factory: None,
            binding_mapper: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn component(mut self, component: ComponentDeclaration) -> Self {
        self.components.push(component);
        self
    }

    pub fn components(mut self, components: impl IntoIterator<Item = ComponentDeclaration>) -> Self {
        self.components.extend(components);
        self
    }

    pub fn application(mut self, application: Arc<dyn ApplicationEntry>) -> Self {
        self.application = Some(application);
        self
    }

    pub fn factory(mut self, factory: Arc<dyn ComponentFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn binding_mapper(mut self, mapper: Arc<dyn BindingMapper>) -> Self {
        self.binding_mapper = Some(mapper);
        self
    }

    /// 검증 후 생성
    pub fn build(self) -> Result<PluginDescriptor> {
        let invalid = |reason: String| Error::invalid_package(&self.file_path, reason);

        if self.package_name.trim().is_empty() {
            return Err(invalid("package name is empty".to_string()));
        }
        for component in &self.components {
            if component.class_name.trim().is_empty() {
                return Err(invalid(format!("{} with empty class name", component.kind)));
            }
            if component.kind == ComponentKind::Provider && component.authorities().next().is_none() {
                return Err(invalid(format!(
                    "provider {} declares no authority",
                    component.class_name
                )));
            }
        }

        Ok(PluginDescriptor {
            package_name: self.package_name,
            version: self.version,
            file_path: self.file_path,
            components: self.components,
            loaded_at: Utc::now(),
            application: self.application,
            factory: self.factory,
            binding_mapper: self.binding_mapper,
            application_invoked: AtomicBool::new(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{IntentFilter, CATEGORY_DEFAULT};

    fn sample() -> Arc<PluginDescriptor> {
        Arc::new(
            PluginDescriptor::builder("com.example.a", "/plugins/a.json")
                .component(ComponentDeclaration::activity("MainActivity"))
                .component(
                    ComponentDeclaration::activity(".ShareActivity").with_filter(
                        IntentFilter::new()
                            .action("a.SEND")
                            .category(CATEGORY_DEFAULT),
                    ),
                )
                .component(
                    ComponentDeclaration::activity(".OtherShare")
                        .with_filter(IntentFilter::new().action("a.SEND")),
                )
                .component(ComponentDeclaration::provider(".Data", "com.example.a.data"))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_explicit_match() {
        let plugin = sample();
        let req = ComponentRequest::explicit("com.example.a", "MainActivity");
        let result = plugin.resolve_activity(&req, ResolutionFlags::NONE).unwrap();
        assert_eq!(result.matched_component.class_name, "MainActivity");
        assert_eq!(result.match_score, MATCH_EXACT);

        let req = ComponentRequest::explicit("com.example.b", "MainActivity");
        assert!(plugin.resolve_activity(&req, ResolutionFlags::NONE).is_none());
    }

    #[test]
    fn test_filter_match_declaration_order() {
        let plugin = sample();
        let req = ComponentRequest::implicit("a.SEND");
        let first = plugin.resolve_activity(&req, ResolutionFlags::NONE).unwrap();
        assert_eq!(first.matched_component.class_name, ".ShareActivity");

        let all = plugin.query(ComponentKind::Activity, &req, ResolutionFlags::NONE, false);
        assert_eq!(all.len(), 2);

        let all = plugin.query(ComponentKind::Activity, &req, ResolutionFlags::DEFAULT_ONLY, false);
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_provider_by_authority() {
        let plugin = sample();
        let result = plugin
            .resolve_content_provider("com.example.a.data", ResolutionFlags::NONE)
            .unwrap();
        assert_eq!(
            result.component_name().class,
            "com.example.a.Data"
        );
        assert!(plugin
            .resolve_content_provider("com.example.b.data", ResolutionFlags::NONE)
            .is_none());
    }

    #[test]
    fn test_build_rejects_provider_without_authority() {
        let mut decl = ComponentDeclaration::provider(".Data", "x");
        decl.authority = None;
        let result = PluginDescriptor::builder("com.a", "/a.json")
            .component(decl)
            .build();
        assert!(matches!(result, Err(Error::InvalidPackage { .. })));

        let result = PluginDescriptor::builder("", "/a.json").build();
        assert!(matches!(result, Err(Error::InvalidPackage { .. })));
    }

    #[test]
    fn test_instantiate_without_factory() {
        let plugin = sample();
        let err = plugin
            .instantiate(ComponentKind::Activity, "MainActivity")
            .unwrap_err();
        assert!(matches!(err, Error::Dispatch(_)));

        let err = plugin
            .instantiate(ComponentKind::Activity, "Missing")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}

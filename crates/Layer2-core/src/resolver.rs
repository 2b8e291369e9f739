//! Component Resolver - 요청을 플러그인 컴포넌트로 해석
//!
//! 플러그인을 등록 순서대로 순회한다. 단일 결과 질의는 처음 매칭된
//! 플러그인의 답을 쓰고, 다중 결과 질의는 모든 플러그인 결과를 이어 붙인다.
//! 아무것도 매칭되지 않으면 None / 빈 목록 (host 기본 처리로 넘어간다).

use crate::component::{ComponentKind, ComponentRequest, ResolutionFlags, ResolutionResult};
use crate::plugin::{PluginDescriptor, PluginRegistry};
use std::sync::Arc;
use tracing::trace;

/// 컴포넌트 해석기
#[derive(Clone)]
pub struct ComponentResolver {
    registry: Arc<PluginRegistry>,
}

impl ComponentResolver {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    // ========================================================================
    // Single result
    // ========================================================================

    pub fn resolve_activity(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.first(|plugin| plugin.resolve_activity(request, flags))
    }

    pub fn resolve_service(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.first(|plugin| plugin.resolve_service(request, flags))
    }

    pub fn resolve_content_provider(
        &self,
        authority: &str,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.first(|plugin| plugin.resolve_content_provider(authority, flags))
    }

    /// 종류별 단일 해석
    pub fn resolve(
        &self,
        kind: ComponentKind,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Option<ResolutionResult> {
        self.first(|plugin| plugin.query(kind, request, flags, true).into_iter().next())
    }

    // ========================================================================
    // Multi result
    // ========================================================================

    pub fn query_intent_activities(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Vec<ResolutionResult> {
        self.collect(|plugin| plugin.query_activities(request, flags))
    }

    pub fn query_intent_services(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Vec<ResolutionResult> {
        self.collect(|plugin| plugin.query_services(request, flags))
    }

    pub fn query_broadcast_receivers(
        &self,
        request: &ComponentRequest,
        flags: ResolutionFlags,
    ) -> Vec<ResolutionResult> {
        self.collect(|plugin| plugin.query_receivers(request, flags))
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn first<F>(&self, mut matcher: F) -> Option<ResolutionResult>
    where
        F: FnMut(&Arc<PluginDescriptor>) -> Option<ResolutionResult>,
    {
        for plugin in self.registry.list_all() {
            if let Some(result) = matcher(&plugin) {
                trace!(
                    package = %result.package_name,
                    class = %result.matched_component.class_name,
                    score = result.match_score,
                    "Resolved plugin component"
                );
                return Some(result);
            }
        }
        None
    }

    fn collect<F>(&self, matcher: F) -> Vec<ResolutionResult>
    where
        F: FnMut(&Arc<PluginDescriptor>) -> Vec<ResolutionResult>,
    {
        self.registry.list_all().iter().flat_map(matcher).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentDeclaration, IntentFilter, MATCH_EXACT};

    fn plugin(package: &str, components: Vec<ComponentDeclaration>) -> Arc<PluginDescriptor> {
        Arc::new(
            PluginDescriptor::builder(package, format!("/plugins/{}.json", package))
                .components(components)
                .build()
                .unwrap(),
        )
    }

    fn send_activity(class: &str) -> ComponentDeclaration {
        ComponentDeclaration::activity(class).with_filter(IntentFilter::new().action("a.SEND"))
    }

    fn resolver() -> ComponentResolver {
        let registry = Arc::new(PluginRegistry::new());
        registry.register(plugin(
            "com.a",
            vec![
                ComponentDeclaration::activity("MainActivity"),
                send_activity(".ShareA"),
                ComponentDeclaration::receiver(".BootA")
                    .with_filter(IntentFilter::new().action("a.BOOT")),
            ],
        ));
        registry.register(plugin(
            "com.b",
            vec![
                send_activity(".ShareB"),
                ComponentDeclaration::service(".Sync")
                    .with_filter(IntentFilter::new().action("a.SYNC")),
                ComponentDeclaration::receiver(".BootB")
                    .with_filter(IntentFilter::new().action("a.BOOT")),
                ComponentDeclaration::provider(".Data", "com.b.data"),
            ],
        ));
        ComponentResolver::new(registry)
    }

    #[test]
    fn test_explicit() {
        let resolver = resolver();
        let req = ComponentRequest::explicit("com.a", "MainActivity");
        let result = resolver.resolve_activity(&req, ResolutionFlags::NONE).unwrap();
        assert_eq!(result.package_name, "com.a");
        assert_eq!(result.matched_component.class_name, "MainActivity");
        assert_eq!(result.match_score, MATCH_EXACT);
        assert!(result.plugin().is_some());
    }

    #[test]
    fn test_first_plugin_wins() {
        let resolver = resolver();
        let req = ComponentRequest::implicit("a.SEND");
        let result = resolver.resolve_activity(&req, ResolutionFlags::NONE).unwrap();
        assert_eq!(result.package_name, "com.a");

        let all = resolver.query_intent_activities(&req, ResolutionFlags::NONE);
        let packages: Vec<_> = all.iter().map(|r| r.package_name.as_str()).collect();
        assert_eq!(packages, vec!["com.a", "com.b"]);
    }

    #[test]
    fn test_services_receivers_providers() {
        let resolver = resolver();
        let sync = resolver
            .resolve_service(&ComponentRequest::implicit("a.SYNC"), ResolutionFlags::NONE)
            .unwrap();
        assert_eq!(sync.component_name().class, "com.b.Sync");

        let boot = resolver.query_broadcast_receivers(
            &ComponentRequest::implicit("a.BOOT"),
            ResolutionFlags::NONE,
        );
        assert_eq!(boot.len(), 2);

        assert!(resolver
            .resolve_content_provider("com.b.data", ResolutionFlags::NONE)
            .is_some());
        assert!(resolver
            .query_intent_services(&ComponentRequest::implicit("a.NONE"), ResolutionFlags::NONE)
            .is_empty());
    }

    #[test]
    fn test_no_match_is_none() {
        let resolver = resolver();
        let req = ComponentRequest::explicit("com.host", "com.host.Settings");
        assert!(resolver.resolve_activity(&req, ResolutionFlags::NONE).is_none());
        assert!(resolver
            .resolve(ComponentKind::Activity, &req, ResolutionFlags::NONE)
            .is_none());
    }
}

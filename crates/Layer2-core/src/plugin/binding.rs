//! Binding Mapper - 레이아웃 → 바인딩 클래스 매핑 집계
//!
//! host 매퍼를 먼저 조회하고, 없으면 플러그인 매퍼를 등록 순서대로 조회한다.
//! 플러그인 매퍼는 레지스트리 콜백으로 자동 수집된다.

use super::descriptor::PluginDescriptor;
use super::events::PluginCallback;
use hostplug_foundation::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 레이아웃 이름 → 바인딩 클래스
pub trait BindingMapper: Send + Sync {
    fn binding_for(&self, layout: &str) -> Option<String>;
}

// ============================================================================
// StaticBindingMapper
// ============================================================================

/// 고정 테이블 매퍼 (매니페스트의 bindings 항목)
#[derive(Debug, Clone, Default)]
pub struct StaticBindingMapper {
    bindings: HashMap<String, String>,
}

impl StaticBindingMapper {
    pub fn new(bindings: HashMap<String, String>) -> Self {
        Self { bindings }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl BindingMapper for StaticBindingMapper {
    fn binding_for(&self, layout: &str) -> Option<String> {
        self.bindings.get(layout).cloned()
    }
}

// ============================================================================
// BindingMapperProxy
// ============================================================================

/// host + 플러그인 매퍼 집계
pub struct BindingMapperProxy {
    host: Option<Arc<dyn BindingMapper>>,
    /// (package, mapper) 등록 순서
    plugins: RwLock<Vec<(String, Arc<dyn BindingMapper>)>>,
}

impl BindingMapperProxy {
    pub fn new(host: Option<Arc<dyn BindingMapper>>) -> Self {
        Self {
            host,
            plugins: RwLock::new(Vec::new()),
        }
    }

    /// 플러그인 매퍼 추가
    ///
    /// 같은 패키지가 다시 로드되면 이전 매퍼를 빼고 맨 뒤에 넣는다 (레지스트리 로드 순서와 같다).
    pub fn add_plugin_mapper(&self, package: &str, mapper: Arc<dyn BindingMapper>) {
        let mut plugins = self.plugins.write();
        plugins.retain(|(p, _)| p != package);
        plugins.push((package.to_string(), mapper));
    }

    /// 패키지의 매퍼 제거. 있었으면 true
    pub fn remove_plugin_mapper(&self, package: &str) -> bool {
        let mut plugins = self.plugins.write();
        let before = plugins.len();
        plugins.retain(|(p, _)| p != package);
        plugins.len() != before
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.read().len()
    }
}

impl BindingMapper for BindingMapperProxy {
    fn binding_for(&self, layout: &str) -> Option<String> {
        if let Some(found) = self.host.as_ref().and_then(|h| h.binding_for(layout)) {
            return Some(found);
        }
        let plugins: Vec<_> = self.plugins.read().iter().map(|(_, m)| m.clone()).collect();
        plugins.iter().find_map(|m| m.binding_for(layout))
    }
}

impl PluginCallback for BindingMapperProxy {
    fn name(&self) -> &str {
        "binding_mapper"
    }

    fn on_plugin_added(&self, plugin: &Arc<PluginDescriptor>) -> Result<()> {
        match plugin.binding_mapper() {
            Some(mapper) => {
                debug!(package = plugin.package_name(), "Collected plugin binding mapper");
                self.add_plugin_mapper(plugin.package_name(), Arc::clone(mapper));
            }
            None => {
                if self.remove_plugin_mapper(plugin.package_name()) {
                    debug!(package = plugin.package_name(), "Reloaded plugin dropped its binding mapper");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(pairs: &[(&str, &str)]) -> Arc<dyn BindingMapper> {
        Arc::new(StaticBindingMapper::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn test_host_first_then_plugins() {
        let proxy = BindingMapperProxy::new(Some(mapper(&[("main", "host.MainBinding")])));
        proxy.add_plugin_mapper("com.a", mapper(&[("main", "a.MainBinding"), ("a", "a.ABinding")]));
        proxy.add_plugin_mapper("com.b", mapper(&[("a", "b.ABinding"), ("b", "b.BBinding")]));

        assert_eq!(proxy.binding_for("main").as_deref(), Some("host.MainBinding"));
        assert_eq!(proxy.binding_for("a").as_deref(), Some("a.ABinding"));
        assert_eq!(proxy.binding_for("b").as_deref(), Some("b.BBinding"));
        assert!(proxy.binding_for("none").is_none());
    }

    #[test]
    fn test_collects_from_plugins() {
        let proxy = BindingMapperProxy::new(None);
        let with = Arc::new(
            PluginDescriptor::builder("com.a", "/a.json")
                .binding_mapper(mapper(&[("x", "a.XBinding")]))
                .build()
                .unwrap(),
        );
        let without = Arc::new(PluginDescriptor::builder("com.b", "/b.json").build().unwrap());

        proxy.on_plugin_added(&with).unwrap();
        proxy.on_plugin_added(&without).unwrap();
        proxy.on_plugin_added(&with).unwrap();

        assert_eq!(proxy.plugin_count(), 1);
        assert_eq!(proxy.binding_for("x").as_deref(), Some("a.XBinding"));
    }

    #[test]
    fn test_reload_moves_or_drops_mapper() {
        let proxy = BindingMapperProxy::new(None);
        let a_v1 = Arc::new(
            PluginDescriptor::builder("com.a", "/a1.json")
                .binding_mapper(mapper(&[("shared", "a.SharedBinding")]))
                .build()
                .unwrap(),
        );
        let b = Arc::new(
            PluginDescriptor::builder("com.b", "/b.json")
                .binding_mapper(mapper(&[("shared", "b.SharedBinding")]))
                .build()
                .unwrap(),
        );
        proxy.on_plugin_added(&a_v1).unwrap();
        proxy.on_plugin_added(&b).unwrap();
        assert_eq!(proxy.binding_for("shared").as_deref(), Some("a.SharedBinding"));

        // 다시 로드된 com.a는 com.b 뒤로 간다
        proxy.on_plugin_added(&a_v1).unwrap();
        assert_eq!(proxy.binding_for("shared").as_deref(), Some("b.SharedBinding"));

        // 매퍼 없이 다시 로드되면 빠진다
        let a_v2 = Arc::new(PluginDescriptor::builder("com.a", "/a2.json").build().unwrap());
        proxy.on_plugin_added(&a_v2).unwrap();
        assert_eq!(proxy.plugin_count(), 1);
        assert!(!proxy.remove_plugin_mapper("com.a"));
    }
}

//! Component Model - 컴포넌트 식별자, 선언, 요청, 해석 결과
//!
//! ```text
//! ComponentRequest ──▶ ComponentResolver ──▶ ResolutionResult
//!                            │
//!                   PluginDescriptor.components
//!                   (ComponentDeclaration + IntentFilter)
//! ```

mod filter;
mod name;
mod request;

pub use filter::{
    ComponentDeclaration, IntentFilter, ResolutionFlags, ACTION_MAIN, CATEGORY_DEFAULT,
    MATCH_ADJUSTMENT_NORMAL, MATCH_CATEGORY_EMPTY, MATCH_CATEGORY_SCHEME, MATCH_EXACT,
};
pub use name::{ComponentKind, ComponentName, LaunchMode};
pub use request::{
    ComponentRequest, EXTRA_IS_PLUGIN, EXTRA_TARGET_CLASS, EXTRA_TARGET_PACKAGE,
};

use crate::plugin::PluginDescriptor;
use std::sync::{Arc, Weak};

/// 해석 결과
///
/// 플러그인은 약한 참조로 들고 있으므로 결과가 플러그인 수명을 늘리지 않는다.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    pub matched_plugin: Weak<PluginDescriptor>,
    pub package_name: String,
    pub matched_component: ComponentDeclaration,
    pub match_score: u32,
}

impl ResolutionResult {
    pub fn new(
        plugin: &Arc<PluginDescriptor>,
        component: &ComponentDeclaration,
        match_score: u32,
    ) -> Self {
        Self {
            matched_plugin: Arc::downgrade(plugin),
            package_name: plugin.package_name().to_string(),
            matched_component: component.clone(),
            match_score,
        }
    }

    /// 플러그인이 아직 살아있으면 반환
    pub fn plugin(&self) -> Option<Arc<PluginDescriptor>> {
        self.matched_plugin.upgrade()
    }

    /// 매칭된 컴포넌트의 정규화된 식별자
    pub fn component_name(&self) -> ComponentName {
        self.matched_component.component_name(&self.package_name)
    }

    pub fn kind(&self) -> ComponentKind {
        self.matched_component.kind
    }
}

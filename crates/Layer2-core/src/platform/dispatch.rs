//! Intercepting Dispatcher - activity 실행을 placeholder로 리다이렉트
//!
//! ```text
//! start_activity(req) ─▶ resolve ─▶ acquire_stub ─▶ base.start_activity(redirected)
//! instantiate(placeholder) ─▶ resolve_stub ─▶ plugin factory
//! component_destroyed(placeholder) ─▶ release
//! ```
//!
//! 가로채지 않는 호출은 모두 원래 디스패처로 그대로 넘긴다.

use super::host::{HostComponent, LaunchReceipt, LifecycleDispatcher};
use crate::component::{ComponentKind, ComponentName, ComponentRequest, ResolutionFlags};
use crate::plugin::PluginRegistry;
use crate::resolver::ComponentResolver;
use crate::stub::{StubGroup, StubMapper};
use hostplug_foundation::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 설치 확인용 식별자
pub const INTERCEPTING_DISPATCHER_ID: &str = "hostplug.InterceptingDispatcher";

/// 리다이렉트 데코레이터
pub struct InterceptingDispatcher {
    base: Arc<dyn LifecycleDispatcher>,
    resolver: ComponentResolver,
    stubs: Arc<StubMapper>,
    registry: Arc<PluginRegistry>,
}

impl InterceptingDispatcher {
    pub fn new(
        base: Arc<dyn LifecycleDispatcher>,
        resolver: ComponentResolver,
        stubs: Arc<StubMapper>,
    ) -> Self {
        let registry = Arc::clone(resolver.registry());
        Self {
            base,
            resolver,
            stubs,
            registry,
        }
    }

    /// 원래 디스패처
    pub fn base(&self) -> &Arc<dyn LifecycleDispatcher> {
        &self.base
    }

    /// 플러그인 activity면 (리다이렉트된 요청, 실제 대상, placeholder)
    fn redirect(
        &self,
        request: &ComponentRequest,
    ) -> Result<Option<(ComponentRequest, ComponentName, ComponentName)>> {
        let Some(result) = self.resolver.resolve_activity(request, ResolutionFlags::NONE) else {
            return Ok(None);
        };

        let real = result.component_name();
        let group = StubGroup::Activity(result.matched_component.launch_mode);
        let placeholder = self.stubs.acquire_stub(group, &real)?;
        debug!(real = %real, placeholder = %placeholder, "Redirecting plugin activity");

        Ok(Some((request.redirect_to(&placeholder, &real), real, placeholder)))
    }

    fn instantiate_plugin(
        &self,
        kind: ComponentKind,
        real: &ComponentName,
    ) -> Result<Box<dyn HostComponent>> {
        let plugin = self
            .registry
            .lookup_for_component(real)
            .ok_or_else(|| Error::NotFound(format!("plugin {} is not loaded", real.package)))?;
        plugin.instantiate(kind, &real.class)
    }
}

impl LifecycleDispatcher for InterceptingDispatcher {
    fn identity(&self) -> &str {
        INTERCEPTING_DISPATCHER_ID
    }

    fn start_activity(&self, request: &ComponentRequest) -> Result<LaunchReceipt> {
        let Some((redirected, real, placeholder)) = self.redirect(request)? else {
            return self.base.start_activity(request);
        };

        match self.base.start_activity(&redirected) {
            Ok(_) => {
                info!(real = %real, placeholder = %placeholder, "Plugin activity launched");
                Ok(LaunchReceipt {
                    component: real,
                    placeholder: Some(placeholder),
                })
            }
            Err(e) => {
                warn!(real = %real, "Host rejected redirected launch: {}", e);
                self.stubs.release(&placeholder);
                Err(e)
            }
        }
    }

    fn instantiate(
        &self,
        kind: ComponentKind,
        name: &ComponentName,
        request: &ComponentRequest,
    ) -> Result<Box<dyn HostComponent>> {
        if let Some(real) = self.stubs.resolve_stub(name) {
            return self.instantiate_plugin(kind, &real);
        }

        // 슬롯이 이미 반환된 placeholder는 요청에 기록된 대상으로 복구
        if self.stubs.is_placeholder(name) {
            if let Some(real) = request.redirected_target() {
                debug!(placeholder = %name, real = %real, "Recovered plugin target from request");
                return self.instantiate_plugin(kind, &real);
            }
            return Err(Error::Dispatch(format!(
                "placeholder {} has no plugin target",
                name
            )));
        }

        self.base.instantiate(kind, name, request)
    }

    fn component_destroyed(&self, kind: ComponentKind, name: &ComponentName) {
        // service 슬롯은 component manager 쪽에서 반환한다
        if kind == ComponentKind::Activity && self.stubs.is_placeholder(name) {
            self.stubs.release(name);
        }
        self.base.component_destroyed(kind, name);
    }
}

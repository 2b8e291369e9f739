//! Dispatch Interceptor - host 참조를 데코레이터로 교체
//!
//! 설치 순서:
//! 1. lifecycle dispatcher
//! 2. component manager
//! 3. provider 바인딩 (첫 접근 시, 한 번만)
//!
//! 각 교체 후 살아있는 참조를 다시 읽어 실제로 바뀌었는지 확인한다.
//! 실패는 모두 `Error::HookInstallation` 이며 호출자는 시작을 중단해야 한다.

use super::adapter::PlatformAdapter;
use super::dispatch::{InterceptingDispatcher, INTERCEPTING_DISPATCHER_ID};
use super::host::{ComponentManager, LifecycleDispatcher, ProviderAccess};
use super::provider::{ProviderAccessProxy, PROVIDER_PROXY_ID};
use super::services::{ComponentManagerProxy, COMPONENT_MANAGER_PROXY_ID};
use crate::resolver::ComponentResolver;
use crate::stub::StubMapper;
use hostplug_foundation::{Error, HookSettings, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hook 설치기
pub struct DispatchInterceptor {
    platform: Arc<dyn PlatformAdapter>,
    resolver: ComponentResolver,
    stubs: Arc<StubMapper>,
    settings: HookSettings,
    stub_authority: String,

    /// dispatcher + component manager 설치 완료
    installed: AtomicBool,
    install_lock: Mutex<()>,

    /// 설치된 provider 프록시 (single-flight)
    provider: Mutex<Option<Arc<dyn ProviderAccess>>>,
}

impl DispatchInterceptor {
    pub fn new(
        platform: Arc<dyn PlatformAdapter>,
        resolver: ComponentResolver,
        stubs: Arc<StubMapper>,
        settings: HookSettings,
        stub_authority: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            resolver,
            stubs,
            settings,
            stub_authority: stub_authority.into(),
            installed: AtomicBool::new(false),
            install_lock: Mutex::new(()),
            provider: Mutex::new(None),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    pub fn is_provider_hooked(&self) -> bool {
        self.provider.lock().is_some()
    }

    pub fn stub_authority(&self) -> &str {
        &self.stub_authority
    }

    // ========================================================================
    // Install
    // ========================================================================

    /// dispatcher와 component manager hook 설치 (한 번만)
    pub fn install(&self) -> Result<()> {
        let _guard = self.install_lock.lock();
        if self.is_installed() {
            debug!("Hooks already installed");
            return Ok(());
        }

        self.install_dispatcher()?;
        self.install_component_manager()?;

        self.installed.store(true, Ordering::Release);
        info!(host = self.platform.host_package(), "Host hooks installed");
        Ok(())
    }

    fn install_dispatcher(&self) -> Result<()> {
        let base = self
            .platform
            .dispatcher()
            .map_err(|e| Error::hook(format!("cannot read lifecycle dispatcher: {}", e)))?;
        self.check_replaceable(base.identity(), INTERCEPTING_DISPATCHER_ID)?;

        let proxy: Arc<dyn LifecycleDispatcher> = Arc::new(InterceptingDispatcher::new(
            base,
            self.resolver.clone(),
            Arc::clone(&self.stubs),
        ));
        self.platform
            .replace_dispatcher(proxy)
            .map_err(|e| Error::hook(format!("cannot replace lifecycle dispatcher: {}", e)))?;

        let live = self
            .platform
            .dispatcher()
            .map_err(|e| Error::hook(format!("cannot verify lifecycle dispatcher: {}", e)))?;
        if live.identity() != INTERCEPTING_DISPATCHER_ID {
            return Err(Error::hook(format!(
                "lifecycle dispatcher was not replaced (live: {})",
                live.identity()
            )));
        }
        debug!("Lifecycle dispatcher hooked");
        Ok(())
    }

    fn install_component_manager(&self) -> Result<()> {
        let base = self
            .platform
            .component_manager()
            .map_err(|e| Error::hook(format!("cannot read component manager: {}", e)))?;
        self.check_replaceable(base.identity(), COMPONENT_MANAGER_PROXY_ID)?;

        let proxy: Arc<dyn ComponentManager> = Arc::new(ComponentManagerProxy::new(
            base,
            self.resolver.clone(),
            Arc::clone(&self.stubs),
        ));
        self.platform
            .replace_component_manager(proxy)
            .map_err(|e| Error::hook(format!("cannot replace component manager: {}", e)))?;

        let live = self
            .platform
            .component_manager()
            .map_err(|e| Error::hook(format!("cannot verify component manager: {}", e)))?;
        if live.identity() != COMPONENT_MANAGER_PROXY_ID {
            return Err(Error::hook(format!(
                "component manager was not replaced (live: {})",
                live.identity()
            )));
        }
        debug!("Component manager hooked");
        Ok(())
    }

    /// 호환되지 않는 hook이나 이미 설치된 프록시가 있으면 실패
    fn check_replaceable(&self, identity: &str, own_id: &str) -> Result<()> {
        if let Some(marker) = self.settings.is_incompatible(identity) {
            warn!(identity, marker, "Incompatible host hook detected");
            return Err(Error::hook(format!(
                "incompatible hook already installed: {} (matched '{}')",
                identity, marker
            )));
        }
        if identity == own_id {
            return Err(Error::hook(format!(
                "{} is already installed by another plugin manager",
                own_id
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Provider (lazy)
    // ========================================================================

    /// stub provider 프록시
    ///
    /// 처음 호출될 때 provider를 깨우고 바인딩을 감싼다. 동시에 호출돼도
    /// 설치는 한 번만 일어난다. 바인딩을 얻지 못하면 None.
    pub fn provider_access(&self) -> Result<Option<Arc<dyn ProviderAccess>>> {
        let mut slot = self.provider.lock();
        if let Some(proxy) = slot.as_ref() {
            return Ok(Some(Arc::clone(proxy)));
        }

        self.platform
            .wake_provider(&self.stub_authority)
            .map_err(|e| Error::hook(format!("cannot wake stub provider: {}", e)))?;
        let Some(base) = self
            .platform
            .provider_binding(&self.stub_authority)
            .map_err(|e| Error::hook(format!("cannot read provider binding: {}", e)))?
        else {
            warn!(authority = %self.stub_authority, "Stub provider binding not available");
            return Ok(None);
        };

        if base.identity() == PROVIDER_PROXY_ID {
            return Err(Error::hook("provider binding is already wrapped"));
        }

        let proxy: Arc<dyn ProviderAccess> = Arc::new(ProviderAccessProxy::new(
            base,
            self.resolver.clone(),
            self.stub_authority.clone(),
        ));
        *slot = Some(Arc::clone(&proxy));
        info!(authority = %self.stub_authority, "Stub provider hooked");
        Ok(Some(proxy))
    }
}

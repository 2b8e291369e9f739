//! Simulated Host - 메모리 안에서 동작하는 host 런타임
//!
//! host 매니페스트에 선언된 컴포넌트만 실행할 수 있고, 모든 호출은
//! 현재 살아있는(교체되었을 수 있는) 참조를 통해 흐른다.
//! 테스트와 CLI가 이 구현을 사용한다.

use super::adapter::PlatformAdapter;
use super::host::{
    ComponentManager, ConnectionId, GenericComponent, HostComponent, LaunchReceipt,
    LifecycleDispatcher, ProviderAccess, ProviderCall,
};
use super::provider::PluginUri;
use crate::component::{ComponentKind, ComponentName, ComponentRequest};
use crate::stub::StubMapper;
use hostplug_foundation::{Error, HostConfig, Result};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

pub const NATIVE_DISPATCHER_ID: &str = "host.NativeDispatcher";
pub const NATIVE_COMPONENT_MANAGER_ID: &str = "host.NativeComponentManager";
pub const NATIVE_PROVIDER_ID: &str = "host.NativeProvider";

// ============================================================================
// Host manifest
// ============================================================================

/// host에 선언된 컴포넌트
#[derive(Default)]
struct HostManifest {
    components: RwLock<HashMap<ComponentName, ComponentKind>>,
    authorities: RwLock<HashSet<String>>,
}

impl HostManifest {
    fn declares(&self, kind: ComponentKind, name: &ComponentName) -> bool {
        self.components.read().get(name) == Some(&kind)
    }
}

// ============================================================================
// Native implementations
// ============================================================================

struct NativeDispatcher {
    identity: String,
    manifest: Arc<HostManifest>,
}

impl LifecycleDispatcher for NativeDispatcher {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn start_activity(&self, request: &ComponentRequest) -> Result<LaunchReceipt> {
        let Some(name) = request.component() else {
            return Err(Error::Dispatch(
                "No activity found to handle request".to_string(),
            ));
        };
        if !self.manifest.declares(ComponentKind::Activity, &name) {
            return Err(Error::Dispatch(format!(
                "Unable to find explicit activity {}; is it declared in the host manifest?",
                name
            )));
        }
        trace!(activity = %name, "Native activity start");
        Ok(LaunchReceipt::native(name))
    }

    fn instantiate(
        &self,
        kind: ComponentKind,
        name: &ComponentName,
        _request: &ComponentRequest,
    ) -> Result<Box<dyn HostComponent>> {
        if !self.manifest.declares(kind, name) {
            return Err(Error::Dispatch(format!("Class not found: {}", name.class)));
        }
        Ok(Box::new(GenericComponent::new(kind, name.class.clone())))
    }

    fn component_destroyed(&self, kind: ComponentKind, name: &ComponentName) {
        trace!(kind = %kind, component = %name, "Native component destroyed");
    }
}

/// native component manager와 host가 함께 보는 상태
struct HostState {
    manifest: Arc<HostManifest>,
    dispatcher: RwLock<Arc<dyn LifecycleDispatcher>>,
    services: Mutex<HashMap<ComponentName, Box<dyn HostComponent>>>,
    connections: Mutex<HashMap<ConnectionId, ComponentName>>,
}

impl HostState {
    fn live_dispatcher(&self) -> Arc<dyn LifecycleDispatcher> {
        Arc::clone(&self.dispatcher.read())
    }

    /// service 인스턴스를 만들고 실행 목록에 넣는다
    fn ensure_service(&self, request: &ComponentRequest) -> Result<Option<ComponentName>> {
        let Some(name) = request.component() else {
            return Ok(None);
        };
        if !self.manifest.declares(ComponentKind::Service, &name) {
            return Ok(None);
        }
        if self.services.lock().contains_key(&name) {
            return Ok(Some(name));
        }

        let instance = self
            .live_dispatcher()
            .instantiate(ComponentKind::Service, &name, request)?;
        debug!(service = %name, class = instance.class_name(), "Service created");
        self.services.lock().entry(name.clone()).or_insert(instance);
        Ok(Some(name))
    }
}

struct NativeComponentManager {
    state: Arc<HostState>,
}

impl ComponentManager for NativeComponentManager {
    fn identity(&self) -> &str {
        NATIVE_COMPONENT_MANAGER_ID
    }

    fn start_service(&self, request: &ComponentRequest) -> Result<Option<ComponentName>> {
        self.state.ensure_service(request)
    }

    fn stop_service(&self, request: &ComponentRequest) -> Result<bool> {
        let Some(name) = request.component() else {
            return Ok(false);
        };
        let removed = self.state.services.lock().remove(&name);
        if removed.is_some() {
            self.state
                .live_dispatcher()
                .component_destroyed(ComponentKind::Service, &name);
        }
        Ok(removed.is_some())
    }

    fn bind_service(&self, request: &ComponentRequest, connection: ConnectionId) -> Result<bool> {
        match self.state.ensure_service(request)? {
            Some(name) => {
                self.state.connections.lock().insert(connection, name);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn unbind_service(&self, connection: ConnectionId) -> Result<bool> {
        Ok(self.state.connections.lock().remove(&connection).is_some())
    }
}

/// stub provider - 감싼 URI를 풀어서 기록
struct NativeProvider {
    authority: String,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
}

impl ProviderAccess for NativeProvider {
    fn identity(&self) -> &str {
        NATIVE_PROVIDER_ID
    }

    fn call(&self, call: &ProviderCall) -> Result<Value> {
        self.calls.lock().push(call.clone());
        let response = match PluginUri::unwrap(&call.uri) {
            Some((plugin, uri)) => json!({
                "authority": self.authority,
                "method": call.method,
                "plugin": plugin,
                "uri": uri,
            }),
            None => json!({
                "authority": self.authority,
                "method": call.method,
                "uri": call.uri,
            }),
        };
        Ok(response)
    }
}

// ============================================================================
// SimulatedHost
// ============================================================================

/// 실행 중인 activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub token: u64,
    pub receipt: LaunchReceipt,
    /// 생성된 인스턴스의 클래스
    pub class_name: String,
}

/// 메모리 host 런타임
pub struct SimulatedHost {
    host_package: String,
    state: Arc<HostState>,
    component_manager: RwLock<Arc<dyn ComponentManager>>,
    providers: RwLock<HashMap<String, Arc<dyn ProviderAccess>>>,
    provider_calls: Arc<Mutex<Vec<ProviderCall>>>,
    /// wake_provider 호출 횟수
    provider_wakes: AtomicUsize,
    activities: Mutex<Vec<(ActivityRecord, Box<dyn HostComponent>)>>,
    next_token: AtomicU64,
    /// true면 교체 요청을 조용히 무시 (참조가 고정된 host)
    frozen: AtomicBool,
}

impl SimulatedHost {
    pub fn new(host_package: impl Into<String>) -> Self {
        Self::with_dispatcher_identity(host_package, NATIVE_DISPATCHER_ID)
    }

    /// native 디스패처 식별자를 지정해서 생성
    pub fn with_dispatcher_identity(host_package: impl Into<String>, identity: impl Into<String>) -> Self {
        let manifest = Arc::new(HostManifest::default());
        let dispatcher: Arc<dyn LifecycleDispatcher> = Arc::new(NativeDispatcher {
            identity: identity.into(),
            manifest: Arc::clone(&manifest),
        });
        let state = Arc::new(HostState {
            manifest,
            dispatcher: RwLock::new(dispatcher),
            services: Mutex::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
        });
        let component_manager: Arc<dyn ComponentManager> = Arc::new(NativeComponentManager {
            state: Arc::clone(&state),
        });

        Self {
            host_package: host_package.into(),
            state,
            component_manager: RwLock::new(component_manager),
            providers: RwLock::new(HashMap::new()),
            provider_calls: Arc::new(Mutex::new(Vec::new())),
            provider_wakes: AtomicUsize::new(0),
            activities: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
            frozen: AtomicBool::new(false),
        }
    }

    /// 설정의 placeholder와 stub provider를 모두 선언한 host
    pub fn for_config(config: &HostConfig) -> Self {
        let host = Self::new(&config.host_package);
        host.declare_stubs(&StubMapper::from_config(&config.host_package, &config.stubs));
        host.declare_provider(config.provider_authority());
        host
    }

    // ========================================================================
    // Manifest
    // ========================================================================

    /// host 컴포넌트 선언
    pub fn declare(&self, kind: ComponentKind, class: impl AsRef<str>) -> ComponentName {
        let name = ComponentName::new(self.host_package.as_str(), class);
        self.state
            .manifest
            .components
            .write()
            .insert(name.clone(), kind);
        name
    }

    pub fn declare_stubs(&self, stubs: &StubMapper) {
        let mut components = self.state.manifest.components.write();
        for (group, name) in stubs.placeholders() {
            components.insert(name, group.kind());
        }
    }

    pub fn declare_provider(&self, authority: impl Into<String>) {
        self.state.manifest.authorities.write().insert(authority.into());
    }

    /// 이후 참조 교체를 무시
    pub fn freeze_references(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    // ========================================================================
    // Host operations
    // ========================================================================

    /// activity 실행 후 인스턴스 생성
    pub fn start_activity(&self, request: &ComponentRequest) -> Result<ActivityRecord> {
        let dispatcher = self.state.live_dispatcher();
        let receipt = dispatcher.start_activity(request)?;
        let host_name = receipt.host_component().clone();

        let instance = match dispatcher.instantiate(ComponentKind::Activity, &host_name, request) {
            Ok(instance) => instance,
            Err(e) => {
                dispatcher.component_destroyed(ComponentKind::Activity, &host_name);
                return Err(e);
            }
        };

        let record = ActivityRecord {
            token: self.next_token.fetch_add(1, Ordering::SeqCst),
            receipt,
            class_name: instance.class_name().to_string(),
        };
        debug!(token = record.token, class = %record.class_name, "Activity running");
        self.activities.lock().push((record.clone(), instance));
        Ok(record)
    }

    /// activity 파괴
    pub fn destroy_activity(&self, token: u64) -> Result<()> {
        let record = {
            let mut activities = self.activities.lock();
            let position = activities
                .iter()
                .position(|(record, _)| record.token == token)
                .ok_or_else(|| Error::NotFound(format!("activity token {}", token)))?;
            activities.remove(position).0
        };
        self.state
            .live_dispatcher()
            .component_destroyed(ComponentKind::Activity, record.receipt.host_component());
        Ok(())
    }

    pub fn start_service(&self, request: &ComponentRequest) -> Result<Option<ComponentName>> {
        self.live_component_manager().start_service(request)
    }

    pub fn stop_service(&self, request: &ComponentRequest) -> Result<bool> {
        self.live_component_manager().stop_service(request)
    }

    pub fn bind_service(&self, request: &ComponentRequest, connection: ConnectionId) -> Result<bool> {
        self.live_component_manager().bind_service(request, connection)
    }

    pub fn unbind_service(&self, connection: ConnectionId) -> Result<bool> {
        self.live_component_manager().unbind_service(connection)
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn running_activities(&self) -> Vec<ActivityRecord> {
        self.activities
            .lock()
            .iter()
            .map(|(record, _)| record.clone())
            .collect()
    }

    /// 실행 중인 service 인스턴스 클래스 (정렬)
    pub fn running_services(&self) -> Vec<String> {
        let mut classes: Vec<_> = self
            .state
            .services
            .lock()
            .values()
            .map(|instance| instance.class_name().to_string())
            .collect();
        classes.sort();
        classes
    }

    pub fn provider_calls(&self) -> Vec<ProviderCall> {
        self.provider_calls.lock().clone()
    }

    pub fn provider_wakes(&self) -> usize {
        self.provider_wakes.load(Ordering::Acquire)
    }

    pub fn dispatcher_identity(&self) -> String {
        self.state.live_dispatcher().identity().to_string()
    }

    pub fn component_manager_identity(&self) -> String {
        self.live_component_manager().identity().to_string()
    }

    fn live_component_manager(&self) -> Arc<dyn ComponentManager> {
        Arc::clone(&self.component_manager.read())
    }
}

impl PlatformAdapter for SimulatedHost {
    fn host_package(&self) -> &str {
        &self.host_package
    }

    fn dispatcher(&self) -> Result<Arc<dyn LifecycleDispatcher>> {
        Ok(self.state.live_dispatcher())
    }

    fn replace_dispatcher(&self, dispatcher: Arc<dyn LifecycleDispatcher>) -> Result<()> {
        if !self.frozen.load(Ordering::Acquire) {
            *self.state.dispatcher.write() = dispatcher;
        }
        Ok(())
    }

    fn component_manager(&self) -> Result<Arc<dyn ComponentManager>> {
        Ok(self.live_component_manager())
    }

    fn replace_component_manager(&self, manager: Arc<dyn ComponentManager>) -> Result<()> {
        if !self.frozen.load(Ordering::Acquire) {
            *self.component_manager.write() = manager;
        }
        Ok(())
    }

    fn wake_provider(&self, authority: &str) -> Result<()> {
        if !self.state.manifest.authorities.read().contains(authority) {
            return Err(Error::NotFound(format!("provider authority {}", authority)));
        }
        self.provider_wakes.fetch_add(1, Ordering::AcqRel);
        let mut providers = self.providers.write();
        providers.entry(authority.to_string()).or_insert_with(|| {
            debug!(authority, "Provider woken");
            Arc::new(NativeProvider {
                authority: authority.to_string(),
                calls: Arc::clone(&self.provider_calls),
            })
        });
        Ok(())
    }

    fn provider_binding(&self, authority: &str) -> Result<Option<Arc<dyn ProviderAccess>>> {
        Ok(self.providers.read().get(authority).cloned())
    }
}

//! 리다이렉트/Hook 통합 테스트
//!
//! 시뮬레이션 host 위에서 플러그인 activity, service, provider 호출이
//! placeholder를 거쳐 플러그인 코드로 도달하는지 확인
//!
//! `cargo test -p hostplug-core --test redirect_test`

use hostplug_core::platform::{INTERCEPTING_DISPATCHER_ID, COMPONENT_MANAGER_PROXY_ID};
use hostplug_core::{
    ComponentKind, ComponentName, ComponentRequest, Error, GenericFactory, HostConfig,
    ManifestLoader, PlatformAdapter, PluginManager, ProviderCall, SimulatedHost,
};
use hostplug_foundation::{ActivitySlots, StubConfig};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const PLUGIN_MANIFEST: &str = r#"{
    "package": "com.a",
    "components": [
        {"kind": "activity", "className": ".Main"},
        {"kind": "activity", "className": ".Top", "launchMode": "singleTop"},
        {"kind": "service", "className": ".Worker"},
        {"kind": "service", "className": ".Uploader"},
        {"kind": "provider", "className": ".Data", "authority": "com.a.data"}
    ]
}"#;

fn small_config() -> HostConfig {
    HostConfig::default().host_package("com.host").stubs(StubConfig {
        activities: ActivitySlots {
            standard: 2,
            single_top: 1,
            single_task: 1,
            single_instance: 1,
        },
        services: 1,
        ..Default::default()
    })
}

fn loader() -> Arc<ManifestLoader> {
    Arc::new(ManifestLoader::new().with_factory("com.a", Arc::new(GenericFactory)))
}

/// host + 매니저 + 로드된 플러그인
struct Fixture {
    _dir: TempDir,
    host: Arc<SimulatedHost>,
    manager: Arc<PluginManager>,
}

fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.json");
    fs::write(&path, PLUGIN_MANIFEST).unwrap();

    let config = small_config();
    let host = Arc::new(SimulatedHost::for_config(&config));
    host.declare(ComponentKind::Activity, ".Settings");

    let manager = PluginManager::new(config, host.clone(), loader()).expect("manager");
    manager.load_plugin(&path).unwrap();

    Fixture {
        _dir: dir,
        host,
        manager,
    }
}

fn in_use(manager: &PluginManager, pool: &str) -> usize {
    manager
        .stub_mapper()
        .stats()
        .into_iter()
        .find(|s| s.name == pool)
        .map(|s| s.in_use)
        .unwrap_or_default()
}

// ============================================================================
// Activity
// ============================================================================

#[test]
fn test_hooks_installed() {
    let f = setup();
    assert!(f.manager.is_hooked());
    assert_eq!(f.host.dispatcher_identity(), INTERCEPTING_DISPATCHER_ID);
    assert_eq!(f.host.component_manager_identity(), COMPONENT_MANAGER_PROXY_ID);
}

#[test]
fn test_plugin_activity_launch_cycle() {
    let f = setup();
    let real = ComponentName::new("com.a", ".Main");

    let record = f
        .host
        .start_activity(&ComponentRequest::explicit("com.a", ".Main"))
        .unwrap();

    // host는 placeholder를 실행했지만 인스턴스는 플러그인 클래스
    let placeholder = record.receipt.placeholder.clone().expect("placeholder");
    assert_eq!(record.receipt.component, real);
    assert_eq!(record.class_name, "com.a.Main");
    assert_eq!(placeholder.package, "com.host");
    assert_eq!(
        f.manager.stub_mapper().resolve_stub(&placeholder),
        Some(real.clone())
    );

    f.host.destroy_activity(record.token).unwrap();
    assert!(f.manager.stub_mapper().resolve_stub(&placeholder).is_none());
    assert_eq!(in_use(&f.manager, "activity.Standard"), 0);
}

#[test]
fn test_launch_mode_selects_pool() {
    let f = setup();
    f.host
        .start_activity(&ComponentRequest::explicit("com.a", ".Top"))
        .unwrap();
    assert_eq!(in_use(&f.manager, "activity.SingleTop"), 1);
    assert_eq!(in_use(&f.manager, "activity.Standard"), 0);
}

#[test]
fn test_capacity_exhaustion_and_recovery() {
    let f = setup();
    let request = ComponentRequest::explicit("com.a", ".Main");

    let first = f.host.start_activity(&request).unwrap();
    let second = f.host.start_activity(&request).unwrap();
    assert_ne!(first.receipt.placeholder, second.receipt.placeholder);

    let err = f.host.start_activity(&request).unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded { capacity: 2, .. }));
    assert!(err.is_retryable());
    assert_eq!(f.host.running_activities().len(), 2);

    f.host.destroy_activity(first.token).unwrap();
    assert!(f.host.start_activity(&request).is_ok());
}

#[test]
fn test_host_activity_passes_through() {
    let f = setup();
    let record = f
        .host
        .start_activity(&ComponentRequest::explicit("com.host", ".Settings"))
        .unwrap();
    assert!(record.receipt.placeholder.is_none());
    assert_eq!(record.class_name, "com.host.Settings");

    // host에도 플러그인에도 없는 컴포넌트는 host 오류 그대로
    let err = f
        .host
        .start_activity(&ComponentRequest::explicit("com.host", ".Missing"))
        .unwrap_err();
    assert!(matches!(err, Error::Dispatch(_)));
    assert_eq!(in_use(&f.manager, "activity.Standard"), 0);
}

// ============================================================================
// Service
// ============================================================================

#[test]
fn test_plugin_service_reuses_placeholder() {
    let f = setup();
    let worker = ComponentRequest::explicit("com.a", ".Worker");

    let started = f.host.start_service(&worker).unwrap();
    assert_eq!(started, Some(ComponentName::new("com.a", ".Worker")));
    assert_eq!(f.host.running_services(), vec!["com.a.Worker"]);

    // 같은 service 재시작은 슬롯을 추가로 쓰지 않는다
    assert!(f.host.start_service(&worker).unwrap().is_some());
    assert!(f.host.bind_service(&worker, 1).unwrap());
    assert_eq!(in_use(&f.manager, "service"), 1);

    // 풀이 가득 찬 상태에서 다른 service는 실패
    let uploader = ComponentRequest::explicit("com.a", ".Uploader");
    assert!(matches!(
        f.host.start_service(&uploader),
        Err(Error::CapacityExceeded { .. })
    ));

    assert!(f.host.stop_service(&worker).unwrap());
    assert_eq!(in_use(&f.manager, "service"), 0);
    assert!(f.host.running_services().is_empty());
    assert!(!f.host.stop_service(&worker).unwrap());

    assert!(f.host.start_service(&uploader).unwrap().is_some());
    assert_eq!(f.host.running_services(), vec!["com.a.Uploader"]);
}

#[test]
fn test_unbound_service_returns_its_slot() {
    let f = setup();
    let worker = ComponentRequest::explicit("com.a", ".Worker");
    let uploader = ComponentRequest::explicit("com.a", ".Uploader");

    // bind만으로 시작된 service는 마지막 unbind에서 내려간다
    assert!(f.host.bind_service(&worker, 1).unwrap());
    assert_eq!(in_use(&f.manager, "service"), 1);
    assert!(f.host.unbind_service(1).unwrap());
    assert_eq!(in_use(&f.manager, "service"), 0);
    assert!(f.host.running_services().is_empty());

    assert!(f.host.bind_service(&uploader, 2).unwrap());
    assert_eq!(f.host.running_services(), vec!["com.a.Uploader"]);

    // 알 수 없는 연결은 host 결과 그대로
    assert!(!f.host.unbind_service(99).unwrap());
    assert_eq!(in_use(&f.manager, "service"), 1);
}

#[test]
fn test_service_outlives_connections_until_last_unbind() {
    let f = setup();
    let worker = ComponentRequest::explicit("com.a", ".Worker");

    assert!(f.host.bind_service(&worker, 1).unwrap());
    assert!(f.host.bind_service(&worker, 2).unwrap());
    assert_eq!(in_use(&f.manager, "service"), 1);

    f.host.unbind_service(1).unwrap();
    assert_eq!(f.host.running_services(), vec!["com.a.Worker"]);
    f.host.unbind_service(2).unwrap();
    assert!(f.host.running_services().is_empty());
    assert_eq!(in_use(&f.manager, "service"), 0);
}

#[test]
fn test_started_service_survives_unbind() {
    let f = setup();
    let worker = ComponentRequest::explicit("com.a", ".Worker");

    f.host.start_service(&worker).unwrap();
    assert!(f.host.bind_service(&worker, 1).unwrap());
    f.host.unbind_service(1).unwrap();

    // 명시적으로 시작된 service는 stop까지 유지
    assert_eq!(f.host.running_services(), vec!["com.a.Worker"]);
    assert_eq!(in_use(&f.manager, "service"), 1);
    assert!(f.host.stop_service(&worker).unwrap());
    assert_eq!(in_use(&f.manager, "service"), 0);
}

// ============================================================================
// Provider
// ============================================================================

#[test]
fn test_provider_calls_are_wrapped() {
    let f = setup();
    assert!(f.host.provider_calls().is_empty());

    let provider = f.manager.provider_access().unwrap().expect("provider");
    let again = f.manager.provider_access().unwrap().expect("provider");
    assert!(Arc::ptr_eq(&provider, &again));

    let original = "content://com.a.data/items?id=3";
    let response = provider.call(&ProviderCall::query(original)).unwrap();
    assert_eq!(response["plugin"], "com.a");
    assert_eq!(response["uri"], original);

    let stub_authority = f.manager.config().provider_authority();
    let calls = f.host.provider_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0]
        .uri
        .starts_with(&format!("content://{}/", stub_authority)));

    // 플러그인 authority가 아니면 그대로
    let plain = "content://com.other.data/rows";
    let response = provider.call(&ProviderCall::delete(plain)).unwrap();
    assert_eq!(response["uri"], plain);
    assert_eq!(f.host.provider_calls()[1].uri, plain);
}

#[test]
fn test_eager_provider_hook() {
    let config = small_config().lazy_provider_hook(false);
    let host = Arc::new(SimulatedHost::for_config(&config));
    let manager = PluginManager::new(config, host.clone(), loader()).unwrap();

    let authority = manager.config().provider_authority();
    assert!(host.provider_binding(&authority).unwrap().is_some());
    assert!(manager.provider_access().unwrap().is_some());
}

// ============================================================================
// Hook failures
// ============================================================================

#[test]
fn test_incompatible_hook_is_fatal() {
    let config = small_config();
    let host = Arc::new(SimulatedHost::with_dispatcher_identity(
        "com.host",
        "com.lbe.security.DispatcherHook",
    ));
    let err = PluginManager::new(config, host, loader()).unwrap_err();
    assert!(matches!(err, Error::HookInstallation(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_frozen_host_fails_verification() {
    let config = small_config();
    let host = Arc::new(SimulatedHost::for_config(&config));
    host.freeze_references();

    let err = PluginManager::new(config, host, loader()).unwrap_err();
    assert!(matches!(err, Error::HookInstallation(ref m) if m.contains("not replaced")));
}

#[test]
fn test_second_manager_on_same_host_fails() {
    let config = small_config();
    let host = Arc::new(SimulatedHost::for_config(&config));
    let _first = PluginManager::new(config.clone(), host.clone(), loader()).unwrap();

    let err = PluginManager::new(config, host.clone(), loader()).unwrap_err();
    assert!(matches!(err, Error::HookInstallation(_)));
    assert_eq!(host.dispatcher_identity(), INTERCEPTING_DISPATCHER_ID);
}

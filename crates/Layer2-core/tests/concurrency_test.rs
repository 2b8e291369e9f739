//! 동시성 통합 테스트
//!
//! 여러 스레드가 동시에 로드, provider 접근, service 시작/바인드를 할 때
//! 레지스트리와 placeholder 풀이 일관되게 남는지 확인
//!
//! `cargo test -p hostplug-core --test concurrency_test`

use hostplug_core::{
    ComponentRequest, GenericFactory, HostConfig, ManifestLoader, PluginManager, SimulatedHost,
};
use hostplug_foundation::{ActivitySlots, StubConfig};
use std::collections::HashSet;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 16;

const SERVICE_MANIFEST: &str = r#"{
    "package": "com.a",
    "components": [
        {"kind": "service", "className": ".Worker"},
        {"kind": "service", "className": ".Uploader"},
        {"kind": "provider", "className": ".Data", "authority": "com.a.data"}
    ]
}"#;

fn config() -> HostConfig {
    HostConfig::default().host_package("com.host").stubs(StubConfig {
        activities: ActivitySlots {
            standard: 1,
            single_top: 1,
            single_task: 1,
            single_instance: 1,
        },
        services: 4,
        ..Default::default()
    })
}

fn setup() -> (TempDir, Arc<SimulatedHost>, Arc<PluginManager>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.json");
    fs::write(&path, SERVICE_MANIFEST).unwrap();

    let config = config();
    let host = Arc::new(SimulatedHost::for_config(&config));
    let loader = ManifestLoader::new().with_factory("com.a", Arc::new(GenericFactory));
    let manager = PluginManager::new(config, host.clone(), Arc::new(loader)).expect("manager");
    manager.load_plugin(&path).unwrap();
    (dir, host, manager)
}

fn services_in_use(manager: &PluginManager) -> usize {
    manager
        .stub_mapper()
        .stats()
        .into_iter()
        .find(|s| s.name == "service")
        .map(|s| s.in_use)
        .unwrap_or_default()
}

/// 모든 스레드가 동시에 `work`를 시작하도록 맞춘다
fn run_together<T, F>(work: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let work = Arc::new(work);
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let barrier = barrier.clone();
            let work = work.clone();
            thread::spawn(move || {
                barrier.wait();
                work(i)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().expect("thread")).collect()
}

#[test]
fn test_concurrent_loads_get_distinct_orders() {
    let dir = TempDir::new().unwrap();
    let config = HostConfig::default().host_package("com.host");
    let host = Arc::new(SimulatedHost::for_config(&config));
    let manager = PluginManager::new(config, host, Arc::new(ManifestLoader::new())).unwrap();

    let paths: Vec<_> = (0..THREADS)
        .map(|i| {
            let path = dir.path().join(format!("p{}.json", i));
            fs::write(&path, format!(r#"{{"package": "com.p{}"}}"#, i)).unwrap();
            path
        })
        .collect();

    let m = manager.clone();
    let results = run_together(move |i| m.load_plugin(&paths[i]).is_ok());
    assert!(results.into_iter().all(|ok| ok));

    let all = manager.list_all();
    assert_eq!(all.len(), THREADS);
    let orders: HashSet<_> = all
        .iter()
        .map(|p| manager.registry().load_order(p.package_name()).expect("order"))
        .collect();
    assert_eq!(orders.len(), THREADS);

    // list_all은 로드 순서대로
    let listed: Vec<_> = all
        .iter()
        .filter_map(|p| manager.registry().load_order(p.package_name()))
        .collect();
    assert!(listed.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_concurrent_provider_access_hooks_once() {
    let (_dir, host, manager) = setup();
    assert_eq!(host.provider_wakes(), 0);

    let m = manager.clone();
    let proxies = run_together(move |_| m.provider_access().unwrap().expect("provider"));

    assert_eq!(host.provider_wakes(), 1);
    let first = &proxies[0];
    assert!(proxies.iter().all(|p| Arc::ptr_eq(p, first)));
}

#[test]
fn test_concurrent_start_uses_one_placeholder() {
    let (_dir, host, manager) = setup();

    let h = host.clone();
    let started = run_together(move |_| {
        h.start_service(&ComponentRequest::explicit("com.a", ".Worker"))
            .unwrap()
            .is_some()
    });
    assert!(started.into_iter().all(|ok| ok));
    assert_eq!(services_in_use(&manager), 1);
    assert_eq!(host.running_services(), vec!["com.a.Worker"]);

    assert!(host
        .stop_service(&ComponentRequest::explicit("com.a", ".Worker"))
        .unwrap());
    assert_eq!(services_in_use(&manager), 0);
}

#[test]
fn test_concurrent_bind_unbind_leaves_pool_empty() {
    let (_dir, host, manager) = setup();

    let h = host.clone();
    run_together(move |i| {
        let class = if i % 2 == 0 { ".Worker" } else { ".Uploader" };
        let request = ComponentRequest::explicit("com.a", class);
        let connection = i as u64 + 1;
        for _ in 0..50 {
            assert!(h.bind_service(&request, connection).unwrap());
            assert!(h.unbind_service(connection).unwrap());
        }
    });

    assert_eq!(services_in_use(&manager), 0);
    assert!(host.running_services().is_empty());
}

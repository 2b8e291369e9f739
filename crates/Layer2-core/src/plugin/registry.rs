//! Plugin Registry - 플러그인 저장소
//!
//! 패키지 이름 → 플러그인. 조회와 순회는 등록 순서를 따른다.
//! 같은 이름이 다시 등록되면 마지막 등록이 이기고 새 로드 순서를 받는다.

use super::descriptor::PluginDescriptor;
use super::events::{NotifyReport, PluginCallback, PluginLifecycleNotifier};
use crate::component::{ComponentName, ComponentRequest};
use parking_lot::{ReentrantMutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 등록된 플러그인 정보
struct PluginEntry {
    /// 플러그인
    descriptor: Arc<PluginDescriptor>,

    /// 로드 순서
    load_order: u64,
}

/// 플러그인 레지스트리
pub struct PluginRegistry {
    /// 플러그인 저장소 (package -> PluginEntry)
    plugins: RwLock<HashMap<String, PluginEntry>>,

    /// 로드 카운터
    load_counter: AtomicU64,

    /// 등록 통지
    notifier: PluginLifecycleNotifier,

    /// "추가 + 통지"와 "구독 + 스냅샷"을 서로 직렬화
    add_lock: ReentrantMutex<()>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    /// 새 레지스트리 생성
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
            load_counter: AtomicU64::new(0),
            notifier: PluginLifecycleNotifier::new(),
            add_lock: ReentrantMutex::new(()),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// 플러그인 등록 후 콜백 통지
    ///
    /// 같은 패키지가 이미 있으면 교체하고 이전 플러그인을 반환한다.
    /// 통지는 쓰기 잠금을 푼 뒤 진행하므로 콜백에서 레지스트리를 조회할 수 있다.
    pub fn register(&self, descriptor: Arc<PluginDescriptor>) -> Option<Arc<PluginDescriptor>> {
        let _guard = self.add_lock.lock();
        let package = descriptor.package_name().to_string();

        let replaced = {
            let mut plugins = self.plugins.write();
            let load_order = self.load_counter.fetch_add(1, Ordering::SeqCst) + 1;
            plugins
                .insert(
                    package.clone(),
                    PluginEntry {
                        descriptor: Arc::clone(&descriptor),
                        load_order,
                    },
                )
                .map(|entry| entry.descriptor)
        };

        if replaced.is_some() {
            warn!(package = %package, "Plugin re-registered, previous descriptor replaced");
        } else {
            info!(
                package = %package,
                version = descriptor.version(),
                components = descriptor.components().len(),
                "Registered plugin"
            );
        }

        let NotifyReport { delivered, failed } = self.notifier.notify_added(&descriptor);
        debug!(package = %package, delivered, failed, "Plugin added notification done");

        replaced
    }

    /// 콜백 추가 (이후 등록부터 통지)
    pub fn add_callback(&self, callback: Arc<dyn PluginCallback>) {
        self.notifier.add(callback);
    }

    /// 콜백을 추가하고 그 시점까지 등록된 플러그인 스냅샷 반환
    ///
    /// 스냅샷과 이후 통지 사이에 누락이나 중복이 없다.
    pub fn subscribe_with_snapshot(
        &self,
        callback: Arc<dyn PluginCallback>,
    ) -> Vec<Arc<PluginDescriptor>> {
        let _guard = self.add_lock.lock();
        self.notifier.add(callback);
        self.list_all()
    }

    pub fn callback_count(&self) -> usize {
        self.notifier.len()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// 패키지 이름으로 조회
    pub fn lookup(&self, package: &str) -> Option<Arc<PluginDescriptor>> {
        let plugins = self.plugins.read();
        plugins.get(package).map(|entry| Arc::clone(&entry.descriptor))
    }

    /// 컴포넌트 식별자의 패키지로 조회
    pub fn lookup_for_component(&self, component: &ComponentName) -> Option<Arc<PluginDescriptor>> {
        self.lookup(&component.package)
    }

    /// 요청의 대상 패키지로 조회
    pub fn lookup_for_request(&self, request: &ComponentRequest) -> Option<Arc<PluginDescriptor>> {
        request
            .target_package
            .as_deref()
            .and_then(|package| self.lookup(package))
    }

    /// 등록 순서대로 전체 목록
    pub fn list_all(&self) -> Vec<Arc<PluginDescriptor>> {
        let plugins = self.plugins.read();
        let mut entries: Vec<_> = plugins.values().collect();
        entries.sort_by_key(|entry| entry.load_order);
        entries
            .into_iter()
            .map(|entry| Arc::clone(&entry.descriptor))
            .collect()
    }

    /// 로드 순서 조회
    pub fn load_order(&self, package: &str) -> Option<u64> {
        self.plugins.read().get(package).map(|entry| entry.load_order)
    }

    pub fn contains(&self, package: &str) -> bool {
        self.plugins.read().contains_key(package)
    }

    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }
}

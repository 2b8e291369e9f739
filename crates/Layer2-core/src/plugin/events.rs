//! Plugin Events - 플러그인 등록 통지
//!
//! 등록 순서대로 콜백을 호출한다. 한 콜백의 실패나 panic은
//! 로그로 남기고 나머지 콜백 전달을 막지 않는다.

use super::descriptor::PluginDescriptor;
use hostplug_foundation::Result;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// PluginCallback - 통지 콜백 트레이트
// ============================================================================

/// 플러그인 등록 콜백
pub trait PluginCallback: Send + Sync {
    /// 콜백 이름 (로그용)
    fn name(&self) -> &str {
        "anonymous"
    }

    /// 새 플러그인이 레지스트리에 들어간 직후 호출
    fn on_plugin_added(&self, plugin: &Arc<PluginDescriptor>) -> Result<()>;
}

/// 클로저 기반 콜백
pub struct FnCallback<F> {
    name: String,
    callback: F,
}

impl<F> FnCallback<F>
where
    F: Fn(&Arc<PluginDescriptor>) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> PluginCallback for FnCallback<F>
where
    F: Fn(&Arc<PluginDescriptor>) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_plugin_added(&self, plugin: &Arc<PluginDescriptor>) -> Result<()> {
        (self.callback)(plugin)
    }
}

// ============================================================================
// NotifyReport
// ============================================================================

/// 한 번의 통지 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub failed: usize,
}

// ============================================================================
// PluginLifecycleNotifier
// ============================================================================

/// 등록 순서를 유지하는 콜백 목록
#[derive(Default)]
pub struct PluginLifecycleNotifier {
    callbacks: RwLock<Vec<Arc<dyn PluginCallback>>>,
}

impl PluginLifecycleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 콜백 추가 (이후 통지부터 적용)
    pub fn add(&self, callback: Arc<dyn PluginCallback>) {
        debug!(callback = callback.name(), "Plugin callback added");
        self.callbacks.write().push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.read().is_empty()
    }

    /// 모든 콜백에 통지
    ///
    /// 목록을 복사한 뒤 잠금 없이 호출하므로 콜백 안에서 콜백을 추가해도 된다.
    pub fn notify_added(&self, plugin: &Arc<PluginDescriptor>) -> NotifyReport {
        let callbacks: Vec<_> = self.callbacks.read().clone();
        let mut report = NotifyReport::default();

        for callback in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback.on_plugin_added(plugin))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        callback = callback.name(),
                        package = plugin.package_name(),
                        "Plugin callback failed: {}",
                        e
                    );
                }
                Err(panic) => {
                    report.failed += 1;
                    warn!(
                        callback = callback.name(),
                        package = plugin.package_name(),
                        "Plugin callback panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostplug_foundation::Error;
    use parking_lot::Mutex;

    fn plugin(name: &str) -> Arc<PluginDescriptor> {
        Arc::new(
            PluginDescriptor::builder(name, format!("/plugins/{}.json", name))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_order_and_isolation() {
        let notifier = PluginLifecycleNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        notifier.add(Arc::new(FnCallback::new("first", move |p| {
            s.lock().push(format!("first:{}", p.package_name()));
            Ok(())
        })));
        notifier.add(Arc::new(FnCallback::new("failing", |_| {
            Err(Error::Internal("boom".to_string()))
        })));
        notifier.add(Arc::new(FnCallback::new("panicking", |_| -> Result<()> {
            panic!("callback exploded")
        })));
        let s = seen.clone();
        notifier.add(Arc::new(FnCallback::new("last", move |p| {
            s.lock().push(format!("last:{}", p.package_name()));
            Ok(())
        })));

        let report = notifier.notify_added(&plugin("com.a"));
        assert_eq!(report, NotifyReport { delivered: 2, failed: 2 });
        assert_eq!(*seen.lock(), vec!["first:com.a", "last:com.a"]);
    }

    #[test]
    fn test_callback_added_during_notify() {
        let notifier = Arc::new(PluginLifecycleNotifier::new());
        let inner = notifier.clone();
        notifier.add(Arc::new(FnCallback::new("adder", move |_| {
            inner.add(Arc::new(FnCallback::new("late", |_| Ok(()))));
            Ok(())
        })));

        let report = notifier.notify_added(&plugin("com.a"));
        assert_eq!(report.delivered, 1);
        assert_eq!(notifier.len(), 2);
    }
}

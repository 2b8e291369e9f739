//! Plugin traits - 플러그인 코드가 구현하는 진입점 인터페이스

use super::manager::PluginManager;
use hostplug_foundation::Result;
use std::fmt;

// ============================================================================
// ApplicationEntry - 플러그인 애플리케이션 진입점
// ============================================================================

/// 플러그인 애플리케이션 진입점
///
/// 패키지가 등록되고 통지가 끝난 뒤 정확히 한 번 호출된다.
/// 이 시점에는 자기 자신을 포함한 레지스트리 조회가 가능하다.
pub trait ApplicationEntry: Send + Sync {
    /// 진입점 이름 (매니페스트의 application 항목과 매칭)
    fn name(&self) -> &str;

    /// 애플리케이션 생성 콜백
    fn on_create(&self, manager: &PluginManager) -> Result<()>;
}

/// 클로저 기반 진입점
pub struct FnApplication<F> {
    name: String,
    on_create: F,
}

impl<F> FnApplication<F>
where
    F: Fn(&PluginManager) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, on_create: F) -> Self {
        Self {
            name: name.into(),
            on_create,
        }
    }
}

impl<F> ApplicationEntry for FnApplication<F>
where
    F: Fn(&PluginManager) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_create(&self, manager: &PluginManager) -> Result<()> {
        (self.on_create)(manager)
    }
}

impl<F> fmt::Debug for FnApplication<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnApplication")
            .field("name", &self.name)
            .finish()
    }
}

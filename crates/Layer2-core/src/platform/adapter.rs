//! Platform Adapter - host 내부 참조를 읽고 바꾸는 경계
//!
//! host 런타임마다 구현이 다르다. 참조를 찾을 수 없거나 교체할 수 없으면
//! 에러를 반환하고, 인터셉터가 이를 설치 실패로 바꾼다.

use super::host::{ComponentManager, LifecycleDispatcher, ProviderAccess};
use hostplug_foundation::Result;
use std::sync::Arc;

/// host 런타임 어댑터
pub trait PlatformAdapter: Send + Sync {
    /// host 패키지 이름
    fn host_package(&self) -> &str;

    /// 현재 살아있는 디스패처
    fn dispatcher(&self) -> Result<Arc<dyn LifecycleDispatcher>>;

    /// 디스패처 교체
    fn replace_dispatcher(&self, dispatcher: Arc<dyn LifecycleDispatcher>) -> Result<()>;

    /// 현재 살아있는 component manager
    fn component_manager(&self) -> Result<Arc<dyn ComponentManager>>;

    /// component manager 교체
    fn replace_component_manager(&self, manager: Arc<dyn ComponentManager>) -> Result<()>;

    /// authority에 해당하는 provider를 깨운다 (바인딩이 생기도록)
    fn wake_provider(&self, authority: &str) -> Result<()>;

    /// 깨어난 provider 바인딩
    fn provider_binding(&self, authority: &str) -> Result<Option<Arc<dyn ProviderAccess>>>;
}

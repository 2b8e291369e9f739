//! Host traits - host 런타임이 노출하는 교체 가능한 서비스
//!
//! 각 트레이트는 host가 들고 있는 "살아있는 참조" 하나에 대응한다.
//! 인터셉터는 이 참조를 데코레이터로 바꿔 끼운다.

use crate::component::{ComponentKind, ComponentName, ComponentRequest};
use hostplug_foundation::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;

// ============================================================================
// Components
// ============================================================================

/// host가 생성해 구동하는 컴포넌트 인스턴스
pub trait HostComponent: Send + Sync + fmt::Debug {
    /// 인스턴스의 실제 클래스 이름
    fn class_name(&self) -> &str;

    /// 다운캐스트용
    fn as_any(&self) -> &dyn Any;
}

/// 플러그인 코드의 컴포넌트 생성기
pub trait ComponentFactory: Send + Sync {
    /// 클래스 이름으로 인스턴스 생성. 모르는 클래스면 None
    fn instantiate(&self, kind: ComponentKind, class_name: &str) -> Option<Box<dyn HostComponent>>;
}

/// 이름만 가진 단순 컴포넌트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericComponent {
    pub kind: ComponentKind,
    pub class_name: String,
}

impl GenericComponent {
    pub fn new(kind: ComponentKind, class_name: impl Into<String>) -> Self {
        Self {
            kind,
            class_name: class_name.into(),
        }
    }
}

impl HostComponent for GenericComponent {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 어떤 클래스든 `GenericComponent`로 만드는 팩토리
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericFactory;

impl ComponentFactory for GenericFactory {
    fn instantiate(&self, kind: ComponentKind, class_name: &str) -> Option<Box<dyn HostComponent>> {
        Some(Box::new(GenericComponent::new(kind, class_name)))
    }
}

// ============================================================================
// Lifecycle dispatcher
// ============================================================================

/// 실행 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReceipt {
    /// 요청이 최종적으로 가리킨 컴포넌트
    pub component: ComponentName,

    /// 대신 선 placeholder (플러그인 컴포넌트일 때만)
    pub placeholder: Option<ComponentName>,
}

impl LaunchReceipt {
    pub fn native(component: ComponentName) -> Self {
        Self {
            component,
            placeholder: None,
        }
    }

    /// host가 실제로 구동하는 식별자
    pub fn host_component(&self) -> &ComponentName {
        self.placeholder.as_ref().unwrap_or(&self.component)
    }
}

/// 컴포넌트 실행/생성/파괴를 담당하는 host 디스패처
pub trait LifecycleDispatcher: Send + Sync {
    /// 구현 식별자 (호환성 검사와 설치 확인에 사용)
    fn identity(&self) -> &str;

    fn start_activity(&self, request: &ComponentRequest) -> Result<LaunchReceipt>;

    /// host가 구동할 인스턴스 생성
    fn instantiate(
        &self,
        kind: ComponentKind,
        name: &ComponentName,
        request: &ComponentRequest,
    ) -> Result<Box<dyn HostComponent>>;

    /// 인스턴스가 파괴된 뒤 호출
    fn component_destroyed(&self, kind: ComponentKind, name: &ComponentName);
}

// ============================================================================
// Component manager
// ============================================================================

/// bind 연결 식별자
pub type ConnectionId = u64;

/// 시스템 서비스 관리자 (service 시작/중지/바인드)
pub trait ComponentManager: Send + Sync {
    fn identity(&self) -> &str;

    /// 시작된 service 식별자. 대상이 없으면 None
    fn start_service(&self, request: &ComponentRequest) -> Result<Option<ComponentName>>;

    /// 실행 중이던 service를 중지했으면 true
    fn stop_service(&self, request: &ComponentRequest) -> Result<bool>;

    fn bind_service(&self, request: &ComponentRequest, connection: ConnectionId) -> Result<bool>;

    fn unbind_service(&self, connection: ConnectionId) -> Result<bool>;
}

// ============================================================================
// Provider access
// ============================================================================

/// provider 호출
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCall {
    pub method: String,
    pub uri: String,
    #[serde(default)]
    pub args: Value,
}

impl ProviderCall {
    pub fn new(method: impl Into<String>, uri: impl Into<String>, args: Value) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            args,
        }
    }

    pub fn query(uri: impl Into<String>) -> Self {
        Self::new("query", uri, Value::Null)
    }

    pub fn insert(uri: impl Into<String>, values: Value) -> Self {
        Self::new("insert", uri, values)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new("delete", uri, Value::Null)
    }
}

/// provider 바인딩 (authority 하나에 대한 원격 접근)
pub trait ProviderAccess: Send + Sync {
    fn identity(&self) -> &str;

    fn call(&self, call: &ProviderCall) -> Result<Value>;
}

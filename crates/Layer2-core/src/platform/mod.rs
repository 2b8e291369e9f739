//! Platform - host 런타임 경계와 hook
//!
//! ```text
//! host ──▶ [InterceptingDispatcher] ──▶ native dispatcher
//!      ──▶ [ComponentManagerProxy]  ──▶ native component manager
//!      ──▶ [ProviderAccessProxy]    ──▶ stub provider binding
//! ```
//!
//! 데코레이터는 가로채지 않는 모든 호출을 원래 구현으로 넘긴다.

mod adapter;
mod dispatch;
mod host;
mod interceptor;
mod provider;
mod services;
mod simulated;

pub use adapter::PlatformAdapter;
pub use dispatch::{InterceptingDispatcher, INTERCEPTING_DISPATCHER_ID};
pub use host::{
    ComponentFactory, ComponentManager, ConnectionId, GenericComponent, GenericFactory,
    HostComponent, LaunchReceipt, LifecycleDispatcher, ProviderAccess, ProviderCall,
};
pub use interceptor::DispatchInterceptor;
pub use provider::{PluginUri, ProviderAccessProxy, PROVIDER_PROXY_ID};
pub use services::{ComponentManagerProxy, COMPONENT_MANAGER_PROXY_ID};
pub use simulated::{
    ActivityRecord, SimulatedHost, NATIVE_COMPONENT_MANAGER_ID, NATIVE_DISPATCHER_ID,
    NATIVE_PROVIDER_ID,
};

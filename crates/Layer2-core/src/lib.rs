//! hostplug-core: Core Runtime for hostplug
//!
//! Layer2 - 플러그인 패키지를 설치 없이 host 안에서 실행하는 런타임
//!
//! # 주요 모듈
//!
//! - `component`: 컴포넌트 식별자, 선언, 요청, 해석 결과
//! - `plugin`: 패키지 로드, 레지스트리, 등록 통지, PluginManager
//! - `resolver`: 요청 → 플러그인 컴포넌트 해석
//! - `stub`: host에 미리 선언된 placeholder 슬롯 관리
//! - `platform`: host 런타임 경계, hook 데코레이터, 시뮬레이션 host
//!
//! # 사용 예시
//!
//! ```ignore
//! use hostplug_core::{ComponentRequest, PluginManager, SimulatedHost};
//!
//! let config = HostConfig::load()?;
//! let host = Arc::new(SimulatedHost::for_config(&config));
//! let manager = PluginManager::builder(host.clone()).config(config).build()?;
//!
//! // 플러그인 로드
//! manager.load_plugin("plugins/a.json")?;
//!
//! // host에 선언되지 않은 플러그인 activity 실행
//! let record = host.start_activity(&ComponentRequest::explicit("com.a", ".Main"))?;
//! ```

pub mod component;
pub mod platform;
pub mod plugin;
pub mod resolver;
pub mod stub;

// Re-exports: Component
pub use component::{
    ComponentDeclaration, ComponentKind, ComponentName, ComponentRequest, IntentFilter,
    LaunchMode, ResolutionFlags, ResolutionResult,
};

// Re-exports: Plugin
pub use plugin::{
    ApplicationEntry, BindingMapper, BindingMapperProxy, FnApplication, FnCallback,
    ManifestLoader, PackageLoader, PluginCallback, PluginDescriptor, PluginManager,
    PluginManifest, PluginRegistry, PluginSummary,
};

// Re-exports: Resolver / Stub
pub use resolver::ComponentResolver;
pub use stub::{PoolStats, StubGroup, StubMapper};

// Re-exports: Platform
pub use platform::{
    ActivityRecord, ComponentFactory, ComponentManager, DispatchInterceptor, GenericFactory,
    HostComponent, LaunchReceipt, LifecycleDispatcher, PlatformAdapter, PluginUri,
    ProviderAccess, ProviderCall, SimulatedHost,
};

// Re-exports: Foundation
pub use hostplug_foundation::{Error, HostConfig, Result};

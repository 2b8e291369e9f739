//! # Plugin System
//!
//! 플러그인 패키지 로드, 등록, 통지
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PluginManager                           │
//! │  ┌──────────────┐   ┌───────────────────────────────────┐  │
//! │  │ PackageLoader│──▶│          PluginRegistry            │  │
//! │  │ (manifest)   │   │  package -> PluginDescriptor       │  │
//! │  └──────────────┘   │  (등록 순서 유지, 마지막 등록 우선)  │  │
//! │                     └─────────────────┬─────────────────┘  │
//! │                                       │ on_plugin_added     │
//! │                     ┌─────────────────▼─────────────────┐  │
//! │                     │  PluginLifecycleNotifier           │  │
//! │                     │  - BindingMapperProxy (첫 콜백)     │  │
//! │                     │  - 사용자 콜백                      │  │
//! │                     └───────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! let manager = PluginManager::builder(platform).config(config).build()?;
//! let plugin = manager.load_plugin("plugins/a.json")?;
//! ```

mod binding;
mod descriptor;
mod events;
mod loader;
mod manager;
mod manifest;
mod registry;
mod traits;

pub use binding::{BindingMapper, BindingMapperProxy, StaticBindingMapper};
pub use descriptor::{PluginDescriptor, PluginDescriptorBuilder};
pub use events::{FnCallback, NotifyReport, PluginCallback, PluginLifecycleNotifier};
pub use loader::{ManifestLoader, PackageLoader};
pub use manager::{PluginManager, PluginManagerBuilder, PluginSummary};
pub use manifest::{PluginManifest, MANIFEST_FILE};
pub use registry::PluginRegistry;
pub use traits::{ApplicationEntry, FnApplication};

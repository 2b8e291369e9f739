//! Plugin Manifest - 플러그인 패키지 파일 형식
//!
//! ```json
//! {
//!   "package": "com.example.a",
//!   "version": "1.0.0",
//!   "application": "com.example.a.App",
//!   "components": [
//!     { "kind": "activity", "className": ".MainActivity", "launchMode": "singleTop" },
//!     { "kind": "provider", "className": ".Data", "authority": "com.example.a.data" }
//!   ],
//!   "bindings": { "activity_main": "com.example.a.databinding.ActivityMainBinding" }
//! }
//! ```

use crate::component::ComponentDeclaration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 패키지 파일 이름 (디렉토리로 지정된 경우)
pub const MANIFEST_FILE: &str = "plugin.json";

/// 플러그인 매니페스트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    /// 패키지 이름 (레지스트리 키)
    pub package: String,

    /// 버전
    #[serde(default = "default_version")]
    pub version: String,

    /// 애플리케이션 진입점 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,

    /// 컴포넌트 팩토리 이름 (없으면 패키지 이름으로 찾는다)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,

    /// 선언된 컴포넌트
    #[serde(default)]
    pub components: Vec<ComponentDeclaration>,

    /// 레이아웃 → 바인딩 클래스
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub bindings: HashMap<String, String>,

    /// 추가 메타데이터
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl PluginManifest {
    /// 새 매니페스트 생성
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: default_version(),
            application: None,
            factory: None,
            components: Vec::new(),
            bindings: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// 빌더 패턴: 버전 설정
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// 빌더 패턴: 진입점 설정
    pub fn with_application(mut self, name: impl Into<String>) -> Self {
        self.application = Some(name.into());
        self
    }

    /// 빌더 패턴: 컴포넌트 추가
    pub fn with_component(mut self, component: ComponentDeclaration) -> Self {
        self.components.push(component);
        self
    }

    /// 빌더 패턴: 바인딩 추가
    pub fn with_binding(mut self, layout: impl Into<String>, class: impl Into<String>) -> Self {
        self.bindings.insert(layout.into(), class.into());
        self
    }

    /// JSON 문자열 파싱
    pub fn parse(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// JSON 직렬화
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, LaunchMode};

    #[test]
    fn test_parse_minimal() {
        let manifest = PluginManifest::parse(r#"{"package": "com.a"}"#).unwrap();
        assert_eq!(manifest.package, "com.a");
        assert_eq!(manifest.version, "1.0.0");
        assert!(manifest.components.is_empty());
    }

    #[test]
    fn test_parse_components() {
        let manifest = PluginManifest::parse(
            r#"{
                "package": "com.a",
                "components": [
                    {"kind": "activity", "className": ".Main", "launchMode": "singleTask",
                     "intentFilters": [{"actions": ["a.MAIN"]}]},
                    {"kind": "service", "className": ".Sync", "enabled": false}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.components.len(), 2);
        let main = &manifest.components[0];
        assert_eq!(main.kind, ComponentKind::Activity);
        assert_eq!(main.launch_mode, LaunchMode::SingleTask);
        assert_eq!(main.intent_filters[0].actions, vec!["a.MAIN"]);
        assert!(!manifest.components[1].enabled);
    }

    #[test]
    fn test_builder_serializes() {
        let manifest = PluginManifest::new("com.a")
            .with_version("2.1.0")
            .with_application("com.a.App")
            .with_component(ComponentDeclaration::activity(".Main"))
            .with_binding("main", "com.a.MainBinding");

        let json = manifest.to_json().unwrap();
        assert_eq!(PluginManifest::parse(&json).unwrap(), manifest);
    }
}

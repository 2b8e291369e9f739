//! Component identity - (package, class) 쌍과 컴포넌트 분류

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ComponentName
// ============================================================================

/// 컴포넌트 식별자
///
/// 클래스 이름이 '.'으로 시작하면 패키지 이름 기준 상대 경로로 보고
/// 생성 시점에 정규화한다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentName {
    pub package: String,
    pub class: String,
}

impl ComponentName {
    pub fn new(package: impl Into<String>, class: impl AsRef<str>) -> Self {
        let package = package.into();
        let class = Self::qualify(&package, class.as_ref());
        Self { package, class }
    }

    /// 상대 클래스 이름을 패키지 기준으로 정규화
    pub fn qualify(package: &str, class: &str) -> String {
        if class.starts_with('.') {
            format!("{}{}", package, class)
        } else {
            class.to_string()
        }
    }

    /// "package/class" 형식 파싱
    pub fn parse(s: &str) -> Option<Self> {
        let (package, class) = s.split_once('/')?;
        if package.is_empty() || class.is_empty() {
            return None;
        }
        Some(Self::new(package, class))
    }

    /// 마지막 '.' 뒤의 짧은 클래스 이름
    pub fn short_class(&self) -> &str {
        self.class.rsplit('.').next().unwrap_or(&self.class)
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.class)
    }
}

// ============================================================================
// ComponentKind
// ============================================================================

/// 컴포넌트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Activity,
    Service,
    Provider,
    Receiver,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Activity => "activity",
            ComponentKind::Service => "service",
            ComponentKind::Provider => "provider",
            ComponentKind::Receiver => "receiver",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LaunchMode
// ============================================================================

/// Activity launch mode - placeholder 풀 선택 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaunchMode {
    #[default]
    Standard,
    SingleTop,
    SingleTask,
    SingleInstance,
}

impl LaunchMode {
    pub const ALL: [LaunchMode; 4] = [
        LaunchMode::Standard,
        LaunchMode::SingleTop,
        LaunchMode::SingleTask,
        LaunchMode::SingleInstance,
    ];

    /// Stub 클래스 이름에 쓰이는 그룹 이름
    pub fn group_name(&self) -> &'static str {
        match self {
            LaunchMode::Standard => "Standard",
            LaunchMode::SingleTop => "SingleTop",
            LaunchMode::SingleTask => "SingleTask",
            LaunchMode::SingleInstance => "SingleInstance",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_class_is_qualified() {
        let name = ComponentName::new("com.example.a", ".MainActivity");
        assert_eq!(name.class, "com.example.a.MainActivity");
        assert_eq!(name.short_class(), "MainActivity");

        let name = ComponentName::new("com.example.a", "MainActivity");
        assert_eq!(name.class, "MainActivity");
    }

    #[test]
    fn test_parse_and_display() {
        let name = ComponentName::parse("com.example.a/.Main").unwrap();
        assert_eq!(name.to_string(), "com.example.a/com.example.a.Main");
        assert!(ComponentName::parse("no-slash").is_none());
        assert!(ComponentName::parse("/Main").is_none());
    }

    #[test]
    fn test_launch_mode_serde() {
        let mode: LaunchMode = serde_json::from_str("\"singleTop\"").unwrap();
        assert_eq!(mode, LaunchMode::SingleTop);
        assert_eq!(mode.group_name(), "SingleTop");
        assert_eq!(LaunchMode::default(), LaunchMode::Standard);
    }
}

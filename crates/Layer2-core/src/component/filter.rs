//! Intent filter & component declaration
//!
//! 플러그인 패키지가 선언하는 컴포넌트와 그 매칭 규칙

use super::name::{ComponentKind, ComponentName, LaunchMode};
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

// ============================================================================
// Match scores
// ============================================================================

/// 데이터 조건이 없는 filter 매칭
pub const MATCH_CATEGORY_EMPTY: u32 = 0x0010_0000;
/// scheme 까지 일치한 filter 매칭
pub const MATCH_CATEGORY_SCHEME: u32 = 0x0020_0000;
/// 모든 filter 매칭에 더해지는 기본 보정값
pub const MATCH_ADJUSTMENT_NORMAL: u32 = 0x8000;
/// 명시적 클래스 지정 매칭 (어떤 filter 매칭보다 높다)
pub const MATCH_EXACT: u32 = 0x0FFF_0000;

/// 기본 카테고리
pub const CATEGORY_DEFAULT: &str = "intent.category.DEFAULT";
/// 진입점 action
pub const ACTION_MAIN: &str = "intent.action.MAIN";

// ============================================================================
// ResolutionFlags
// ============================================================================

/// 해석 플래그
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionFlags(u32);

impl ResolutionFlags {
    pub const NONE: ResolutionFlags = ResolutionFlags(0);
    /// DEFAULT 카테고리를 가진 filter만 매칭
    pub const DEFAULT_ONLY: ResolutionFlags = ResolutionFlags(0x0001_0000);
    /// 비활성 컴포넌트도 매칭
    pub const MATCH_DISABLED: ResolutionFlags = ResolutionFlags(0x0000_0200);

    pub const fn from_bits(bits: u32) -> Self {
        ResolutionFlags(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: ResolutionFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ResolutionFlags {
    type Output = ResolutionFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ResolutionFlags(self.0 | rhs.0)
    }
}

// ============================================================================
// IntentFilter
// ============================================================================

/// 묵시적 요청 매칭 조건
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentFilter {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub schemes: Vec<String>,
}

impl IntentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.schemes.push(scheme.into());
        self
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// 요청과 매칭되면 점수를 반환
    ///
    /// - action: 요청에 action이 있으면 filter에 포함되어야 하고,
    ///   없으면 filter가 action을 하나 이상 선언해야 한다
    /// - categories: 요청의 모든 카테고리가 filter에 있어야 한다
    /// - data: scheme이 있으면 filter scheme과 일치해야 하고,
    ///   없으면 filter도 scheme을 선언하지 않아야 한다
    pub fn match_request(
        &self,
        action: Option<&str>,
        categories: &[String],
        scheme: Option<&str>,
    ) -> Option<u32> {
        match action {
            Some(action) if !self.actions.iter().any(|a| a == action) => return None,
            None if self.actions.is_empty() => return None,
            _ => {}
        }

        if !categories.iter().all(|c| self.has_category(c)) {
            return None;
        }

        let data_score = match scheme {
            Some(scheme) if self.schemes.iter().any(|s| s == scheme) => MATCH_CATEGORY_SCHEME,
            Some(_) => return None,
            None if self.schemes.is_empty() => MATCH_CATEGORY_EMPTY,
            None => return None,
        };

        Some(data_score + MATCH_ADJUSTMENT_NORMAL)
    }
}

// ============================================================================
// ComponentDeclaration
// ============================================================================

/// 플러그인이 선언한 컴포넌트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDeclaration {
    pub kind: ComponentKind,

    /// 선언된 클래스 이름 ('.' 시작이면 패키지 상대)
    pub class_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intent_filters: Vec<IntentFilter>,

    /// Provider authority (';'로 여러 개 지정 가능)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,

    #[serde(default)]
    pub launch_mode: LaunchMode,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ComponentDeclaration {
    pub fn new(kind: ComponentKind, class_name: impl Into<String>) -> Self {
        Self {
            kind,
            class_name: class_name.into(),
            intent_filters: Vec::new(),
            authority: None,
            launch_mode: LaunchMode::Standard,
            enabled: true,
        }
    }

    pub fn activity(class_name: impl Into<String>) -> Self {
        Self::new(ComponentKind::Activity, class_name)
    }

    pub fn service(class_name: impl Into<String>) -> Self {
        Self::new(ComponentKind::Service, class_name)
    }

    pub fn receiver(class_name: impl Into<String>) -> Self {
        Self::new(ComponentKind::Receiver, class_name)
    }

    pub fn provider(class_name: impl Into<String>, authority: impl Into<String>) -> Self {
        let mut decl = Self::new(ComponentKind::Provider, class_name);
        decl.authority = Some(authority.into());
        decl
    }

    pub fn with_filter(mut self, filter: IntentFilter) -> Self {
        self.intent_filters.push(filter);
        self
    }

    pub fn with_launch_mode(mut self, mode: LaunchMode) -> Self {
        self.launch_mode = mode;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// 패키지 기준 정규화된 식별자
    pub fn component_name(&self, package: &str) -> ComponentName {
        ComponentName::new(package, &self.class_name)
    }

    /// 선언된 authority 목록
    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        self.authority
            .as_deref()
            .unwrap_or("")
            .split(';')
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    pub fn matches_authority(&self, authority: &str) -> bool {
        self.authorities().any(|a| a == authority)
    }

    /// 플래그 기준으로 매칭 대상인지
    pub fn is_visible(&self, flags: ResolutionFlags) -> bool {
        self.enabled || flags.contains(ResolutionFlags::MATCH_DISABLED)
    }

    /// filter 중 가장 높은 매칭 점수
    pub fn best_filter_score(
        &self,
        action: Option<&str>,
        categories: &[String],
        scheme: Option<&str>,
        flags: ResolutionFlags,
    ) -> Option<u32> {
        let default_only = flags.contains(ResolutionFlags::DEFAULT_ONLY);
        self.intent_filters
            .iter()
            .filter(|f| !default_only || f.has_category(CATEGORY_DEFAULT))
            .filter_map(|f| f.match_request(action, categories, scheme))
            .max()
    }
}

fn default_true() -> bool {
    true
}

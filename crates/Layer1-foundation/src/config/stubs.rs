//! Stub Configuration - Placeholder 슬롯 설정
//!
//! Host 매니페스트에 미리 선언된 stub 컴포넌트의 수와 이름 규칙을 정의합니다.
//! 슬롯 수는 동시에 진행 중인 리다이렉션 수의 상한입니다.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// 전체 placeholder 슬롯 상한 (host 매니페스트에 선언되는 stub 수)
pub const MAX_STUB_SLOTS: usize = 4096;

/// Activity stub 슬롯 수 (launch mode 별)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySlots {
    #[serde(default = "default_standard")]
    pub standard: usize,
    #[serde(default = "default_slots")]
    pub single_top: usize,
    #[serde(default = "default_slots")]
    pub single_task: usize,
    #[serde(default = "default_slots")]
    pub single_instance: usize,
}

impl Default for ActivitySlots {
    fn default() -> Self {
        Self {
            standard: default_standard(),
            single_top: default_slots(),
            single_task: default_slots(),
            single_instance: default_slots(),
        }
    }
}

impl ActivitySlots {
    /// 전체 activity 슬롯 수. 오버플로면 None
    pub fn total(&self) -> Option<usize> {
        self.standard
            .checked_add(self.single_top)?
            .checked_add(self.single_task)?
            .checked_add(self.single_instance)
    }
}

/// Placeholder(stub) 풀 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubConfig {
    /// Activity 슬롯
    #[serde(default)]
    pub activities: ActivitySlots,

    /// Service 슬롯
    #[serde(default = "default_slots")]
    pub services: usize,

    /// Stub 클래스 이름 접두사 (host 패키지 기준 상대 경로)
    #[serde(default = "default_class_prefix")]
    pub class_prefix: String,

    /// Stub provider authority (없으면 host 패키지에서 유도)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            activities: ActivitySlots::default(),
            services: default_slots(),
            class_prefix: default_class_prefix(),
            authority: None,
        }
    }
}

impl StubConfig {
    /// activity + service 슬롯 수. 오버플로면 None
    pub fn total_slots(&self) -> Option<usize> {
        self.activities.total()?.checked_add(self.services)
    }

    /// 슬롯이 하나도 없는지 확인
    pub fn is_empty(&self) -> bool {
        self.total_slots() == Some(0)
    }

    /// 슬롯 수와 클래스 접두사 검증
    pub fn validate(&self) -> Result<()> {
        match self.total_slots() {
            Some(0) => {
                return Err(Error::Config(
                    "stubs must declare at least one placeholder slot".to_string(),
                ))
            }
            Some(total) if total <= MAX_STUB_SLOTS => {}
            _ => {
                return Err(Error::Config(format!(
                    "stubs declare more than {} placeholder slots",
                    MAX_STUB_SLOTS
                )))
            }
        }

        if !is_relative_class_prefix(&self.class_prefix) {
            return Err(Error::Config(format!(
                "stubs.classPrefix must look like \".stub\" (got \"{}\")",
                self.class_prefix
            )));
        }
        if matches!(&self.authority, Some(authority) if authority.trim().is_empty()) {
            return Err(Error::Config("stubs.authority must not be empty".to_string()));
        }
        Ok(())
    }

    /// Stub provider authority
    pub fn provider_authority(&self, host_package: &str) -> String {
        self.authority
            .clone()
            .unwrap_or_else(|| format!("{}.hostplug.provider", host_package))
    }

    /// Stub 클래스의 정규화된 이름 (예: "com.host.stub.Standard$1")
    pub fn stub_class(&self, host_package: &str, group: &str, index: usize) -> String {
        format!("{}{}.{}${}", host_package, self.class_prefix, group, index)
    }
}

/// ".a.b" 형태: 점으로 시작하고 각 조각이 식별자
fn is_relative_class_prefix(prefix: &str) -> bool {
    let Some(rest) = prefix.strip_prefix('.') else {
        return false;
    };
    rest.split('.').all(|segment| {
        let mut chars = segment.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

fn default_standard() -> usize {
    4
}

fn default_slots() -> usize {
    8
}

fn default_class_prefix() -> String {
    ".stub".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StubConfig::default();
        assert_eq!(config.activities.standard, 4);
        assert_eq!(config.activities.total(), Some(28));
        assert_eq!(config.total_slots(), Some(36));
        assert_eq!(config.services, 8);
        assert!(!config.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_naming() {
        let config = StubConfig::default();
        assert_eq!(
            config.stub_class("com.host", "SingleTop", 3),
            "com.host.stub.SingleTop$3"
        );
        assert_eq!(
            config.provider_authority("com.host"),
            "com.host.hostplug.provider"
        );
    }

    #[test]
    fn test_partial_json() {
        let config: StubConfig =
            serde_json::from_str(r#"{"activities": {"standard": 2}, "services": 1}"#).unwrap();
        assert_eq!(config.activities.standard, 2);
        assert_eq!(config.activities.single_task, 8);
        assert_eq!(config.services, 1);
    }

    #[test]
    fn test_slot_overflow_and_cap() {
        let mut config = StubConfig::default();
        config.activities.standard = usize::MAX;
        assert_eq!(config.activities.total(), None);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = StubConfig::default();
        config.services = MAX_STUB_SLOTS;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_class_prefix_validation() {
        let mut config = StubConfig::default();
        for good in [".stub", ".a.b_c", "._x1"] {
            config.class_prefix = good.to_string();
            assert!(config.validate().is_ok(), "{}", good);
        }
        for bad in ["stub", "", ".", ".stub.", "..stub", ".1stub", ".st-ub"] {
            config.class_prefix = bad.to_string();
            assert!(config.validate().is_err(), "{}", bad);
        }
    }
}

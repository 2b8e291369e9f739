//! Component request - 컴포넌트 실행/바인드 요청

use super::filter::ResolutionFlags;
use super::name::ComponentName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 리다이렉트된 요청에 실제 대상 패키지를 기록하는 extra 키
pub const EXTRA_TARGET_PACKAGE: &str = "hostplug.target.package";
/// 리다이렉트된 요청에 실제 대상 클래스를 기록하는 extra 키
pub const EXTRA_TARGET_CLASS: &str = "hostplug.target.class";
/// 플러그인 요청 표시
pub const EXTRA_IS_PLUGIN: &str = "hostplug.is_plugin";

/// 컴포넌트 요청
///
/// 클래스가 지정되면 명시적 요청, 그렇지 않으면 action/category/data로
/// 매칭하는 묵시적 요청이다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    /// 데이터 URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default)]
    pub flags: ResolutionFlags,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, Value>,
}

impl ComponentRequest {
    /// 명시적 요청
    pub fn explicit(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            target_package: Some(package.into()),
            target_class: Some(class.into()),
            ..Default::default()
        }
    }

    /// 패키지만 지정한 요청 (해당 패키지 안에서 filter 매칭)
    pub fn for_package(package: impl Into<String>) -> Self {
        Self {
            target_package: Some(package.into()),
            ..Default::default()
        }
    }

    /// 묵시적 요청
    pub fn implicit(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_data(mut self, uri: impl Into<String>) -> Self {
        self.data = Some(uri.into());
        self
    }

    pub fn with_flags(mut self, flags: ResolutionFlags) -> Self {
        self.flags = self.flags | flags;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn is_explicit(&self) -> bool {
        self.target_class.is_some()
    }

    /// 패키지와 클래스가 모두 있으면 식별자 반환
    pub fn component(&self) -> Option<ComponentName> {
        match (&self.target_package, &self.target_class) {
            (Some(package), Some(class)) => Some(ComponentName::new(package.as_str(), class)),
            _ => None,
        }
    }

    /// 데이터 URI의 scheme
    pub fn data_scheme(&self) -> Option<&str> {
        let data = self.data.as_deref()?;
        let (scheme, _) = data.split_once(':')?;
        (!scheme.is_empty()).then_some(scheme)
    }

    /// placeholder를 대상으로 하는 요청 생성
    ///
    /// 원래 요청의 action/data/extras는 유지하고 실제 대상은 extras에 기록한다.
    pub fn redirect_to(&self, placeholder: &ComponentName, real: &ComponentName) -> Self {
        let mut redirected = self.clone();
        redirected.target_package = Some(placeholder.package.clone());
        redirected.target_class = Some(placeholder.class.clone());
        redirected
            .extras
            .insert(EXTRA_IS_PLUGIN.to_string(), Value::Bool(true));
        redirected.extras.insert(
            EXTRA_TARGET_PACKAGE.to_string(),
            Value::String(real.package.clone()),
        );
        redirected.extras.insert(
            EXTRA_TARGET_CLASS.to_string(),
            Value::String(real.class.clone()),
        );
        redirected
    }

    /// 리다이렉트된 요청이면 기록된 실제 대상 반환
    pub fn redirected_target(&self) -> Option<ComponentName> {
        if self.extras.get(EXTRA_IS_PLUGIN).and_then(Value::as_bool) != Some(true) {
            return None;
        }
        let package = self.extras.get(EXTRA_TARGET_PACKAGE)?.as_str()?;
        let class = self.extras.get(EXTRA_TARGET_CLASS)?.as_str()?;
        Some(ComponentName::new(package, class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let req = ComponentRequest::explicit("com.a", ".Main");
        assert!(req.is_explicit());
        assert_eq!(req.component(), Some(ComponentName::new("com.a", "com.a.Main")));

        let req = ComponentRequest::implicit("a.VIEW")
            .with_category("c.DEFAULT")
            .with_data("https://example.com/x");
        assert!(!req.is_explicit());
        assert!(req.component().is_none());
        assert_eq!(req.data_scheme(), Some("https"));
    }

    #[test]
    fn test_redirect_keeps_payload() {
        let req = ComponentRequest::explicit("com.a", "com.a.Main").with_extra("user", 7);
        let placeholder = ComponentName::new("com.host", "com.host.stub.Standard$0");
        let real = req.component().unwrap();

        let redirected = req.redirect_to(&placeholder, &real);
        assert_eq!(redirected.component(), Some(placeholder));
        assert_eq!(redirected.extras.get("user"), Some(&Value::from(7)));
        assert_eq!(redirected.redirected_target(), Some(real));
        assert!(req.redirected_target().is_none());
    }
}

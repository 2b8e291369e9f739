//! Provider Access Proxy - 플러그인 provider 호출을 stub provider로 감싼다
//!
//! `content://<plugin-authority>/path` 호출은
//! `content://<stub-authority>/?plugin=<package>&uri=<원래 URI>` 로 바꿔
//! host에 선언된 stub provider 하나로 보낸다.

use super::host::{ProviderAccess, ProviderCall};
use crate::component::ResolutionFlags;
use crate::resolver::ComponentResolver;
use hostplug_foundation::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 설치 확인용 식별자
pub const PROVIDER_PROXY_ID: &str = "hostplug.ProviderAccessProxy";

const CONTENT_SCHEME: &str = "content://";
const PLUGIN_PARAM: &str = "plugin";
const URI_PARAM: &str = "uri";

// ============================================================================
// PluginUri
// ============================================================================

/// stub provider URI 인코딩
pub struct PluginUri;

impl PluginUri {
    /// content URI의 authority
    pub fn authority(uri: &str) -> Option<&str> {
        let rest = uri.strip_prefix(CONTENT_SCHEME)?;
        let end = rest.find(|c: char| matches!(c, '/' | '?' | '#')).unwrap_or(rest.len());
        let authority = &rest[..end];
        (!authority.is_empty()).then_some(authority)
    }

    /// 원래 URI를 stub authority URI로 감싼다
    pub fn wrap(stub_authority: &str, package: &str, uri: &str) -> String {
        format!(
            "{}{}/?{}={}&{}={}",
            CONTENT_SCHEME,
            stub_authority,
            PLUGIN_PARAM,
            urlencoding::encode(package),
            URI_PARAM,
            urlencoding::encode(uri)
        )
    }

    /// 감싼 URI에서 (package, 원래 URI) 복원
    pub fn unwrap(uri: &str) -> Option<(String, String)> {
        let (_, query) = uri.split_once('?')?;
        let mut package = None;
        let mut original = None;
        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let decoded = urlencoding::decode(value).ok()?.into_owned();
            match key {
                PLUGIN_PARAM => package = Some(decoded),
                URI_PARAM => original = Some(decoded),
                _ => {}
            }
        }
        Some((package?, original?))
    }
}

// ============================================================================
// ProviderAccessProxy
// ============================================================================

/// stub provider 바인딩 데코레이터
pub struct ProviderAccessProxy {
    base: Arc<dyn ProviderAccess>,
    resolver: ComponentResolver,
    stub_authority: String,
}

impl ProviderAccessProxy {
    pub fn new(
        base: Arc<dyn ProviderAccess>,
        resolver: ComponentResolver,
        stub_authority: impl Into<String>,
    ) -> Self {
        Self {
            base,
            resolver,
            stub_authority: stub_authority.into(),
        }
    }

    pub fn stub_authority(&self) -> &str {
        &self.stub_authority
    }

    /// 플러그인 provider 대상이면 감싼 호출
    fn rewrite(&self, call: &ProviderCall) -> Option<ProviderCall> {
        let authority = PluginUri::authority(&call.uri)?;
        if authority == self.stub_authority {
            return None;
        }
        let result = self
            .resolver
            .resolve_content_provider(authority, ResolutionFlags::NONE)?;

        let wrapped = PluginUri::wrap(&self.stub_authority, &result.package_name, &call.uri);
        debug!(uri = %call.uri, wrapped = %wrapped, "Wrapping plugin provider call");
        Some(ProviderCall {
            uri: wrapped,
            ..call.clone()
        })
    }
}

impl ProviderAccess for ProviderAccessProxy {
    fn identity(&self) -> &str {
        PROVIDER_PROXY_ID
    }

    fn call(&self, call: &ProviderCall) -> Result<Value> {
        match self.rewrite(call) {
            Some(wrapped) => self.base.call(&wrapped),
            None => self.base.call(call),
        }
    }
}

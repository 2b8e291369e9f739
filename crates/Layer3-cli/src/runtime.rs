//! CLI runtime - 설정 로드와 시뮬레이션 host 구성

use anyhow::Context;
use hostplug_core::{
    GenericFactory, HostConfig, ManifestLoader, PluginDescriptor, PluginManager, SimulatedHost,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// 시뮬레이션 host와 그 위에 올라간 매니저
pub struct Runtime {
    pub host: Arc<SimulatedHost>,
    pub manager: Arc<PluginManager>,
}

/// 지정한 파일 또는 글로벌 + 프로젝트 설정
pub fn load_config(path: Option<&Path>) -> anyhow::Result<HostConfig> {
    let config = match path {
        Some(path) => HostConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => HostConfig::load().context("failed to load host config")?,
    };
    Ok(config)
}

/// host를 만들고 hook을 설치한다
///
/// hook 설치 실패는 치명적이므로 그대로 반환한다.
pub fn start(config: HostConfig) -> anyhow::Result<Runtime> {
    let host = Arc::new(SimulatedHost::for_config(&config));

    // CLI는 플러그인 코드를 링크하지 않으므로 이름만 가진 컴포넌트를 만든다
    let loader = ManifestLoader::new()
        .lenient()
        .with_default_factory(Arc::new(GenericFactory));

    let manager = PluginManager::new(config, host.clone(), Arc::new(loader)).map_err(|e| {
        if e.is_fatal() {
            error!("Aborting: {}", e);
        }
        anyhow::Error::new(e).context("plugin manager startup failed")
    })?;

    Ok(Runtime { host, manager })
}

impl Runtime {
    /// 설정된 디렉토리와 인자로 받은 매니페스트를 로드
    ///
    /// 인자 매니페스트는 blocking 워커에서 하나씩, 인자 순서대로 로드한다.
    pub async fn load_plugins(&self, paths: &[PathBuf]) -> anyhow::Result<Vec<Arc<PluginDescriptor>>> {
        let configured = self
            .manager
            .load_configured_plugins()
            .context("failed to load configured plugins")?;
        if !configured.is_empty() {
            info!(count = configured.len(), "Loaded configured plugins");
        }

        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            let plugin = self
                .manager
                .load_plugin_in_background(path.clone())
                .await
                .context("plugin loader task failed")?
                .with_context(|| format!("failed to load {}", path.display()))?;
            loaded.push(plugin);
        }
        Ok(loaded)
    }
}

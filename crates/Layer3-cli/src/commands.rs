//! CLI subcommands

use crate::runtime;
use anyhow::{bail, Context};
use hostplug_core::plugin::MANIFEST_FILE;
use hostplug_core::{
    ComponentKind, ComponentName, ComponentRequest, HostConfig, ManifestLoader, PackageLoader,
    PluginManifest, ResolutionFlags, ResolutionResult, StubGroup,
};
use std::path::{Path, PathBuf};

// ============================================================================
// inspect
// ============================================================================

/// 매니페스트 내용 출력
pub fn inspect(path: &Path) -> anyhow::Result<()> {
    let manifest_path = ManifestLoader::manifest_path(path);
    let content = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("cannot read {}", manifest_path.display()))?;
    let manifest = PluginManifest::parse(&content)
        .with_context(|| format!("malformed {}", manifest_path.display()))?;

    // 로더와 같은 검증을 거친다
    let descriptor = ManifestLoader::new().lenient().load(&manifest_path)?;

    println!("\n📦 {} {}\n", descriptor.package_name(), descriptor.version());
    println!("  File:        {}", manifest_path.display());
    if let Some(application) = &manifest.application {
        println!("  Application: {}", application);
    }
    if let Some(factory) = &manifest.factory {
        println!("  Factory:     {}", factory);
    }
    if !manifest.bindings.is_empty() {
        println!("  Bindings:    {}", manifest.bindings.len());
    }

    println!("\n{:<10} {:<45} {:<16} {:<8}", "Kind", "Class", "Mode/Authority", "Filters");
    println!("{}", "-".repeat(82));
    for decl in descriptor.components() {
        let name = decl.component_name(descriptor.package_name());
        let detail = match decl.kind {
            ComponentKind::Activity => format!("{:?}", decl.launch_mode),
            ComponentKind::Provider => decl.authority.clone().unwrap_or_default(),
            _ => String::new(),
        };
        let enabled = if decl.enabled { "" } else { " (disabled)" };
        println!(
            "{:<10} {:<45} {:<16} {:<8}{}",
            decl.kind.as_str(),
            name.class,
            detail,
            decl.intent_filters.len(),
            enabled
        );
    }
    println!();
    Ok(())
}

// ============================================================================
// resolve
// ============================================================================

/// resolve 서브커맨드 인자
#[derive(Debug)]
pub struct ResolveQuery {
    pub package: Option<String>,
    pub class: Option<String>,
    pub action: Option<String>,
    pub categories: Vec<String>,
    pub authority: Option<String>,
    pub kind: ComponentKind,
    pub all: bool,
}

impl ResolveQuery {
    fn request(&self) -> ComponentRequest {
        let mut request = match (&self.package, &self.class) {
            (Some(package), Some(class)) => ComponentRequest::explicit(package, class),
            (Some(package), None) => ComponentRequest::for_package(package),
            _ => ComponentRequest::default(),
        };
        if let Some(action) = &self.action {
            request = request.with_action(action);
        }
        for category in &self.categories {
            request = request.with_category(category);
        }
        request
    }
}

/// 플러그인을 로드하고 요청을 해석
pub async fn resolve(config: HostConfig, plugins: &[PathBuf], query: ResolveQuery) -> anyhow::Result<()> {
    let runtime = runtime::start(config)?;
    runtime.load_plugins(plugins).await?;
    let manager = &runtime.manager;

    let flags = ResolutionFlags::NONE;
    let request = query.request();
    let results: Vec<ResolutionResult> = match query.kind {
        ComponentKind::Provider => {
            let Some(authority) = query.authority.as_deref() else {
                bail!("--authority is required for provider resolution");
            };
            manager
                .resolve_content_provider(authority, flags)
                .into_iter()
                .collect()
        }
        ComponentKind::Activity if query.all => manager.query_intent_activities(&request, flags),
        ComponentKind::Service if query.all => manager.query_intent_services(&request, flags),
        ComponentKind::Receiver => manager.query_broadcast_receivers(&request, flags),
        ComponentKind::Activity => manager.resolve_activity(&request, flags).into_iter().collect(),
        ComponentKind::Service => manager.resolve_service(&request, flags).into_iter().collect(),
    };

    if results.is_empty() {
        println!("No plugin {} matched; the host handles this request.", query.kind.as_str());
        return Ok(());
    }

    println!("\n{:<12} {:<50} {:<10}", "Score", "Component", "Kind");
    println!("{}", "-".repeat(74));
    for result in &results {
        println!(
            "{:<12} {:<50} {:<10}",
            format!("{:#010x}", result.match_score),
            result.component_name().to_string(),
            result.kind().as_str()
        );
    }
    println!();
    Ok(())
}

// ============================================================================
// launch
// ============================================================================

/// 플러그인 컴포넌트를 host를 통해 실행하고 정리
pub async fn launch(config: HostConfig, plugins: &[PathBuf], target: &str, service: bool) -> anyhow::Result<()> {
    let Some(target) = ComponentName::parse(target) else {
        bail!("target must be <package>/<class>, got '{}'", target);
    };

    let runtime = runtime::start(config)?;
    runtime.load_plugins(plugins).await?;
    let request = ComponentRequest::explicit(&target.package, &target.class);

    if service {
        let Some(started) = runtime.host.start_service(&request)? else {
            bail!("host did not start service {}", target);
        };
        println!("✓ Service started: {}", started);
        let stubs = runtime.manager.stub_mapper();
        if let Some(placeholder) = stubs.find_placeholder(StubGroup::Service, &started) {
            println!("  Placeholder: {}", placeholder);
        }
        println!("  Running:     {}", runtime.host.running_services().join(", "));

        let stopped = runtime.host.stop_service(&request)?;
        println!("✓ Service stopped: {}", stopped);
    } else {
        let record = runtime.host.start_activity(&request)?;
        println!("✓ Activity launched: {}", record.receipt.component);
        match &record.receipt.placeholder {
            Some(placeholder) => println!("  Placeholder: {}", placeholder),
            None => println!("  Placeholder: (none, host component)"),
        }
        println!("  Instance:    {}", record.class_name);

        runtime.host.destroy_activity(record.token)?;
        println!("✓ Activity destroyed (token {})", record.token);
    }

    println!("\n{:<24} {:<10} {:<10}", "Pool", "In use", "Capacity");
    println!("{}", "-".repeat(44));
    for stats in runtime.manager.stub_mapper().stats() {
        println!("{:<24} {:<10} {:<10}", stats.name, stats.in_use, stats.capacity);
    }
    println!();
    Ok(())
}

// ============================================================================
// config
// ============================================================================

/// 유효 설정 출력 (선택적으로 프로젝트에 저장)
pub fn show_config(config: &HostConfig, save: bool) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    println!("\nStub provider authority: {}", config.provider_authority());
    println!("Plugin manifest file name: {}", MANIFEST_FILE);

    if save {
        config.save_project().context("failed to save project config")?;
        println!("✓ Saved to project config");
    }
    Ok(())
}

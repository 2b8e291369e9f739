//! hostplug CLI - Main entry point

mod commands;
mod runtime;

use clap::{Parser, Subcommand};
use hostplug_core::ComponentKind;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// hostplug - run plugin packages inside a host without installing them
#[derive(Parser, Debug)]
#[command(name = "hostplug")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Host config file (default: global + project hostplug.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a plugin manifest and its declared components
    Inspect {
        /// Manifest file or plugin directory
        manifest: PathBuf,
    },
    /// Resolve a request against loaded plugins
    Resolve {
        /// Plugin manifests to load (in order)
        #[arg(short, long = "plugin", required = true)]
        plugins: Vec<PathBuf>,

        /// Target package
        #[arg(long)]
        package: Option<String>,

        /// Target class (explicit request, needs --package)
        #[arg(long, requires = "package")]
        class: Option<String>,

        /// Request action
        #[arg(long)]
        action: Option<String>,

        /// Request categories
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Provider authority (for --kind provider)
        #[arg(long)]
        authority: Option<String>,

        /// Component kind (activity, service, provider, receiver)
        #[arg(short, long, default_value = "activity", value_parser = parse_kind)]
        kind: ComponentKind,

        /// Return every match instead of the first
        #[arg(long)]
        all: bool,
    },
    /// Launch a plugin component through the simulated host
    Launch {
        /// Plugin manifests to load (in order)
        #[arg(short, long = "plugin", required = true)]
        plugins: Vec<PathBuf>,

        /// Component to launch (package/class)
        #[arg(short, long)]
        target: String,

        /// Start and stop as a service instead of an activity
        #[arg(long)]
        service: bool,
    },
    /// Print the effective host config
    Config {
        /// Save the effective config to the project directory
        #[arg(long)]
        save: bool,
    },
}

fn parse_kind(s: &str) -> Result<ComponentKind, String> {
    match s {
        "activity" => Ok(ComponentKind::Activity),
        "service" => Ok(ComponentKind::Service),
        "provider" => Ok(ComponentKind::Provider),
        "receiver" => Ok(ComponentKind::Receiver),
        other => Err(format!(
            "unknown kind '{}' (activity, service, provider, receiver)",
            other
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = runtime::load_config(args.config.as_deref())?;

    match args.command {
        Command::Inspect { manifest } => commands::inspect(&manifest),
        Command::Resolve {
            plugins,
            package,
            class,
            action,
            categories,
            authority,
            kind,
            all,
        } => {
            let query = commands::ResolveQuery {
                package,
                class,
                action,
                categories,
                authority,
                kind,
                all,
            };
            commands::resolve(config, &plugins, query).await
        }
        Command::Launch {
            plugins,
            target,
            service,
        } => commands::launch(config, &plugins, &target, service).await,
        Command::Config { save } => commands::show_config(&config, save),
    }
}

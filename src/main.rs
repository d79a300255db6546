use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use groundwork::cache::ResourceCache;
use groundwork::engine::{Orchestrator, PauseGate};
use groundwork::loader::{FsLoader, HttpLoader, ResourceLoader, StaticLoader};
use groundwork::types::StartupManifest;
use groundwork::units::PreloadFactory;
use groundwork::Config;

#[derive(Parser)]
#[command(name = "groundwork")]
#[command(about = "Deduplicated resource loading and phased subsystem startup", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[arg(short, long, help = "Path to the startup manifest (YAML or JSON)")]
        manifest: Option<PathBuf>,
        #[arg(long, help = "Serve resource keys from this directory")]
        assets: Option<PathBuf>,
        #[arg(long, help = "Serve resource keys from this HTTP base URL")]
        http_base: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            manifest,
            assets,
            http_base,
        } => run_startup(manifest, assets, http_base).await?,
    }

    Ok(())
}

async fn run_startup(
    manifest: Option<PathBuf>,
    assets: Option<PathBuf>,
    http_base: Option<String>,
) -> Result<()> {
    let config = Config::from_env();

    let manifest_path = manifest
        .or_else(|| config.manifest_path.map(PathBuf::from))
        .context("no manifest given; pass --manifest or set GROUNDWORK_MANIFEST")?;
    let manifest = StartupManifest::from_path(&manifest_path).await?;

    let asset_root = assets.or_else(|| config.asset_root.map(PathBuf::from));
    let http_base = http_base.or(config.http_base);

    let loader: Arc<dyn ResourceLoader> = if let Some(root) = asset_root {
        println!("Serving resources from {}", root.display());
        Arc::new(FsLoader::new(root))
    } else if let Some(base) = http_base {
        println!("Serving resources from {}", base);
        Arc::new(HttpLoader::new(base))
    } else {
        println!("No resource backend configured, using built-in demo payloads");
        Arc::new(demo_loader(&manifest))
    };

    let cache = Arc::new(ResourceCache::new(loader));
    let mut orchestrator = Orchestrator::from_manifest(&manifest, PauseGate::new());

    let factory = PreloadFactory::new(cache.clone());
    orchestrator.spawn(&manifest.units, &factory);

    println!(
        "Starting {} unit(s) from {}",
        manifest.units.len(),
        manifest_path.display()
    );
    orchestrator.run_all().await;

    let snapshot = orchestrator.units_by_group();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    println!("Loaded resources: {:?}", cache.loaded_keys());

    Ok(())
}

fn demo_loader(manifest: &StartupManifest) -> StaticLoader {
    let mut loader = StaticLoader::new();
    for decl in &manifest.units {
        for key in &decl.resources {
            loader = loader.with_entry(key.as_str(), format!("demo payload for {}", key));
        }
    }
    loader
}

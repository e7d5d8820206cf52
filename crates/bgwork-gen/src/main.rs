use std::path::PathBuf;

use anyhow::{Context, Result};
use bgwork_core::BgWorkConfig;
use clap::Parser;
use tracing::info;

mod codegen;
mod manifest;

/// Generate the job identifier module and register the identifiers with the
/// iOS manifest.
///
/// Every option falls back to the `[generator]` section of bgwork.toml; the
/// identifier list falls back to the keys of its `[jobs]` table.
#[derive(Parser, Debug)]
#[command(name = "bgwork-gen", version)]
struct Cli {
    /// Config file (default: $BGWORK_CONFIG, then ~/.bgwork/bgwork.toml).
    #[arg(long)]
    config: Option<String>,

    /// Comma-separated job identifiers, e.g. `DATA_SYNC,UPLOAD`.
    #[arg(long, value_delimiter = ',')]
    job_identifiers: Vec<String>,

    /// Module path of the generated file, e.g. `app::jobs`.
    #[arg(long)]
    package_name: Option<String>,

    /// Name of the generated enum.
    #[arg(long)]
    type_name: Option<String>,

    /// Directory the module path is resolved against.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Info.plist to inject `BGTaskSchedulerPermittedIdentifiers` into.
    #[arg(long)]
    manifest_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BgWorkConfig::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .init();

    run(cli, &config)
}

fn run(cli: Cli, config: &BgWorkConfig) -> Result<()> {
    let generator = &config.generator;

    let raw_ids: Vec<String> = if cli.job_identifiers.is_empty() {
        config.jobs.keys().cloned().collect()
    } else {
        cli.job_identifiers
    };
    let ids = codegen::parse_identifiers(&raw_ids)?;

    let manifest_path = cli
        .manifest_path
        .or_else(|| generator.manifest_path.as_ref().map(PathBuf::from));
    // Check the manifest before writing anything.
    if let Some(path) = &manifest_path {
        manifest::validate_manifest_path(path)?;
    }

    let package_name = cli
        .package_name
        .or_else(|| generator.package_name.clone())
        .context("--package-name is required (or [generator] package_name)")?;
    let type_name = cli
        .type_name
        .unwrap_or_else(|| config.type_name().to_string());
    let output_dir = cli
        .output_dir
        .or_else(|| generator.output_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    info!(count = ids.len(), %package_name, %type_name, "generating job identifiers");
    let path = codegen::write_module(&output_dir, &package_name, &type_name, &ids)?;
    println!("wrote {}", path.display());

    if let Some(path) = manifest_path {
        if manifest::inject_identifiers(&path, &ids)? {
            println!("updated {}", path.display());
        }
    }
    Ok(())
}

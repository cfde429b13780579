//! Command handlers.

use anyhow::{Context, Result};
use console::style;
use hoard_api::{AppState, RouterOptions, create_router};
use hoard_cache::{ResolutionSource, fingerprint_file};
use hoard_core::{ArtifactRef, StagedFile};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::bootstrap;
use crate::config::HoardConfig;

/// Run the HTTP service until Ctrl-C.
pub async fn serve(config: &HoardConfig) -> Result<()> {
    let services = bootstrap::build(config).await?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;

    if config.warm_on_start {
        match services.coordinator.reconcile().await? {
            Some(entries) => info!(entries, "Warmed fast cache from snapshot"),
            None => info!("No snapshot yet, starting cold"),
        }
    }

    let state = AppState::new(services.coordinator, services.blobs, &config.upload_dir)
        .with_link_ttl(Duration::from_secs(config.link_ttl_secs));
    let router = create_router(
        Arc::new(state),
        RouterOptions {
            static_dir: config.static_dir.as_deref(),
            max_upload_bytes: Some(config.max_upload_bytes),
        },
    );

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!(addr = %listener.local_addr()?, "Hoard listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Print the content key of a file.
pub async fn hash(path: &Path) -> Result<()> {
    let key = fingerprint_file(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    println!("{}  {}", key, path.display());
    Ok(())
}

/// Resolve a local file, archiving it when its content is new.
pub async fn archive(config: &HoardConfig, path: &Path, name: Option<String>) -> Result<()> {
    // never delete the caller's own file
    let mut config = config.clone();
    config.remove_source = false;
    let services = bootstrap::build(&config).await?;

    let name = match name {
        Some(name) => ArtifactRef::new(name)?,
        None => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .context("Path has no usable file name")?;
            ArtifactRef::from_upload_name(file_name)?
        }
    };

    let key = fingerprint_file(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let resolution = services
        .coordinator
        .resolve_or_archive(&key, &StagedFile::new(path, name))
        .await?;

    let object_key = services.coordinator.pipeline().object_key(&resolution.artifact);
    let link = services
        .blobs
        .signed_download_url(
            &object_key,
            Duration::from_secs(config.link_ttl_secs),
            Some(&object_key),
        )
        .await?;

    let origin = match resolution.source {
        ResolutionSource::FastCache | ResolutionSource::Snapshot => "already archived",
        ResolutionSource::Archived => "archived",
    };
    println!(
        "{} {} {}",
        style("✓").green(),
        style(&resolution.artifact).bold(),
        style(origin).dim()
    );
    println!("  key:  {}", key);
    println!("  link: {}", link);
    Ok(())
}

/// Print the durable snapshot document.
pub async fn show_snapshot(config: &HoardConfig) -> Result<()> {
    let services = bootstrap::build(config).await?;
    let snapshots = services.coordinator.snapshots();

    match snapshots.load().await? {
        Some(snapshot) => {
            println!(
                "{} {} ({} entries)",
                style("●").cyan(),
                snapshots.key(),
                snapshot.len()
            );
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => println!("{} No snapshot at {}", style("!").yellow(), snapshots.key()),
    }
    Ok(())
}

/// Show effective configuration.
pub fn show_config(config: &HoardConfig, explicit: Option<&Path>) -> Result<()> {
    println!("Current configuration:");
    print!("{}", serde_yaml::to_string(&config.redacted())?);

    match explicit.map(Path::to_path_buf).or_else(HoardConfig::config_path) {
        Some(path) if path.exists() => println!("\nConfig file: {}", path.display()),
        Some(path) => println!("\nConfig file: {} (not found, using defaults)", path.display()),
        None => println!("\nConfig file: (none)"),
    }
    Ok(())
}

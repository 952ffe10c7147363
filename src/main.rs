// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use quadrant_detector::{
    api::{serve, AppState},
    cli::Cli,
    config::ServiceConfig,
    monitoring::init_logging,
    version,
    vision::{DetectionModelConfig, DetectionModelManager},
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    println!("🚀 Starting {}...\n", version::get_version_string());

    let config = ServiceConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;

    let log_file = init_logging(&config.log_path)?;
    println!("📝 Logging to {}", log_file.display());
    tracing::info!("Loaded configuration from {}", cli.config.display());

    println!("🧠 Loading detection model {}...", config.detect_weight.display());
    let model_config = DetectionModelConfig::from(&config);
    let manager = tokio::task::spawn_blocking(move || DetectionModelManager::load(model_config))
        .await
        .context("Model loading task panicked")?
        .context("Failed to load detection model")?;
    println!(
        "✅ Model ready: {} on {} ({} classes)",
        manager.model_info().name,
        manager.model_info().device,
        manager.class_names().len()
    );

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    println!("🌐 Listening on http://{}", addr);

    let state = AppState::new(Arc::new(manager), &config);
    serve(listener, state, shutdown_signal()).await?;

    println!("👋 Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

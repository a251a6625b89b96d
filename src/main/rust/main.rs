use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use multistream_relay::{
    serve_metrics, CommandBuilder, Config, MediaLibrary, PrometheusReporter, SessionManager,
    StreamRequest, TokioProcessLauncher, TracingListener,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging
    let filter = if config.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    info!("Starting multistream-relay v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }

    let library = MediaLibrary::new(config.media_dir.clone());

    if config.list_videos {
        let videos = library.list_videos()?;
        if videos.is_empty() {
            println!("No .mp4 or .flv videos in {}", library.root().display());
        }
        for video in videos {
            println!("{}", video.display());
        }
        return Ok(());
    }

    let source = resolve_source(&config, &library)?;
    let request =
        StreamRequest::new(source, config.destinations())?.with_aspect(config.aspect_mode());
    let start_at = config.start_time()?;

    // Initialize metrics
    PrometheusReporter::init_metrics()?;

    // Create infrastructure implementations (dependency injection)
    let launcher = Arc::new(TokioProcessLauncher::with_stop_grace(config.stop_grace()));
    let listener = Arc::new(TracingListener::new());
    let metrics_reporter = Arc::new(PrometheusReporter::new());

    // Create application service
    let manager = Arc::new(
        SessionManager::new(
            CommandBuilder::new(config.ffmpeg_path.clone()),
            launcher,
            listener,
            metrics_reporter,
        )
        .with_log_capacity(config.log_lines),
    );

    // Start metrics server
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let metrics_server = tokio::spawn(serve_metrics(
        config.metrics_port,
        manager.clone(),
        async move {
            shutdown_rx.await.ok();
        },
    ));

    info!("-------------------------------------------------------");
    info!("   Video:        {}", request.source_path().display());
    info!("   Destinations: {:?}", request.destinations().platforms());
    info!("   Aspect:       {}", request.aspect().as_str());
    info!("   Metrics:      http://0.0.0.0:{}/metrics", config.metrics_port);
    info!("-------------------------------------------------------");

    // Start streaming (use case)
    let mut handle = match start_at {
        Some(start_at) => manager.schedule_start(request, start_at).await,
        None => manager.start(request).await,
    };

    let session_id = handle.id();

    // Wait for the stream to end or for Ctrl+C
    tokio::select! {
        status = handle.wait() => {
            info!(session_id = %session_id, status = %status, "Session finished");
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Shutdown signal received (Ctrl+C)"),
                Err(err) => error!("Failed to listen for shutdown signal: {}", err),
            }
            let stopped = manager.stop_all().await;
            info!("Stopped {} session(s)", stopped);
        }
    }

    // Signal shutdown to metrics server
    let _ = shutdown_tx.send(());
    if let Err(e) = metrics_server.await {
        warn!("Metrics server task failed: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

fn resolve_source(config: &Config, library: &MediaLibrary) -> Result<PathBuf> {
    if let Some(upload) = &config.import {
        let file_name = upload
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("Import path has no file name: {}", upload.display()))?;
        let bytes = std::fs::read(upload)
            .with_context(|| format!("Failed to read {}", upload.display()))?;
        return Ok(library.import(&file_name, &bytes)?);
    }

    match &config.video_path {
        Some(video) => Ok(library.resolve(video)),
        None => anyhow::bail!(
            "No video selected. Pass --video or --import (see --list-videos for {})",
            library.root().display()
        ),
    }
}

//! Implementation of the `storysync serve` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::mpsc;

use crate::adapters::http::{AppState, CardsHttpServer};
use crate::cli::AppContext;
use crate::infrastructure::watcher::StoryWatcher;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn execute(ctx: AppContext) -> Result<()> {
    ctx.files()
        .ensure_files()
        .await
        .context("Failed to create store files")?;

    let outcome = ctx.controller.bootstrap().await.context("Initial sync failed")?;
    tracing::info!(?outcome, data_dir = %ctx.files().data_dir().display(), "stores reconciled");

    let (tx, rx) = mpsc::unbounded_channel();
    let watcher = StoryWatcher::start(ctx.files(), tx)?;
    let controller = Arc::clone(&ctx.controller);
    let sync_task = tokio::spawn(async move { controller.run(rx).await });

    let state = AppState::new(ctx.card_service(), Arc::clone(&ctx.memory));
    CardsHttpServer::new(state, ctx.config.server.clone())
        .serve_with_shutdown(shutdown_signal())
        .await?;

    // Closing the event channel lets the controller finish any pending pass.
    drop(watcher);
    if let Err(e) = sync_task.await {
        tracing::warn!(error = %e, "sync task ended abnormally");
    }
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }
}

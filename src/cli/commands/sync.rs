//! Implementation of the `storysync sync` command.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::cli::AppContext;
use crate::services::BootstrapOutcome;

#[derive(Debug, Serialize)]
pub struct SyncOutput {
    pub ok: bool,
    pub data_dir: String,
    pub outcome: String,
    pub cards: usize,
}

impl CommandOutput for SyncOutput {
    fn to_human(&self) -> String {
        format!(
            "{} ({} card(s)) in {}",
            self.outcome, self.cards, self.data_dir
        )
    }
}

pub async fn execute(ctx: AppContext, json_mode: bool) -> Result<()> {
    ctx.files()
        .ensure_files()
        .await
        .context("Failed to create store files")?;

    let outcome = ctx.controller.bootstrap().await.context("Initial sync failed")?;
    let (description, cards) = match outcome {
        BootstrapOutcome::Seeded => ("Initialized sample data", 1),
        BootstrapOutcome::FromNarrative { cards } => ("Converted narrative into cards", cards),
        BootstrapOutcome::Merged { cards } => ("Synchronized stores", cards),
    };

    let result = SyncOutput {
        ok: true,
        data_dir: ctx.files().data_dir().display().to_string(),
        outcome: description.to_string(),
        cards,
    };
    output(&result, json_mode);
    Ok(())
}

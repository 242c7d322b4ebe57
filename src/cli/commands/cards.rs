//! Implementation of the `storysync cards` command.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{cards_table, output, CommandOutput};
use crate::cli::AppContext;
use crate::domain::models::Card;

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CardListOutput {
    pub cards: Vec<Card>,
}

impl CommandOutput for CardListOutput {
    fn to_human(&self) -> String {
        if self.cards.is_empty() {
            return "No cards.".to_string();
        }
        cards_table(&self.cards)
    }
}

pub async fn execute(ctx: AppContext, json_mode: bool) -> Result<()> {
    let cards = ctx.files().read_index().await;
    output(&CardListOutput { cards }, json_mode);
    Ok(())
}

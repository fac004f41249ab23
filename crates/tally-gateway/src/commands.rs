//! The interactive `!stock` query — a thin read path, not part of the write
//! pipeline.

use std::sync::Arc;

use tally_core::{
  chat::{ChatApi, InboundMessage},
  store::EconomyStore,
};

use crate::error::Error;

/// The command prefix a message must start with to be treated as a query.
pub const STOCK_PREFIX: &str = "!stock";

/// Whether `content` invokes the stock query.
pub fn is_stock_query(content: &str) -> bool {
  let trimmed = content.trim();
  trimmed == STOCK_PREFIX
    || trimmed
      .strip_prefix(STOCK_PREFIX)
      .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

/// Answer a `!stock [item…]` query with a reply to the asking message.
/// No argument lists every aggregate; an argument returns one value.
pub async fn answer_stock<S, C>(
  store: &Arc<S>,
  chat: &Arc<C>,
  message: &InboundMessage,
) -> Result<(), Error>
where
  S: EconomyStore,
  C: ChatApi,
{
  let args: Vec<&str> = message
    .content
    .trim()
    .split_whitespace()
    .skip(1)
    .collect();

  let text = if args.is_empty() {
    let levels = store.list_stock().await.map_err(Error::store)?;
    if levels.is_empty() {
      "No stock data available.".to_string()
    } else {
      levels
        .iter()
        .map(|l| format!("{}: {}", l.item, l.quantity))
        .collect::<Vec<_>>()
        .join("\n")
    }
  } else {
    let item = args.join(" ").to_lowercase();
    let quantity = store.stock_level(&item).await.map_err(Error::store)?;
    format!("{item}: {quantity}")
  };

  chat
    .reply(message.channel_id, message.id, &text)
    .await
    .map_err(Error::chat)
}

//! The event router — glue from one inbound message to applied aggregates
//! and refreshed summaries.
//!
//! Per message: compose the display text, short-circuit interactive
//! queries, run the topic extractors (inventory is gated on the community's
//! configured log channel), apply each event under its derived key, then
//! refresh each topic that saw at least one event. Every failure past
//! extraction is isolated: a failing event never blocks its siblings, a
//! failing refresh never blocks the message.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;

use tally_core::{
  chat::{ChatApi, InboundMessage},
  event::Event,
  key::EventKey,
  store::EconomyStore,
  topic::Topic,
};
use tally_extract::{
  BillingExtractor, Extractor as _, InventoryExtractor, LedgerExtractor,
};

use crate::{
  announce,
  commands,
  error::Error,
  reconcile::SummaryReconciler,
  topics::TopicDirectory,
};

pub struct Pipeline<S, C> {
  store:      Arc<S>,
  chat:       Arc<C>,
  topics:     Arc<TopicDirectory>,
  app_name:   String,
  inventory:  InventoryExtractor,
  billing:    BillingExtractor,
  ledger:     LedgerExtractor,
  reconciler: SummaryReconciler<S, C>,
}

impl<S, C> Pipeline<S, C>
where
  S: EconomyStore,
  C: ChatApi,
{
  pub fn new(
    store: Arc<S>,
    chat: Arc<C>,
    topics: Arc<TopicDirectory>,
    app_name: String,
  ) -> Self {
    let reconciler = SummaryReconciler::new(
      store.clone(),
      chat.clone(),
      topics.clone(),
      app_name.clone(),
    );
    Pipeline {
      store,
      chat,
      topics,
      app_name,
      inventory: InventoryExtractor::default(),
      billing: BillingExtractor::default(),
      ledger: LedgerExtractor::default(),
      reconciler,
    }
  }

  /// Process one inbound message end to end. Never fails outward: every
  /// error inside the write pipeline is logged and contained.
  pub async fn handle(&self, message: &InboundMessage) {
    if message.author_is_bot {
      return;
    }
    let Some(text) = message.display_text() else {
      return;
    };

    // Interactive query path: answer and stop.
    if commands::is_stock_query(&message.content) {
      if let Err(e) =
        commands::answer_stock(&self.store, &self.chat, message).await
      {
        tracing::warn!(message = %message.id, error = %e, "stock query failed");
      }
      return;
    }

    let community = message.community_id;
    let topics = self.topics.get(community).await;

    // Billing and ledger extraction always run; inventory only for the
    // community's configured log channel.
    let mut events = self.billing.extract(&text);
    events.extend(self.ledger.extract(&text));
    if topics.inventory_log_channel == Some(message.channel_id) {
      events.extend(self.inventory.extract(&text));
    }
    if events.is_empty() {
      return;
    }

    let now = Utc::now();
    let mut indexes: HashMap<Topic, usize> = HashMap::new();
    let mut touched: Vec<Topic> = Vec::new();

    for event in &events {
      let topic = event.topic();
      let index = indexes.entry(topic).or_insert(0);
      let key = EventKey::derive(message.id, topic, *index);
      *index += 1;

      if !touched.contains(&topic) {
        touched.push(topic);
      }

      match self.apply(event, now, key).await {
        Ok(()) => {
          if let Some(channel) = topics.announce_channel {
            if let Err(e) =
              announce::announce(&*self.chat, channel, &self.app_name, event)
                .await
            {
              tracing::warn!(%key, error = %e, "announcement failed");
            }
          }
        }
        Err(e) => {
          tracing::warn!(
            message = %message.id, %topic, %key, error = %e,
            "event application failed"
          );
        }
      }
    }

    for topic in touched {
      self.reconciler.refresh(community, topic).await;
    }
  }

  async fn apply(
    &self,
    event: &Event,
    now: chrono::DateTime<Utc>,
    key: EventKey,
  ) -> Result<(), Error> {
    match event {
      Event::Inventory(inner) => {
        self.store.apply_inventory(inner, now, key).await
      }
      Event::Bill(inner) => self.store.apply_bill(inner, now, key).await,
      Event::Ledger(inner) => self.store.apply_ledger(inner, now, key).await,
    }
    .map_err(Error::store)
  }
}

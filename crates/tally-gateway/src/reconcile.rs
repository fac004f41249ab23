//! Summary reconciliation — one live "dashboard" message per (community,
//! topic).
//!
//! The refresh path is a read-modify-write over an external resource: read
//! the pointer, try to edit the referenced message, create a replacement if
//! the edit fails for any reason. Two refreshes racing through the
//! edit-fails branch would each create a message, so refreshes are
//! serialized per (community, topic) with a keyed async mutex. This is the
//! only lock in the system.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use tokio::sync::Mutex;

use tally_core::{
  chat::{ChatApi, Embed, Outbound},
  id::CommunityId,
  store::EconomyStore,
  topic::Topic,
};

use crate::{
  error::Error,
  format,
  topics::TopicDirectory,
};

pub struct SummaryReconciler<S, C> {
  store:    Arc<S>,
  chat:     Arc<C>,
  topics:   Arc<TopicDirectory>,
  app_name: String,
  locks:    std::sync::Mutex<HashMap<(CommunityId, Topic), Arc<Mutex<()>>>>,
}

impl<S, C> SummaryReconciler<S, C>
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
    SummaryReconciler {
      store,
      chat,
      topics,
      app_name,
      locks: std::sync::Mutex::new(HashMap::new()),
    }
  }

  /// Bring the live summary for `(community, topic)` in line with current
  /// aggregate state. Failures are logged and abandoned for this cycle;
  /// the next refresh starts clean.
  pub async fn refresh(&self, community: CommunityId, topic: Topic) {
    if let Err(e) = self.try_refresh(community, topic).await {
      tracing::warn!(%community, %topic, error = %e, "summary refresh failed");
    }
  }

  fn lock_for(&self, community: CommunityId, topic: Topic) -> Arc<Mutex<()>> {
    let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
    locks.entry((community, topic)).or_default().clone()
  }

  async fn try_refresh(
    &self,
    community: CommunityId,
    topic: Topic,
  ) -> Result<(), Error> {
    let Some(channel) = self.topics.get(community).await.summary_channel(topic)
    else {
      return Ok(());
    };

    let lock = self.lock_for(community, topic);
    let _guard = lock.lock().await;

    let embed = self.render(topic).await?;
    let content = Outbound::Embed(embed);

    if let Some(existing) =
      self.store.summary_pointer(community, topic).await.map_err(Error::store)?
    {
      match self.chat.edit(channel, existing, &content).await {
        Ok(()) => return Ok(()),
        Err(e) => {
          // Message or channel gone, or transport hiccup: recreate below.
          tracing::debug!(
            %community, %topic, %existing, error = %e,
            "summary edit failed; recreating"
          );
        }
      }
    }

    let created =
      self.chat.send(channel, &content).await.map_err(Error::chat)?;
    self
      .store
      .set_summary_pointer(community, topic, created)
      .await
      .map_err(Error::store)?;
    Ok(())
  }

  /// Build the summary embed from the current aggregate snapshot.
  async fn render(&self, topic: Topic) -> Result<Embed, Error> {
    let body = match topic {
      Topic::Inventory => {
        let levels = self.store.list_stock().await.map_err(Error::store)?;
        format!("📊 Live Inventory\n\n{}", format::stock_body(&levels))
      }
      Topic::Billing => {
        let summaries =
          self.store.bill_summaries().await.map_err(Error::store)?;
        format!("🧾 Billing Summary\n\n{}", format::bills_body(&summaries))
      }
      Topic::Ledger => {
        let now = Utc::now();
        let balances = self.store.list_balances().await.map_err(Error::store)?;
        let mut entries = Vec::with_capacity(balances.len());
        for balance in balances {
          let windows = self
            .store
            .ledger_windows(&balance.business, now)
            .await
            .map_err(Error::store)?;
          entries.push((balance, windows));
        }
        format!("🏦 Ledger Summary\n\n{}", format::ledger_body(&entries))
      }
    };
    Ok(Embed::new(self.app_name.clone(), body))
  }
}

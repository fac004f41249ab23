//! Per-community topic-channel configuration.
//!
//! Channel mappings live in an explicit directory passed by reference into
//! the pipeline, with a reload operation so mappings can change without a
//! restart.

use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;
use tokio::sync::RwLock;

use tally_core::{id::ChannelId, id::CommunityId, topic::Topic};

use crate::{GatewayConfig, error::Error};

/// Channel mappings for one community. Every field is optional: an unset
/// summary channel disables that topic's live summary, an unset log channel
/// disables inventory extraction for the community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommunityTopics {
  /// Channel whose messages are run through inventory extraction.
  pub inventory_log_channel: Option<ChannelId>,
  /// Live inventory summary channel.
  pub stock_channel:         Option<ChannelId>,
  /// Live billing summary channel.
  pub bill_channel:          Option<ChannelId>,
  /// Live ledger summary channel.
  pub ledger_channel:        Option<ChannelId>,
  /// Per-event bill/ledger announcement channel.
  pub announce_channel:      Option<ChannelId>,
}

impl CommunityTopics {
  /// Where `topic`'s live summary lives for this community, if anywhere.
  pub fn summary_channel(&self, topic: Topic) -> Option<ChannelId> {
    match topic {
      Topic::Inventory => self.stock_channel,
      Topic::Billing => self.bill_channel,
      Topic::Ledger => self.ledger_channel,
    }
  }
}

/// Parse the raw `[communities.<id>]` config map, whose keys are community
/// ids spelled as TOML table names.
pub fn parse_communities(
  raw: &HashMap<String, CommunityTopics>,
) -> Result<HashMap<CommunityId, CommunityTopics>, Error> {
  raw
    .iter()
    .map(|(id, topics)| {
      id.parse::<CommunityId>()
        .map(|id| (id, topics.clone()))
        .map_err(|_| Error::MalformedCommunityId(id.clone()))
    })
    .collect()
}

/// The reloadable directory of community topic mappings.
pub struct TopicDirectory {
  /// Config file to re-read on [`TopicDirectory::reload`]; `None` in tests.
  path:        Option<PathBuf>,
  communities: RwLock<HashMap<CommunityId, CommunityTopics>>,
}

impl TopicDirectory {
  pub fn new(communities: HashMap<CommunityId, CommunityTopics>) -> Self {
    TopicDirectory { path: None, communities: RwLock::new(communities) }
  }

  pub fn with_reload_path(
    path: PathBuf,
    communities: HashMap<CommunityId, CommunityTopics>,
  ) -> Self {
    TopicDirectory { path: Some(path), communities: RwLock::new(communities) }
  }

  /// The mappings for `community`; a community with no config entry gets the
  /// all-disabled default.
  pub async fn get(&self, community: CommunityId) -> CommunityTopics {
    self
      .communities
      .read()
      .await
      .get(&community)
      .cloned()
      .unwrap_or_default()
  }

  /// Re-read the config file and swap in the new community map. Returns the
  /// number of configured communities.
  pub async fn reload(&self) -> Result<usize, Error> {
    let Some(path) = &self.path else {
      return Err(Error::BadRequest("no config file to reload".to_string()));
    };
    let config = GatewayConfig::load(path)?;
    let parsed = parse_communities(&config.communities)?;
    let count = parsed.len();
    *self.communities.write().await = parsed;
    Ok(count)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn topics(stock: u64) -> CommunityTopics {
    CommunityTopics {
      stock_channel: Some(ChannelId(stock)),
      ..CommunityTopics::default()
    }
  }

  #[tokio::test]
  async fn unknown_community_gets_defaults() {
    let dir = TopicDirectory::new(HashMap::new());
    assert_eq!(dir.get(CommunityId(1)).await, CommunityTopics::default());
  }

  #[tokio::test]
  async fn known_community_resolves() {
    let mut map = HashMap::new();
    map.insert(CommunityId(1), topics(42));
    let dir = TopicDirectory::new(map);
    assert_eq!(
      dir.get(CommunityId(1)).await.summary_channel(Topic::Inventory),
      Some(ChannelId(42))
    );
  }

  #[test]
  fn community_keys_must_be_numeric() {
    let mut raw = HashMap::new();
    raw.insert("not-a-number".to_string(), CommunityTopics::default());
    assert!(matches!(
      parse_communities(&raw),
      Err(Error::MalformedCommunityId(_))
    ));
  }

  #[tokio::test]
  async fn reload_without_path_is_rejected() {
    let dir = TopicDirectory::new(HashMap::new());
    assert!(matches!(dir.reload().await, Err(Error::BadRequest(_))));
  }

  #[tokio::test]
  async fn reload_swaps_mappings_from_disk() {
    let path = std::env::temp_dir().join("tally-topics-reload-test.toml");
    let write = |stock: u64| {
      std::fs::write(
        &path,
        format!(
          "host = \"127.0.0.1\"\nport = 0\nstore_path = \":memory:\"\n\
           app_name = \"Tally\"\nwebhook_secret = \"s\"\n\
           [chat]\napi_base = \"http://chat.test\"\nbot_token = \"t\"\n\
           [communities.1]\nstock_channel = {stock}\n"
        ),
      )
      .unwrap()
    };

    write(42);
    let config = GatewayConfig::load(&path).unwrap();
    let dir = TopicDirectory::with_reload_path(
      path.clone(),
      parse_communities(&config.communities).unwrap(),
    );
    assert_eq!(dir.get(CommunityId(1)).await, topics(42));

    write(43);
    assert_eq!(dir.reload().await.unwrap(), 1);
    assert_eq!(dir.get(CommunityId(1)).await, topics(43));

    std::fs::remove_file(&path).ok();
  }
}

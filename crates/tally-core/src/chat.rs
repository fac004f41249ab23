//! Chat platform interface — inbound message shape and the outbound trait.
//!
//! The pipeline depends on [`ChatApi`], not on any concrete transport.
//! `tally-gateway` provides the REST implementation and the webhook that
//! produces [`InboundMessage`] values.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, CommunityId, MessageId};

// ─── Inbound ─────────────────────────────────────────────────────────────────

/// The first rich-content block attached to a message. Only the title and
/// description are consumed; anything else the platform sends is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl Embed {
  pub fn new(
    title: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    Embed {
      title:       Some(title.into()),
      description: Some(description.into()),
    }
  }
}

/// One chat message as delivered by the platform. Only the fields the
/// pipeline consumes are modelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
  pub id:            MessageId,
  pub channel_id:    ChannelId,
  pub community_id:  CommunityId,
  #[serde(default)]
  pub author_is_bot: bool,
  #[serde(default)]
  pub content:       String,
  #[serde(default)]
  pub embeds:        Vec<Embed>,
}

impl InboundMessage {
  /// The text the extractors see: the raw body if present, otherwise the
  /// first embed's title and description joined by a newline. `None` when
  /// the message carries no usable text at all.
  pub fn display_text(&self) -> Option<String> {
    if !self.content.is_empty() {
      return Some(self.content.clone());
    }
    let embed = self.embeds.first()?;
    let parts: Vec<&str> = [embed.title.as_deref(), embed.description.as_deref()]
      .into_iter()
      .flatten()
      .filter(|s| !s.is_empty())
      .collect();
    if parts.is_empty() {
      None
    } else {
      Some(parts.join("\n"))
    }
  }
}

// ─── Outbound ────────────────────────────────────────────────────────────────

/// What to put in an outbound message: plain text or a single embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
  Text(String),
  Embed(Embed),
}

/// Abstraction over the chat platform's outbound REST surface.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime.
pub trait ChatApi: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Post a new message to `channel` and return its platform-assigned id.
  fn send(
    &self,
    channel: ChannelId,
    content: &Outbound,
  ) -> impl Future<Output = Result<MessageId, Self::Error>> + Send;

  /// Replace the content of an existing message in place.
  fn edit(
    &self,
    channel: ChannelId,
    message: MessageId,
    content: &Outbound,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Post a plain-text reply referencing `to`.
  fn reply(
    &self,
    channel: ChannelId,
    to: MessageId,
    text: &str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

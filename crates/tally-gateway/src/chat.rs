//! REST implementation of [`ChatApi`].
//!
//! Talks to the platform's message API: `POST /channels/{id}/messages` to
//! create, `PATCH /channels/{id}/messages/{id}` to edit. The platform
//! serialises message ids as decimal strings on the wire.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tally_core::{
  chat::{ChatApi, Embed, Outbound},
  id::{ChannelId, MessageId},
};

use crate::ChatConfig;

#[derive(Debug, Error)]
pub enum ChatError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("malformed message id in response: {0:?}")]
  MalformedId(String),
}

/// The outbound half of the chat platform connection.
#[derive(Clone)]
pub struct RestChat {
  http:     reqwest::Client,
  api_base: String,
  token:    String,
}

// ─── Wire payloads ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessageReference {
  message_id: String,
}

#[derive(Serialize)]
struct MessagePayload<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  content:           Option<&'a str>,
  #[serde(skip_serializing_if = "<[_]>::is_empty")]
  embeds:            &'a [&'a Embed],
  #[serde(skip_serializing_if = "Option::is_none")]
  message_reference: Option<MessageReference>,
}

impl<'a> MessagePayload<'a> {
  fn from_outbound(content: &'a Outbound, embed_slot: &'a [&'a Embed]) -> Self {
    match content {
      Outbound::Text(text) => MessagePayload {
        content:           Some(text),
        embeds:            &[],
        message_reference: None,
      },
      Outbound::Embed(_) => MessagePayload {
        content:           None,
        embeds:            embed_slot,
        message_reference: None,
      },
    }
  }
}

#[derive(Deserialize)]
struct MessageCreated {
  id: String,
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl RestChat {
  pub fn new(config: &ChatConfig) -> Self {
    RestChat {
      http:     reqwest::Client::new(),
      api_base: config.api_base.trim_end_matches('/').to_string(),
      token:    config.bot_token.clone(),
    }
  }

  /// Probe the session endpoint. Called once at startup; failure here is
  /// the one fatal error in the system.
  pub async fn verify_session(&self) -> Result<(), ChatError> {
    self
      .http
      .get(format!("{}/users/@me", self.api_base))
      .header("authorization", self.auth_value())
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }

  fn auth_value(&self) -> String {
    format!("Bot {}", self.token)
  }

  fn messages_url(&self, channel: ChannelId) -> String {
    format!("{}/channels/{}/messages", self.api_base, channel)
  }
}

impl ChatApi for RestChat {
  type Error = ChatError;

  async fn send(
    &self,
    channel: ChannelId,
    content: &Outbound,
  ) -> Result<MessageId, ChatError> {
    let embed_slot: [&Embed; 1];
    let payload = match content {
      Outbound::Embed(embed) => {
        embed_slot = [embed];
        MessagePayload::from_outbound(content, &embed_slot)
      }
      Outbound::Text(_) => MessagePayload::from_outbound(content, &[]),
    };

    let created: MessageCreated = self
      .http
      .post(self.messages_url(channel))
      .header("authorization", self.auth_value())
      .json(&payload)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    created
      .id
      .parse::<MessageId>()
      .map_err(|_| ChatError::MalformedId(created.id))
  }

  async fn edit(
    &self,
    channel: ChannelId,
    message: MessageId,
    content: &Outbound,
  ) -> Result<(), ChatError> {
    let embed_slot: [&Embed; 1];
    let payload = match content {
      Outbound::Embed(embed) => {
        embed_slot = [embed];
        MessagePayload::from_outbound(content, &embed_slot)
      }
      Outbound::Text(_) => MessagePayload::from_outbound(content, &[]),
    };

    self
      .http
      .patch(format!("{}/{}", self.messages_url(channel), message))
      .header("authorization", self.auth_value())
      .json(&payload)
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }

  async fn reply(
    &self,
    channel: ChannelId,
    to: MessageId,
    text: &str,
  ) -> Result<(), ChatError> {
    let payload = MessagePayload {
      content:           Some(text),
      embeds:            &[],
      message_reference: Some(MessageReference { message_id: to.to_string() }),
    };

    self
      .http
      .post(self.messages_url(channel))
      .header("authorization", self.auth_value())
      .json(&payload)
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }
}

//! Webhook gateway for Tally.
//!
//! Exposes an axum [`Router`] with two authenticated endpoints:
//!
//! - `POST /events` — one inbound chat message per delivery, JSON body.
//!   Deliveries are at-least-once; deduplication happens at application
//!   time via idempotency keys, never here.
//! - `POST /admin/reload` — re-read community topic mappings from disk.
//!
//! Outbound chat traffic goes through [`chat::RestChat`].

pub mod announce;
pub mod auth;
pub mod chat;
pub mod commands;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod reconcile;
pub mod topics;

pub use error::Error;

use std::{collections::HashMap, path::Path, path::PathBuf, sync::Arc};

use axum::{
  Json,
  Router,
  body::Body,
  extract::{Request, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::post,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use tally_core::{chat::ChatApi, chat::InboundMessage, store::EconomyStore};

use auth::{AuthConfig, verify_bearer};
use pipeline::Pipeline;
use topics::{CommunityTopics, TopicDirectory};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Outbound chat platform connection settings.
#[derive(Deserialize, Clone)]
pub struct ChatConfig {
  /// REST API base, e.g. `https://chat.example.com/api/v1`.
  pub api_base:  String,
  pub bot_token: String,
}

/// Runtime configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct GatewayConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  /// Title carried on every summary and announcement embed.
  pub app_name:       String,
  pub webhook_secret: String,
  pub chat:           ChatConfig,
  #[serde(default)]
  pub communities:    HashMap<String, CommunityTopics>,
}

impl GatewayConfig {
  /// Read configuration from `path`, with `TALLY_*` environment overrides.
  pub fn load(path: &Path) -> Result<Self, Error> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("TALLY"))
      .build()?;
    Ok(settings.try_deserialize()?)
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, C> {
  pub pipeline: Arc<Pipeline<S, C>>,
  pub topics:   Arc<TopicDirectory>,
  pub auth:     Arc<AuthConfig>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    AppState {
      pipeline: self.pipeline.clone(),
      topics:   self.topics.clone(),
      auth:     self.auth.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the gateway [`Router`].
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: EconomyStore + 'static,
  C: ChatApi + 'static,
{
  Router::new()
    .route("/events", post(receive_event::<S, C>))
    .route("/admin/reload", post(reload_topics::<S, C>))
    .with_state(state)
    .layer(TraceLayer::new_for_http())
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn receive_event<S, C>(
  State(state): State<AppState<S, C>>,
  req: Request<Body>,
) -> Response
where
  S: EconomyStore + 'static,
  C: ChatApi + 'static,
{
  if let Err(e) = verify_bearer(req.headers(), &state.auth) {
    return e.into_response();
  }

  let bytes = match axum::body::to_bytes(req.into_body(), 1024 * 1024).await {
    Ok(b) => b,
    Err(_) => {
      return Error::BadRequest("request body too large".to_string())
        .into_response();
    }
  };
  let message: InboundMessage = match serde_json::from_slice(&bytes) {
    Ok(m) => m,
    Err(e) => {
      return Error::BadRequest(format!("malformed event payload: {e}"))
        .into_response();
    }
  };

  // The pipeline contains every failure; delivery is acknowledged
  // unconditionally so the platform does not redeliver forever.
  state.pipeline.handle(&message).await;
  StatusCode::NO_CONTENT.into_response()
}

async fn reload_topics<S, C>(
  State(state): State<AppState<S, C>>,
  req: Request<Body>,
) -> Response
where
  S: EconomyStore + 'static,
  C: ChatApi + 'static,
{
  if let Err(e) = verify_bearer(req.headers(), &state.auth) {
    return e.into_response();
  }
  match state.topics.reload().await {
    Ok(count) => Json(json!({ "communities": count })).into_response(),
    Err(e) => e.into_response(),
  }
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use std::{
    collections::HashSet,
    sync::atomic::{AtomicU64, Ordering},
  };

  use axum::http::{Request as HttpRequest, header};
  use tower::ServiceExt as _;

  use tally_core::{
    chat::{Embed, Outbound},
    id::{ChannelId, CommunityId, MessageId},
    store::EconomyStore as _,
    topic::Topic,
  };
  use tally_store_sqlite::SqliteStore;

  // ── Mock chat ─────────────────────────────────────────────────────────────

  #[derive(Debug, Clone)]
  struct SentMessage {
    channel: ChannelId,
    id:      MessageId,
    content: Outbound,
  }

  #[derive(Default)]
  struct MockChatState {
    sent:    Vec<SentMessage>,
    edits:   Vec<(ChannelId, MessageId)>,
    replies: Vec<(ChannelId, MessageId, String)>,
    /// Message ids that behave as externally deleted: edits fail.
    dead:    HashSet<MessageId>,
  }

  struct MockChat {
    next_id: AtomicU64,
    state:   std::sync::Mutex<MockChatState>,
  }

  impl MockChat {
    fn new() -> Self {
      MockChat {
        next_id: AtomicU64::new(5000),
        state:   std::sync::Mutex::new(MockChatState::default()),
      }
    }

    fn kill(&self, message: MessageId) {
      self.state.lock().unwrap().dead.insert(message);
    }

    fn sent_to(&self, channel: ChannelId) -> Vec<SentMessage> {
      self
        .state
        .lock()
        .unwrap()
        .sent
        .iter()
        .filter(|m| m.channel == channel)
        .cloned()
        .collect()
    }

    fn edits(&self) -> Vec<(ChannelId, MessageId)> {
      self.state.lock().unwrap().edits.clone()
    }

    fn replies(&self) -> Vec<(ChannelId, MessageId, String)> {
      self.state.lock().unwrap().replies.clone()
    }
  }

  #[derive(Debug, thiserror::Error)]
  #[error("message gone")]
  struct MockChatError;

  impl ChatApi for MockChat {
    type Error = MockChatError;

    async fn send(
      &self,
      channel: ChannelId,
      content: &Outbound,
    ) -> Result<MessageId, MockChatError> {
      let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
      self.state.lock().unwrap().sent.push(SentMessage {
        channel,
        id,
        content: content.clone(),
      });
      Ok(id)
    }

    async fn edit(
      &self,
      channel: ChannelId,
      message: MessageId,
      _content: &Outbound,
    ) -> Result<(), MockChatError> {
      let mut state = self.state.lock().unwrap();
      if state.dead.contains(&message) {
        return Err(MockChatError);
      }
      state.edits.push((channel, message));
      Ok(())
    }

    async fn reply(
      &self,
      channel: ChannelId,
      to: MessageId,
      text: &str,
    ) -> Result<(), MockChatError> {
      self
        .state
        .lock()
        .unwrap()
        .replies
        .push((channel, to, text.to_string()));
      Ok(())
    }
  }

  // ── Fixtures ──────────────────────────────────────────────────────────────

  const COMMUNITY: CommunityId = CommunityId(900);
  const LOG_CHANNEL: ChannelId = ChannelId(10);
  const STOCK_CHANNEL: ChannelId = ChannelId(11);
  const BILL_CHANNEL: ChannelId = ChannelId(12);
  const LEDGER_CHANNEL: ChannelId = ChannelId(13);
  const ANNOUNCE_CHANNEL: ChannelId = ChannelId(14);
  const SECRET: &str = "webhook-secret";

  async fn make_state() -> (AppState<SqliteStore, MockChat>, Arc<SqliteStore>, Arc<MockChat>)
  {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let mock = Arc::new(MockChat::new());

    let mut communities = HashMap::new();
    communities.insert(COMMUNITY, CommunityTopics {
      inventory_log_channel: Some(LOG_CHANNEL),
      stock_channel:         Some(STOCK_CHANNEL),
      bill_channel:          Some(BILL_CHANNEL),
      ledger_channel:        Some(LEDGER_CHANNEL),
      announce_channel:      Some(ANNOUNCE_CHANNEL),
    });
    let topics = Arc::new(TopicDirectory::new(communities));

    let pipeline = Arc::new(Pipeline::new(
      store.clone(),
      mock.clone(),
      topics.clone(),
      "Tally".to_string(),
    ));

    let state = AppState {
      pipeline,
      topics,
      auth: Arc::new(AuthConfig { secret: SECRET.to_string() }),
    };
    (state, store, mock)
  }

  fn event_body(
    id: u64,
    channel: ChannelId,
    content: &str,
  ) -> String {
    serde_json::json!({
      "id": id,
      "channel_id": channel.0,
      "community_id": COMMUNITY.0,
      "author_is_bot": false,
      "content": content,
      "embeds": [],
    })
    .to_string()
  }

  async fn post(
    state: &AppState<SqliteStore, MockChat>,
    uri: &str,
    secret: Option<&str>,
    body: String,
  ) -> axum::response::Response {
    let mut builder = HttpRequest::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(secret) = secret {
      builder =
        builder.header(header::AUTHORIZATION, format!("Bearer {secret}"));
    }
    let req = builder.body(Body::from(body)).unwrap();
    router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn deliver(
    state: &AppState<SqliteStore, MockChat>,
    id: u64,
    channel: ChannelId,
    content: &str,
  ) {
    let resp =
      post(state, "/events", Some(SECRET), event_body(id, channel, content))
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn events_require_the_shared_secret() {
    let (state, _store, _mock) = make_state().await;
    let body = event_body(1, LOG_CHANNEL, "hello");

    let resp = post(&state, "/events", None, body.clone()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = post(&state, "/events", Some("wrong"), body).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn malformed_payload_is_a_bad_request() {
    let (state, _store, _mock) = make_state().await;
    let resp =
      post(&state, "/events", Some(SECRET), "{\"id\": \"x\"}".to_string())
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Write pipeline ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn inventory_extraction_is_gated_on_the_log_channel() {
    let (state, store, _mock) = make_state().await;
    let text = "Avery Deposited 40 Iron Ore To The Warehouse Inventory";

    // Wrong channel: ignored.
    deliver(&state, 100, ChannelId(999), text).await;
    assert_eq!(store.stock_level("iron ore").await.unwrap(), 0);

    // Log channel: applied.
    deliver(&state, 101, LOG_CHANNEL, text).await;
    assert_eq!(store.stock_level("iron ore").await.unwrap(), 40);
  }

  #[tokio::test]
  async fn redelivered_message_does_not_double_count() {
    let (state, store, _mock) = make_state().await;
    let text = "Avery Deposited 40 Iron Ore To The Warehouse Inventory";

    deliver(&state, 100, LOG_CHANNEL, text).await;
    deliver(&state, 100, LOG_CHANNEL, text).await;

    assert_eq!(store.stock_level("iron ore").await.unwrap(), 40);
  }

  #[tokio::test]
  async fn multi_domain_message_applies_both_and_refreshes_both() {
    let (state, store, mock) = make_state().await;
    let text = "Rex Issued A Bill Amount Of $1,500 To Morgan Discord: morgan#1\n\
                Morgan Deposited An Amount Of $200 To Redline Garage Ledger";

    // Not the inventory log channel: billing and ledger still run.
    deliver(&state, 200, ChannelId(999), text).await;

    let bills = store.bill_summaries().await.unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(store.business_balance("Redline Garage").await.unwrap(), 200);

    // One summary message per touched topic, none for inventory.
    assert_eq!(mock.sent_to(BILL_CHANNEL).len(), 1);
    assert_eq!(mock.sent_to(LEDGER_CHANNEL).len(), 1);
    assert!(mock.sent_to(STOCK_CHANNEL).is_empty());

    // Both events were announced.
    assert_eq!(mock.sent_to(ANNOUNCE_CHANNEL).len(), 2);

    // Pointers recorded for the created summaries.
    assert!(
      store.summary_pointer(COMMUNITY, Topic::Billing).await.unwrap().is_some()
    );
    assert!(
      store.summary_pointer(COMMUNITY, Topic::Ledger).await.unwrap().is_some()
    );
  }

  #[tokio::test]
  async fn second_refresh_edits_in_place() {
    let (state, _store, mock) = make_state().await;
    let text = "Avery Deposited 5 Rope To The Dock Inventory";

    deliver(&state, 300, LOG_CHANNEL, text).await;
    deliver(&state, 301, LOG_CHANNEL, text).await;

    // One created message, then one in-place edit.
    let created = mock.sent_to(STOCK_CHANNEL);
    assert_eq!(created.len(), 1);
    assert_eq!(mock.edits(), vec![(STOCK_CHANNEL, created[0].id)]);
  }

  #[tokio::test]
  async fn reconciler_self_heals_a_deleted_summary() {
    let (state, store, mock) = make_state().await;
    let text = "Avery Deposited 5 Rope To The Dock Inventory";

    deliver(&state, 300, LOG_CHANNEL, text).await;
    let first = mock.sent_to(STOCK_CHANNEL)[0].id;
    mock.kill(first);

    deliver(&state, 301, LOG_CHANNEL, text).await;

    let sent = mock.sent_to(STOCK_CHANNEL);
    assert_eq!(sent.len(), 2, "a replacement message was created");
    assert_eq!(
      store.summary_pointer(COMMUNITY, Topic::Inventory).await.unwrap(),
      Some(sent[1].id),
      "the pointer moved to the replacement"
    );
  }

  #[tokio::test]
  async fn summary_content_reflects_aggregates() {
    let (state, _store, mock) = make_state().await;
    deliver(
      &state,
      400,
      LOG_CHANNEL,
      "Avery Deposited 7 Rope To The Dock Inventory",
    )
    .await;

    let sent = mock.sent_to(STOCK_CHANNEL);
    let Outbound::Embed(Embed { title, description }) = &sent[0].content
    else {
      panic!("summary should be an embed");
    };
    assert_eq!(title.as_deref(), Some("Tally"));
    let body = description.as_deref().unwrap();
    assert!(body.contains("Live Inventory"), "{body}");
    assert!(body.contains("**rope**: 7"), "{body}");
  }

  #[tokio::test]
  async fn bot_messages_are_dropped() {
    let (state, store, _mock) = make_state().await;
    let body = serde_json::json!({
      "id": 500,
      "channel_id": LOG_CHANNEL.0,
      "community_id": COMMUNITY.0,
      "author_is_bot": true,
      "content": "Avery Deposited 40 Iron Ore To The Warehouse Inventory",
      "embeds": [],
    })
    .to_string();

    let resp = post(&state, "/events", Some(SECRET), body).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.stock_level("iron ore").await.unwrap(), 0);
  }

  #[tokio::test]
  async fn embed_only_message_is_composed_from_the_first_embed() {
    let (state, store, _mock) = make_state().await;
    let body = serde_json::json!({
      "id": 600,
      "channel_id": LOG_CHANNEL.0,
      "community_id": COMMUNITY.0,
      "author_is_bot": false,
      "content": "",
      "embeds": [{
        "title": "Avery",
        "description": "Deposited 9 Flare To The Dock Inventory",
      }],
    })
    .to_string();

    let resp = post(&state, "/events", Some(SECRET), body).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.stock_level("flare").await.unwrap(), 9);
  }

  // ── Interactive query ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn stock_query_with_argument_replies_one_value() {
    let (state, _store, mock) = make_state().await;
    deliver(
      &state,
      700,
      LOG_CHANNEL,
      "Avery Deposited 70 Iron Ore To The Warehouse Inventory",
    )
    .await;

    deliver(&state, 701, LOG_CHANNEL, "!stock Iron Ore").await;

    let replies = mock.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, LOG_CHANNEL);
    assert_eq!(replies[0].1, MessageId(701));
    assert_eq!(replies[0].2, "iron ore: 70");
  }

  #[tokio::test]
  async fn bare_stock_query_lists_everything_or_apologises() {
    let (state, _store, mock) = make_state().await;

    deliver(&state, 800, LOG_CHANNEL, "!stock").await;
    assert_eq!(mock.replies()[0].2, "No stock data available.");

    deliver(
      &state,
      801,
      LOG_CHANNEL,
      "Avery Deposited 3 Rope To The Dock Inventory",
    )
    .await;
    deliver(&state, 802, LOG_CHANNEL, "!stock").await;
    assert_eq!(mock.replies()[1].2, "rope: 3");
  }
}

//! The `EconomyStore` trait and supporting read-model types.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! Higher layers (`tally-gateway`) depend on this abstraction, not on any
//! concrete backend.
//!
//! Every `apply_*` method is one atomic unit: the audit insert and the
//! aggregate increment commit together or not at all, and re-applying a key
//! that has already been committed is a no-op.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  event::{BillEvent, InventoryEvent, LedgerEvent},
  id::{CommunityId, MessageId},
  key::EventKey,
  topic::Topic,
};

// ─── Read-model rows ─────────────────────────────────────────────────────────

/// Running stock for one item — the inventory aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
  pub item:       String,
  pub quantity:   i64,
  pub updated_at: DateTime<Utc>,
}

/// Per-customer billing summary, derived from the bill audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerBills {
  pub customer:     String,
  pub paid_count:   i64,
  pub unpaid_count: i64,
  pub unpaid_total: i64,
}

/// Running balance for one business — the ledger aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessBalance {
  pub business:   String,
  pub balance:    i64,
  pub updated_at: DateTime<Utc>,
}

/// Time-windowed ledger figures for one business. The windowed sums are
/// recomputed from the audit trail on every read; only `current` is
/// maintained incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerWindows {
  pub current:    i64,
  pub today:      i64,
  pub this_week:  i64,
  pub this_month: i64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Tally storage backend: three audit-plus-aggregate
/// repositories (inventory, billing, ledger) and the summary-pointer table.
pub trait EconomyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Inventory ─────────────────────────────────────────────────────────

  /// Apply one inventory event under `key`. Idempotent per key.
  fn apply_inventory(
    &self,
    event: &InventoryEvent,
    at: DateTime<Utc>,
    key: EventKey,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Current stock for `item`; zero if the item has never been seen.
  fn stock_level<'a>(
    &'a self,
    item: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// All stock aggregates, ordered by item name ascending.
  fn list_stock(
    &self,
  ) -> impl Future<Output = Result<Vec<StockLevel>, Self::Error>> + Send + '_;

  // ── Billing ───────────────────────────────────────────────────────────

  /// Apply one bill event under `key`.
  ///
  /// `Issue` inserts an UNPAID audit row (idempotent per key). `Pay`
  /// transitions the oldest UNPAID row matching customer and amount to PAID
  /// (FIFO by timestamp), falling back to inserting a PAID row under `key`
  /// when no match exists.
  fn apply_bill(
    &self,
    event: &BillEvent,
    at: DateTime<Utc>,
    key: EventKey,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Per-customer billing summaries, ordered by customer name ascending.
  fn bill_summaries(
    &self,
  ) -> impl Future<Output = Result<Vec<CustomerBills>, Self::Error>> + Send + '_;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Apply one ledger event under `key`. Idempotent per key.
  fn apply_ledger(
    &self,
    event: &LedgerEvent,
    at: DateTime<Utc>,
    key: EventKey,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Current balance for `business`; zero if never seen.
  fn business_balance<'a>(
    &'a self,
    business: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// All balance aggregates, ordered by business name ascending.
  fn list_balances(
    &self,
  ) -> impl Future<Output = Result<Vec<BusinessBalance>, Self::Error>> + Send + '_;

  /// Windowed figures for `business`, with day/week/month boundaries derived
  /// from `now` in UTC (ISO week, Monday start).
  fn ledger_windows<'a>(
    &'a self,
    business: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<LedgerWindows, Self::Error>> + Send + 'a;

  // ── Summary pointers ──────────────────────────────────────────────────

  /// The outbound message currently displaying `topic`'s summary for
  /// `community`, if one has ever been created.
  fn summary_pointer(
    &self,
    community: CommunityId,
    topic: Topic,
  ) -> impl Future<Output = Result<Option<MessageId>, Self::Error>> + Send + '_;

  /// Record `message` as the live summary for `(community, topic)`,
  /// overwriting any previous pointer.
  fn set_summary_pointer(
    &self,
    community: CommunityId,
    topic: Topic,
    message: MessageId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

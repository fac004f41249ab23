//! Event types — the fundamental unit of the Tally pipeline.
//!
//! An event is an immutable, typed claim extracted from one chat message.
//! Events are ephemeral: produced by extraction, consumed by application,
//! never persisted as objects — only their *effects* (audit rows and
//! aggregate increments) are persisted.

use crate::topic::Topic;

// ─── Directions and actions ──────────────────────────────────────────────────

/// Which way value moves. Shared by inventory and ledger events; the signed
/// aggregate delta is `+amount` for a deposit and `-amount` for a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Deposit,
  Withdraw,
}

impl Direction {
  /// Apply the direction's sign to a magnitude.
  pub fn signed(self, amount: i64) -> i64 {
    match self {
      Direction::Deposit => amount,
      Direction::Withdraw => -amount,
    }
  }
}

/// What happened to a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillAction {
  Issue,
  Pay,
}

// ─── Per-domain events ───────────────────────────────────────────────────────

/// A stock movement in the community inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEvent {
  pub direction: Direction,
  pub quantity:  u32,
  /// Lower-cased item name; the inventory aggregate key.
  pub item:      String,
  pub actor:     String,
}

/// A bill being issued to, or paid by, a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillEvent {
  pub action:   BillAction,
  pub amount:   u64,
  /// For `Pay`, the party the payment went to.
  pub issuer:   String,
  /// For `Pay`, the paying party; payment matching keys on this field.
  pub customer: String,
}

/// A cash movement against a business ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
  pub direction: Direction,
  pub amount:    u64,
  pub actor:     String,
  /// The ledger aggregate key.
  pub business:  String,
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A typed economic event extracted from one chat message. One message can
/// yield events across all three topics; sub-pattern matches are independent
/// and deliberately not mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Inventory(InventoryEvent),
  Bill(BillEvent),
  Ledger(LedgerEvent),
}

impl Event {
  /// The topic this event belongs to; determines its idempotency-key band
  /// and which repository applies it.
  pub fn topic(&self) -> Topic {
    match self {
      Event::Inventory(_) => Topic::Inventory,
      Event::Bill(_) => Topic::Billing,
      Event::Ledger(_) => Topic::Ledger,
    }
  }
}

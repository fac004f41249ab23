//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Directions, topics, and
//! bill statuses are stored as their discriminant strings. Platform ids are
//! stored as decimal strings.

use chrono::{DateTime, Utc};
use tally_core::{
  event::{BillAction, Direction},
  store::{BusinessBalance, StockLevel},
  topic::Topic,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Direction ───────────────────────────────────────────────────────────────

pub fn encode_direction(d: Direction) -> &'static str {
  match d {
    Direction::Deposit => "deposit",
    Direction::Withdraw => "withdraw",
  }
}

// ─── Bill status ─────────────────────────────────────────────────────────────

/// The status a bill audit row is born with, per action.
pub fn initial_bill_status(action: BillAction) -> &'static str {
  match action {
    BillAction::Issue => "UNPAID",
    // A payment with no matching issuance is recorded directly as settled.
    BillAction::Pay => "PAID",
  }
}

// ─── Topic ───────────────────────────────────────────────────────────────────

pub fn encode_topic(t: Topic) -> &'static str { t.as_str() }

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub struct RawStockLevel {
  pub item:       String,
  pub quantity:   i64,
  pub updated_at: String,
}

impl RawStockLevel {
  pub fn into_stock_level(self) -> Result<StockLevel> {
    Ok(StockLevel {
      item:       self.item,
      quantity:   self.quantity,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawBusinessBalance {
  pub business:   String,
  pub balance:    i64,
  pub updated_at: String,
}

impl RawBusinessBalance {
  pub fn into_business_balance(self) -> Result<BusinessBalance> {
    Ok(BusinessBalance {
      business:   self.business,
      balance:    self.balance,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

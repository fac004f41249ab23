//! Topic — an independent summary/reconciliation stream.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the three economic domains tracked per community. Each topic has
/// its own audit trail, aggregates, idempotency-key band, and live summary
/// message.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
  Inventory,
  Billing,
  Ledger,
}

impl Topic {
  pub const ALL: [Topic; 3] = [Topic::Inventory, Topic::Billing, Topic::Ledger];

  /// The discriminant string stored in the `summary_messages.topic` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Topic::Inventory => "inventory",
      Topic::Billing => "billing",
      Topic::Ledger => "ledger",
    }
  }

  pub fn parse(s: &str) -> Result<Self, Error> {
    match s {
      "inventory" => Ok(Topic::Inventory),
      "billing" => Ok(Topic::Billing),
      "ledger" => Ok(Topic::Ledger),
      other => Err(Error::UnknownTopic(other.to_string())),
    }
  }
}

impl std::fmt::Display for Topic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

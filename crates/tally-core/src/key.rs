//! Idempotency keys — at-most-once application per audit row.
//!
//! One inbound message can carve out several events per topic. Each event's
//! key is the base message id plus a disjoint per-topic offset band plus the
//! event's zero-based index within its topic's extraction result. Message
//! ids are monotonically increasing, so keys are unique across messages,
//! topics, and sibling events — provided each topic yields fewer than
//! [`BAND_WIDTH`] events per message. That limit is a documented design
//! bound, debug-asserted rather than enforced at runtime.

use std::fmt;

use crate::{id::MessageId, topic::Topic};

/// Width of each topic's key band within one message's id space.
pub const BAND_WIDTH: u64 = 1000;

impl Topic {
  /// The start of this topic's key band, relative to the base message id.
  pub fn band_offset(self) -> u64 {
    match self {
      Topic::Inventory => 0,
      Topic::Billing => BAND_WIDTH,
      Topic::Ledger => 2 * BAND_WIDTH,
    }
  }
}

/// The unique key under which one event's audit row is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey(pub u64);

impl EventKey {
  /// Derive the key for the `index`-th event of `topic` extracted from the
  /// message with id `message`.
  pub fn derive(message: MessageId, topic: Topic, index: usize) -> Self {
    debug_assert!(
      (index as u64) < BAND_WIDTH,
      "more than {BAND_WIDTH} {topic} events from one message"
    );
    EventKey(
      message
        .0
        .wrapping_add(topic.band_offset())
        .wrapping_add(index as u64),
    )
  }
}

impl fmt::Display for EventKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

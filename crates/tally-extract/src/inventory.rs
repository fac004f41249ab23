//! Inventory log extraction.
//!
//! Three independent matchers run unconditionally against the full text:
//! deposit, withdraw, and container transfer. A block that matches more
//! than one pattern yields more than one event; the patterns are
//! deliberately not mutually exclusive.

use regex::Regex;
use tally_core::event::{Direction, Event, InventoryEvent};

use crate::{Extractor, actor::ActorCues, manifest, parse_quantity};

pub struct InventoryExtractor {
  cues:     ActorCues,
  deposit:  Regex,
  withdraw: Regex,
  transfer: Regex,
}

impl Default for InventoryExtractor {
  fn default() -> Self {
    InventoryExtractor {
      cues:     ActorCues::default(),
      deposit:  Regex::new(
        r"(?i)Deposited\s+(\d+)\s+(.+?)\s+To\s+.+?Inventory",
      )
      .unwrap(),
      withdraw: Regex::new(
        r"(?i)Has\s+Taken\s+A\s+(\d+)\s+(.+?)\s+From\s+.+?Inventory",
      )
      .unwrap(),
      transfer: Regex::new(
        r"(?i)transferred\s+(\d+)\s+items\s+from\s+a\s+transport\s+box\s+to\s+container\s+\d+",
      )
      .unwrap(),
    }
  }
}

impl InventoryExtractor {
  fn movement(
    &self,
    pattern: &Regex,
    direction: Direction,
    text: &str,
    actor: &str,
  ) -> Option<Event> {
    let c = pattern.captures(text)?;
    Some(Event::Inventory(InventoryEvent {
      direction,
      quantity: parse_quantity(&c[1]),
      item: c[2].trim().to_lowercase(),
      actor: actor.to_string(),
    }))
  }
}

impl Extractor for InventoryExtractor {
  fn extract(&self, text: &str) -> Vec<Event> {
    let clean = text.replace('\r', "");
    let actor = self.cues.detect(&clean);

    let mut events = Vec::new();
    events.extend(self.movement(
      &self.deposit,
      Direction::Deposit,
      &clean,
      &actor,
    ));
    events.extend(self.movement(
      &self.withdraw,
      Direction::Withdraw,
      &clean,
      &actor,
    ));

    // Transfers carry their per-item breakdown in an embedded manifest; each
    // entry becomes a synthetic deposit.
    if self.transfer.is_match(&clean) {
      for (item, quantity) in manifest::scan(&clean) {
        events.push(Event::Inventory(InventoryEvent {
          direction: Direction::Deposit,
          quantity,
          item,
          actor: actor.clone(),
        }));
      }
    }

    events
  }
}

//! Business ledger extraction.
//!
//! Deposit and Withdraw matchers run independently over newline-collapsed
//! text. Unlike inventory, a zero or unparseable amount suppresses the
//! event entirely rather than emitting a zero-amount one.

use regex::Regex;
use tally_core::event::{Direction, Event, LedgerEvent};

use crate::{Extractor, parse_amount};

pub struct LedgerExtractor {
  deposit:  Regex,
  withdraw: Regex,
}

impl Default for LedgerExtractor {
  fn default() -> Self {
    LedgerExtractor {
      deposit:  Regex::new(
        r"(?i)(.+?)\s+Deposited\s+An\s+Amount\s+Of\s+\$?([\d,]+)\s+To\s+(.+?)\s+Ledger",
      )
      .unwrap(),
      withdraw: Regex::new(
        r"(?i)(.+?)\s+Withdrew\s+An\s+Amount\s+Of\s+\$?([\d,]+)\s+From\s+(.+?)\s+Ledger",
      )
      .unwrap(),
    }
  }
}

impl LedgerExtractor {
  fn movement(
    &self,
    pattern: &Regex,
    direction: Direction,
    text: &str,
  ) -> Option<Event> {
    let c = pattern.captures(text)?;
    let amount = parse_amount(&c[2]);
    // Zero-amount movements are noise; suppress rather than record.
    (amount > 0).then(|| {
      Event::Ledger(LedgerEvent {
        direction,
        amount,
        actor: c[1].trim().to_string(),
        business: c[3].trim().to_string(),
      })
    })
  }
}

impl Extractor for LedgerExtractor {
  fn extract(&self, text: &str) -> Vec<Event> {
    let clean = text.replace('\r', "").replace('\n', " ");
    let clean = clean.trim();

    let mut events = Vec::new();
    events.extend(self.movement(&self.deposit, Direction::Deposit, clean));
    events.extend(self.movement(&self.withdraw, Direction::Withdraw, clean));
    events
  }
}

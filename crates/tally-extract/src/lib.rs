//! Free-text event extraction.
//!
//! Pipeline:
//!   raw &str
//!     └─ strip carriage returns
//!          └─ per-topic matcher set → Vec<Event>
//!
//! Extraction is deterministic, total (it never fails), and performs no I/O.
//! Text that matches nothing yields an empty result; a malformed embedded
//! manifest contributes zero events rather than an error.
//!
//! Each topic's patterns live behind the [`Extractor`] trait so a matcher
//! set can be swapped or unit-tested independently of the pipeline.

pub mod actor;
pub mod billing;
pub mod inventory;
pub mod ledger;
pub mod manifest;

use tally_core::event::Event;

pub use billing::BillingExtractor;
pub use inventory::InventoryExtractor;
pub use ledger::LedgerExtractor;

/// A set of patterns producing structured events from one message's text.
pub trait Extractor {
  fn extract(&self, text: &str) -> Vec<Event>;
}

/// Run all three topic extractors over `text` and concatenate the results.
/// Matches across topics and sub-patterns are independent by design: one
/// text block can yield events in every topic at once.
pub fn extract_all(text: &str) -> Vec<Event> {
  let mut events = InventoryExtractor::default().extract(text);
  events.extend(BillingExtractor::default().extract(text));
  events.extend(LedgerExtractor::default().extract(text));
  events
}

/// Parse a base-10 quantity captured as a digit run. Values too large for
/// the field default to zero, mirroring the tolerance for garbage in the
/// source logs.
pub(crate) fn parse_quantity(digits: &str) -> u32 {
  digits.parse().unwrap_or(0)
}

/// Parse a monetary amount that may carry thousands-separator commas.
pub(crate) fn parse_amount(raw: &str) -> u64 {
  raw.replace(',', "").parse().unwrap_or(0)
}

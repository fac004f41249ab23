//! Bill issuance and payment extraction.
//!
//! Billing announcements are single sentences that the platform sometimes
//! wraps; newlines are collapsed to spaces before matching. The Issue and
//! Pay matchers run independently.

use regex::Regex;
use tally_core::event::{BillAction, BillEvent, Event};

use crate::{Extractor, parse_amount};

pub struct BillingExtractor {
  issue: Regex,
  pay:   Regex,
}

impl Default for BillingExtractor {
  fn default() -> Self {
    BillingExtractor {
      issue: Regex::new(
        r"(?i)(.+?)\s+Issued\s+A\s+Bill\s+Amount\s+Of\s+\$?([\d,]+)\s+To\s+(.+?)(?:\s+Discord:|$)",
      )
      .unwrap(),
      pay:   Regex::new(
        r"(?i)(.+?)\s+Paid\s+A\s+Bill\s+Amount\s+Of\s+\$?([\d,]+)\s+To\s+(.+?)(?:\s+Discord:|$)",
      )
      .unwrap(),
    }
  }
}

impl Extractor for BillingExtractor {
  fn extract(&self, text: &str) -> Vec<Event> {
    let clean = text.replace('\r', "").replace('\n', " ");
    let clean = clean.trim();

    let mut events = Vec::new();
    if let Some(c) = self.issue.captures(clean) {
      events.push(Event::Bill(BillEvent {
        action:   BillAction::Issue,
        amount:   parse_amount(&c[2]),
        issuer:   c[1].trim().to_string(),
        customer: c[3].trim().to_string(),
      }));
    }
    if let Some(c) = self.pay.captures(clean) {
      // The payer is the customer whose outstanding bill this settles; the
      // named recipient is the issuer.
      events.push(Event::Bill(BillEvent {
        action:   BillAction::Pay,
        amount:   parse_amount(&c[2]),
        issuer:   c[3].trim().to_string(),
        customer: c[1].trim().to_string(),
      }));
    }
    events
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn extract(text: &str) -> Vec<BillEvent> {
    BillingExtractor::default()
      .extract(text)
      .into_iter()
      .map(|e| match e {
        Event::Bill(inner) => inner,
        other => panic!("unexpected event: {other:?}"),
      })
      .collect()
  }

  #[test]
  fn issue_with_comma_amount() {
    let events = extract("Rex Issued A Bill Amount Of $12,500 To Morgan");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, BillAction::Issue);
    assert_eq!(events[0].amount, 12_500);
    assert_eq!(events[0].issuer, "Rex");
    assert_eq!(events[0].customer, "Morgan");
  }

  #[test]
  fn payment_swaps_parties() {
    let events = extract("Morgan Paid A Bill Amount Of 300 To Rex");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, BillAction::Pay);
    assert_eq!(events[0].amount, 300);
    assert_eq!(events[0].issuer, "Rex");
    assert_eq!(events[0].customer, "Morgan");
  }

  #[test]
  fn trailing_discord_tag_is_cut() {
    let events =
      extract("Rex Issued A Bill Amount Of $90 To Morgan Discord: morgan#1");
    assert_eq!(events[0].customer, "Morgan");
  }

  #[test]
  fn wrapped_sentence_is_collapsed() {
    let events = extract("Rex Issued A Bill\nAmount Of $40 To Morgan");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].amount, 40);
  }

  #[test]
  fn issue_and_pay_match_independently() {
    let text = "Rex Issued A Bill Amount Of $50 To Morgan Discord: x \
                Morgan Paid A Bill Amount Of $50 To Rex";
    let events = extract(text);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, BillAction::Issue);
    assert_eq!(events[1].action, BillAction::Pay);
  }

  #[test]
  fn no_match_is_empty() {
    assert!(extract("the rent is too high").is_empty());
  }
}

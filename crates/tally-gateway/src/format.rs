//! Deterministic display formatting for summaries and announcements.
//!
//! Summary bodies are built from sorted aggregate snapshots, grouped into
//! fixed-width rows joined by a non-breaking-space separator, with a fixed
//! fallback string when the snapshot is empty. Determinism matters: the
//! reconciler edits the same message repeatedly and must not flap.

use tally_core::store::{BusinessBalance, CustomerBills, LedgerWindows, StockLevel};

const STOCK_ROW_WIDTH: usize = 4;
const BILL_ROW_WIDTH: usize = 3;
const LEDGER_ROW_WIDTH: usize = 1;

/// Group pre-formatted cells into fixed-width rows.
fn rows(cells: Vec<String>, width: usize, spacer: &str, fallback: &str) -> String {
  if cells.is_empty() {
    return fallback.to_string();
  }
  cells
    .chunks(width)
    .map(|chunk| chunk.join(spacer))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn stock_body(levels: &[StockLevel]) -> String {
  let cells = levels
    .iter()
    .map(|l| format!("**{}**: {}", l.item, l.quantity))
    .collect();
  rows(
    cells,
    STOCK_ROW_WIDTH,
    &"\u{a0}".repeat(8),
    "No stock data available.",
  )
}

pub fn bills_body(summaries: &[CustomerBills]) -> String {
  let cells = summaries
    .iter()
    .map(|s| {
      format!(
        "**{}** — paid: {}, unpaid: {}, unpaid total: ${}",
        s.customer, s.paid_count, s.unpaid_count, s.unpaid_total
      )
    })
    .collect();
  rows(
    cells,
    BILL_ROW_WIDTH,
    &"\u{a0}".repeat(6),
    "No billing data available.",
  )
}

pub fn ledger_body(entries: &[(BusinessBalance, LedgerWindows)]) -> String {
  let cells = entries
    .iter()
    .map(|(balance, w)| {
      format!(
        "**{}**: ${} (today ${} · week ${} · month ${})",
        balance.business, w.current, w.today, w.this_week, w.this_month
      )
    })
    .collect();
  rows(
    cells,
    LEDGER_ROW_WIDTH,
    &"\u{a0}".repeat(6),
    "No ledger data available.",
  )
}

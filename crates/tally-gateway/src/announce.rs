//! Per-event announcements for bill and ledger activity.
//!
//! Each applied bill or ledger event gets a one-off embed in the
//! community's announcement channel, alongside (and independent of) the
//! live summaries. Inventory movements are too chatty to announce.

use tally_core::{
  chat::{ChatApi, Embed, Outbound},
  event::{BillAction, BillEvent, Direction, Event, LedgerEvent},
  id::ChannelId,
};

fn bill_embed(app_name: &str, event: &BillEvent) -> Embed {
  match event.action {
    BillAction::Issue => Embed::new(
      "📋 Bill Issued",
      format!(
        "{app_name}\nIssued By: {} · Issued To: {} · Amount: ${}",
        event.issuer, event.customer, event.amount
      ),
    ),
    BillAction::Pay => Embed::new(
      "💰 Bill Paid",
      format!(
        "{app_name}\nPaid By: {} · Paid To: {} · Amount: ${}",
        event.customer, event.issuer, event.amount
      ),
    ),
  }
}

fn ledger_embed(app_name: &str, event: &LedgerEvent) -> Embed {
  let title = match event.direction {
    Direction::Deposit => "🏦 Ledger Deposit",
    Direction::Withdraw => "🏦 Ledger Withdraw",
  };
  Embed::new(
    title,
    format!(
      "{app_name}\nBusiness: {} · Player: {} · Amount: ${}",
      event.business, event.actor, event.amount
    ),
  )
}

/// Post the announcement for `event`, if it is an announceable kind.
pub async fn announce<C: ChatApi>(
  chat: &C,
  channel: ChannelId,
  app_name: &str,
  event: &Event,
) -> Result<(), C::Error> {
  let embed = match event {
    Event::Bill(bill) => bill_embed(app_name, bill),
    Event::Ledger(ledger) => ledger_embed(app_name, ledger),
    Event::Inventory(_) => return Ok(()),
  };
  chat.send(channel, &Outbound::Embed(embed)).await?;
  Ok(())
}

//! [`SqliteStore`] — the SQLite implementation of [`EconomyStore`].

use std::{future::Future, path::Path};

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use rusqlite::OptionalExtension as _;

use tally_core::{
  event::{BillAction, BillEvent, InventoryEvent, LedgerEvent},
  id::{CommunityId, MessageId},
  key::EventKey,
  store::{
    BusinessBalance, CustomerBills, EconomyStore, LedgerWindows, StockLevel,
  },
  topic::Topic,
};

use crate::{
  Error, Result,
  encode::{
    RawBusinessBalance, RawStockLevel, encode_direction, encode_dt,
    encode_topic, initial_bill_status,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally economy store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Run a raw query against the underlying connection — tests only.
  pub(crate) async fn conn_for_tests<T, F>(&self, f: F) -> T
  where
    F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<T>
      + Send
      + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(f(conn)?))
      .await
      .expect("test query")
  }
}

/// Start-of-day, start-of-ISO-week (Monday), and start-of-month boundaries
/// for `now`, all in UTC.
fn window_starts(
  now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>, DateTime<Utc>) {
  let day = now.date_naive();
  let day_start = day.and_time(NaiveTime::MIN).and_utc();
  let week_start =
    day_start - Duration::days(i64::from(day.weekday().num_days_from_monday()));
  let month_start = day_start - Duration::days(i64::from(day.day0()));
  (day_start, week_start, month_start)
}

// ─── EconomyStore impl ───────────────────────────────────────────────────────

impl EconomyStore for SqliteStore {
  type Error = Error;

  // ── Inventory ─────────────────────────────────────────────────────────────

  fn apply_inventory(
    &self,
    event: &InventoryEvent,
    at: DateTime<Utc>,
    key: EventKey,
  ) -> impl Future<Output = Result<()>> + Send + '_ {
    let key_str = key.to_string();
    let at_str = encode_dt(at);
    let item = event.item.clone();
    let actor = event.actor.clone();
    let quantity = i64::from(event.quantity);
    let direction = encode_direction(event.direction);
    let delta = event.direction.signed(quantity);

    async move {
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let inserted = tx.execute(
            "INSERT OR IGNORE INTO inventory_log
               (event_key, at, item, quantity, direction, actor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![key_str, at_str, item, quantity, direction, actor],
          )?;
          // A replayed key leaves the aggregate untouched.
          if inserted == 1 {
            tx.execute(
              "INSERT INTO stock_levels (item, quantity, updated_at)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(item) DO UPDATE SET
                 quantity   = quantity + excluded.quantity,
                 updated_at = excluded.updated_at",
              rusqlite::params![item, delta, at_str],
            )?;
          }
          tx.commit()?;
          Ok(())
        })
        .await?;
      Ok(())
    }
  }

  async fn stock_level(&self, item: &str) -> Result<i64> {
    let item = item.to_owned();
    let quantity: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT quantity FROM stock_levels WHERE item = ?1",
              rusqlite::params![item],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(quantity.unwrap_or(0))
  }

  async fn list_stock(&self) -> Result<Vec<StockLevel>> {
    let raws: Vec<RawStockLevel> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT item, quantity, updated_at
           FROM stock_levels ORDER BY item ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawStockLevel {
              item:       row.get(0)?,
              quantity:   row.get(1)?,
              updated_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStockLevel::into_stock_level).collect()
  }

  // ── Billing ───────────────────────────────────────────────────────────────

  fn apply_bill(
    &self,
    event: &BillEvent,
    at: DateTime<Utc>,
    key: EventKey,
  ) -> impl Future<Output = Result<()>> + Send + '_ {
    let key_str = key.to_string();
    let at_str = encode_dt(at);
    let amount = event.amount as i64;
    let issuer = event.issuer.clone();
    let customer = event.customer.clone();
    let action = event.action;
    let status = initial_bill_status(action);

    async move {
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;

          // Payments settle the longest-outstanding matching bill first. The
          // match and the fallback insert share the transaction so concurrent
          // payments cannot double-match one bill.
          let settled = if action == BillAction::Pay {
            tx.execute(
              "UPDATE bill_log SET status = 'PAID'
               WHERE event_key = (
                 SELECT event_key FROM bill_log
                 WHERE status = 'UNPAID' AND customer = ?1 AND amount = ?2
                 ORDER BY at ASC LIMIT 1
               )",
              rusqlite::params![customer, amount],
            )? == 1
          } else {
            false
          };

          if !settled {
            tx.execute(
              "INSERT OR IGNORE INTO bill_log
                 (event_key, at, amount, issuer, customer, status)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
              rusqlite::params![
                key_str, at_str, amount, issuer, customer, status
              ],
            )?;
          }

          tx.commit()?;
          Ok(())
        })
        .await?;
      Ok(())
    }
  }

  async fn bill_summaries(&self) -> Result<Vec<CustomerBills>> {
    let rows: Vec<CustomerBills> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT customer,
                  SUM(CASE WHEN status = 'PAID'   THEN 1 ELSE 0 END),
                  SUM(CASE WHEN status = 'UNPAID' THEN 1 ELSE 0 END),
                  SUM(CASE WHEN status = 'UNPAID' THEN amount ELSE 0 END)
           FROM bill_log
           GROUP BY customer
           ORDER BY customer ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(CustomerBills {
              customer:     row.get(0)?,
              paid_count:   row.get(1)?,
              unpaid_count: row.get(2)?,
              unpaid_total: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  fn apply_ledger(
    &self,
    event: &LedgerEvent,
    at: DateTime<Utc>,
    key: EventKey,
  ) -> impl Future<Output = Result<()>> + Send + '_ {
    let key_str = key.to_string();
    let at_str = encode_dt(at);
    let amount = event.amount as i64;
    let actor = event.actor.clone();
    let business = event.business.clone();
    let direction = encode_direction(event.direction);
    let delta = event.direction.signed(amount);

    async move {
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let inserted = tx.execute(
            "INSERT OR IGNORE INTO ledger_log
               (event_key, at, amount, direction, actor, business)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              key_str, at_str, amount, direction, actor, business
            ],
          )?;
          if inserted == 1 {
            tx.execute(
              "INSERT INTO business_balances (business, balance, updated_at)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(business) DO UPDATE SET
                 balance    = balance + excluded.balance,
                 updated_at = excluded.updated_at",
              rusqlite::params![business, delta, at_str],
            )?;
          }
          tx.commit()?;
          Ok(())
        })
        .await?;
      Ok(())
    }
  }

  async fn business_balance(&self, business: &str) -> Result<i64> {
    let business = business.to_owned();
    let balance: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT balance FROM business_balances WHERE business = ?1",
              rusqlite::params![business],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(balance.unwrap_or(0))
  }

  async fn list_balances(&self) -> Result<Vec<BusinessBalance>> {
    let raws: Vec<RawBusinessBalance> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT business, balance, updated_at
           FROM business_balances ORDER BY business ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawBusinessBalance {
              business:   row.get(0)?,
              balance:    row.get(1)?,
              updated_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawBusinessBalance::into_business_balance)
      .collect()
  }

  async fn ledger_windows(
    &self,
    business: &str,
    now: DateTime<Utc>,
  ) -> Result<LedgerWindows> {
    let current = self.business_balance(business).await?;

    let business = business.to_owned();
    let (day_start, week_start, month_start) = window_starts(now);
    let day_str = encode_dt(day_start);
    let week_str = encode_dt(week_start);
    let month_str = encode_dt(month_start);

    // Windowed figures are recomputed from the audit trail on every read:
    // immune to incremental drift, at the cost of a scan.
    let (today, this_week, this_month): (i64, i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT
             COALESCE(SUM(CASE WHEN at >= ?2 THEN
               CASE WHEN direction = 'deposit' THEN amount ELSE -amount END
             END), 0),
             COALESCE(SUM(CASE WHEN at >= ?3 THEN
               CASE WHEN direction = 'deposit' THEN amount ELSE -amount END
             END), 0),
             COALESCE(SUM(CASE WHEN at >= ?4 THEN
               CASE WHEN direction = 'deposit' THEN amount ELSE -amount END
             END), 0)
           FROM ledger_log WHERE business = ?1",
          rusqlite::params![business, day_str, week_str, month_str],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?)
      })
      .await?;

    Ok(LedgerWindows { current, today, this_week, this_month })
  }

  // ── Summary pointers ──────────────────────────────────────────────────────

  async fn summary_pointer(
    &self,
    community: CommunityId,
    topic: Topic,
  ) -> Result<Option<MessageId>> {
    let community_str = community.to_string();
    let topic_str = encode_topic(topic).to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT message_id FROM summary_messages
               WHERE community_id = ?1 AND topic = ?2",
              rusqlite::params![community_str, topic_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|s| s.parse::<MessageId>())
      .transpose()
      .map_err(Error::Core)
  }

  async fn set_summary_pointer(
    &self,
    community: CommunityId,
    topic: Topic,
    message: MessageId,
  ) -> Result<()> {
    let community_str = community.to_string();
    let topic_str = encode_topic(topic).to_owned();
    let message_str = message.to_string();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO summary_messages
             (community_id, topic, message_id, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(community_id, topic) DO UPDATE SET
             message_id = excluded.message_id,
             updated_at = excluded.updated_at",
          rusqlite::params![community_str, topic_str, message_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

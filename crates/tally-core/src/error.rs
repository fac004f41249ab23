//! Error types for `tally-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown topic: {0:?}")]
  UnknownTopic(String),

  #[error("unknown flow direction: {0:?}")]
  UnknownDirection(String),

  #[error("unknown bill status: {0:?}")]
  UnknownBillStatus(String),

  #[error("malformed id: {0:?}")]
  MalformedId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

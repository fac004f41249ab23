//! Platform identifier newtypes.
//!
//! The chat platform assigns globally unique, monotonically increasing
//! numeric ids (snowflake-style) to messages, channels, and communities.
//! These wrappers keep the three id spaces from being mixed up at compile
//! time; all serialise as plain numbers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

macro_rules! platform_id {
  ($(#[$doc:meta])* $name:ident) => {
    $(#[$doc])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
      Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub u64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }

    impl FromStr for $name {
      type Err = Error;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
          .map($name)
          .map_err(|_| Error::MalformedId(s.to_string()))
      }
    }
  };
}

platform_id! {
  /// The platform-assigned id of a single message. Ordered by creation time.
  MessageId
}

platform_id! {
  /// The platform-assigned id of a channel within a community.
  ChannelId
}

platform_id! {
  /// The platform-assigned id of a community (tenant workspace).
  CommunityId
}

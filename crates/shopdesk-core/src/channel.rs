// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pub/sub channel naming scheme.
//!
//! The string forms `conversation:{id}`, `user:{id}` and `notifications:{id}`
//! are a wire contract with connected clients and must stay stable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::types::{ConversationId, UserId};

/// A named pub/sub channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Shared multi-subscriber channel for one conversation.
    Conversation(ConversationId),
    /// Personal delivery channel for one user.
    User(UserId),
    /// Strictly private notification feed for one user.
    Notifications(UserId),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Conversation(id) => write!(f, "conversation:{id}"),
            Channel::User(id) => write!(f, "user:{id}"),
            Channel::Notifications(id) => write!(f, "notifications:{id}"),
        }
    }
}

/// Rejected channel name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid channel name `{0}`")]
pub struct ParseChannelError(pub String);

impl FromStr for Channel {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseChannelError(s.to_string());
        let (prefix, raw_id) = s.split_once(':').ok_or_else(err)?;
        let id: i64 = raw_id.parse().map_err(|_| err())?;
        match prefix {
            "conversation" => Ok(Channel::Conversation(ConversationId(id))),
            "user" => Ok(Channel::User(UserId(id))),
            "notifications" => Ok(Channel::Notifications(UserId(id))),
            _ => Err(err()),
        }
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

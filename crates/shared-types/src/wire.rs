//! # Wire Schema
//!
//! Every inbound message is a JSON object `{ "type": <tag>, "payload": <json> }`.
//!
//! [`WireEvent`] is the decoded envelope; [`WireVote`] is the one canonical
//! schema for `AGENT_VOTE` payloads. The conversion `WireVote -> Vote` is the
//! normalization boundary: the field variants observed on the feed
//! (string timestamps, missing `type`, missing display name) are resolved
//! here and the engine only ever sees [`Vote`].

use crate::entities::{RoundIndex, Vote, VoteKind};
use crate::errors::WireError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Event type tags emitted by the discussion broadcaster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventTag {
    /// A validator posted a vote in a discussion round.
    AgentVote,
    /// Out-of-band terminal verdict produced outside the engine.
    BlockVerdict,
    /// Server-side voting summary.
    VotingResult,
    AgentAlliance,
    AgentRegistered,
    NewTransaction,
    ChainCreated,
    /// Any tag this build does not know about.
    Other(String),
}

impl EventTag {
    /// Wire spelling of the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AgentVote => "AGENT_VOTE",
            Self::BlockVerdict => "BLOCK_VERDICT",
            Self::VotingResult => "VOTING_RESULT",
            Self::AgentAlliance => "AGENT_ALLIANCE",
            Self::AgentRegistered => "AGENT_REGISTERED",
            Self::NewTransaction => "NEW_TRANSACTION",
            Self::ChainCreated => "CHAIN_CREATED",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for EventTag {
    fn from(s: &str) -> Self {
        match s {
            "AGENT_VOTE" => Self::AgentVote,
            "BLOCK_VERDICT" => Self::BlockVerdict,
            "VOTING_RESULT" => Self::VotingResult,
            "AGENT_ALLIANCE" => Self::AgentAlliance,
            "AGENT_REGISTERED" => Self::AgentRegistered,
            "NEW_TRANSACTION" => Self::NewTransaction,
            "CHAIN_CREATED" => Self::ChainCreated,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for EventTag {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEvent {
    pub tag: EventTag,
    pub payload: Value,
}

impl WireEvent {
    pub fn new(tag: EventTag, payload: Value) -> Self {
        Self { tag, payload }
    }

    /// Wrap a vote in an `AGENT_VOTE` envelope.
    #[must_use]
    pub fn vote(vote: &Vote) -> Self {
        let payload = serde_json::to_value(WireVote::from(vote)).unwrap_or(Value::Null);
        Self::new(EventTag::AgentVote, payload)
    }

    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// - `WireError::MalformedJson` - not valid JSON
    /// - `WireError::NotAnObject` - valid JSON but not an object
    /// - `WireError::MissingType` - no string `type` field
    pub fn decode(frame: &str) -> Result<Self, WireError> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| WireError::MalformedJson(e.to_string()))?;

        let Value::Object(mut object) = value else {
            return Err(WireError::NotAnObject);
        };

        let tag = match object.get("type") {
            Some(Value::String(tag)) => EventTag::from(tag.as_str()),
            _ => return Err(WireError::MissingType),
        };
        let payload = object.remove("payload").unwrap_or(Value::Null);

        Ok(Self { tag, payload })
    }

    /// Encode back into a text frame.
    #[must_use]
    pub fn encode(&self) -> String {
        serde_json::json!({ "type": self.tag.as_str(), "payload": self.payload }).to_string()
    }

    /// Interpret the payload as a vote.
    ///
    /// # Errors
    ///
    /// Returns `WireError::InvalidVote` or `WireError::InvalidField` when the
    /// payload does not normalize into a [`Vote`].
    pub fn to_vote(&self) -> Result<Vote, WireError> {
        decode_vote(&self.payload)
    }
}

/// Timestamp as it appears on the feed: a number, or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    Millis(i64),
    Text(String),
}

/// Canonical `AGENT_VOTE` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVote {
    pub validator_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_name: Option<String>,
    #[serde(default)]
    pub message: String,
    pub timestamp: WireTimestamp,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub round: i64,
    pub approval: bool,
}

impl From<&Vote> for WireVote {
    fn from(vote: &Vote) -> Self {
        Self {
            validator_id: vote.validator_id.clone(),
            validator_name: vote.validator_name.clone(),
            message: vote.message.clone(),
            timestamp: WireTimestamp::Millis(vote.timestamp),
            kind: Some(vote.kind.as_str().to_owned()),
            round: i64::from(vote.round),
            approval: vote.approval,
        }
    }
}

impl TryFrom<WireVote> for Vote {
    type Error = WireError;

    fn try_from(wire: WireVote) -> Result<Self, Self::Error> {
        if wire.validator_id.trim().is_empty() {
            return Err(WireError::InvalidField {
                field: "validatorId",
                reason: "must not be empty".into(),
            });
        }

        let round = RoundIndex::try_from(wire.round).map_err(|_| WireError::InvalidField {
            field: "round",
            reason: format!("{} is not a valid round index", wire.round),
        })?;

        let timestamp = match wire.timestamp {
            WireTimestamp::Millis(ms) => ms,
            WireTimestamp::Text(text) => {
                text.trim()
                    .parse::<i64>()
                    .map_err(|e| WireError::InvalidField {
                        field: "timestamp",
                        reason: format!("{text:?}: {e}"),
                    })?
            }
        };

        // unknown stances fall back to the approval flag like a missing one
        let kind = wire
            .kind
            .as_deref()
            .and_then(VoteKind::from_wire)
            .unwrap_or(if wire.approval {
                VoteKind::Support
            } else {
                VoteKind::Oppose
            });

        Ok(Vote {
            validator_id: wire.validator_id,
            validator_name: wire.validator_name.filter(|name| !name.is_empty()),
            round,
            approval: wire.approval,
            kind,
            message: wire.message,
            timestamp,
        })
    }
}

/// Decode and normalize an `AGENT_VOTE` payload.
///
/// # Errors
///
/// See [`WireEvent::to_vote`].
pub fn decode_vote(payload: &Value) -> Result<Vote, WireError> {
    let wire: WireVote = serde_json::from_value(payload.clone())
        .map_err(|e| WireError::InvalidVote(e.to_string()))?;
    Vote::try_from(wire)
}

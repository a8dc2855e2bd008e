use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::serde_utils::serialize_utc_millis;

/// Top-level outcome of [`super::filter::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Node-broadcast events emitted by the uptime miner
    Broadcast,
    /// Peer-count events emitted by the p2p layer
    Peers,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Broadcast => "broadcast",
            Family::Peers => "peers",
        }
    }

    /// Collector endpoint for records of this family.
    pub fn destination(&self) -> Destination {
        match self {
            Family::Broadcast => Destination::Broadcasts,
            Family::Peers => Destination::Peers,
        }
    }
}

/// Result of the top-level filter. Unrecognized is a miss, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Unrecognized,
    Family(Family),
}

/// Sub-kinds of the broadcast family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastKind {
    Unrecognized,
    ReceivedBlock,
    /// Never produced by the classifier: "Start new block" lines are
    /// classified as `BroadcastedVote`.
    NewBlock,
    NewRound,
    BroadcastedVote,
}

/// Sub-kinds of the peers family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerKind {
    Unrecognized,
    NumPeers,
    /// Reserved, never produced by the classifier.
    InternalAddr,
}

/// Collector endpoints, one per record family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Broadcasts,
    Peers,
}

impl Destination {
    pub fn path(&self) -> &'static str {
        match self {
            Destination::Broadcasts => "/stats/uptimes/broadcasts",
            Destination::Peers => "/stats/uptimes/peers",
        }
    }
}

/// A vote broadcast by the local node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastRecord {
    pub block: String,
    pub height: u64,
    pub address: String,
    pub signature: String,
    pub timestamp: i64,
    pub num_peers: u32,
    pub sufficient_peers: u32,
    #[serde(serialize_with = "serialize_utc_millis")]
    pub created_at: DateTime<Utc>,
}

/// A peer-count report from the p2p layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerCountRecord {
    pub address: String,
    pub num_peers: u32,
    pub sufficient_peers: u32,
    #[serde(serialize_with = "serialize_utc_millis")]
    pub created_at: DateTime<Utc>,
}

/// A fully parsed record, ready for delivery.
///
/// Serializes as the bare inner record so the wire shape matches
/// what the collector expects for each endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Broadcast(BroadcastRecord),
    PeerCount(PeerCountRecord),
}

impl Record {
    pub fn family(&self) -> Family {
        match self {
            Record::Broadcast(_) => Family::Broadcast,
            Record::PeerCount(_) => Family::Peers,
        }
    }

    pub fn destination(&self) -> Destination {
        self.family().destination()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no match")]
    NoMatch,

    #[error("unknown field: {key}, found: {value}")]
    UnknownField { key: String, value: String },

    #[error("invalid integer for {key}: {value}")]
    InvalidInteger { key: String, value: String },

    #[error("no datetime found in line")]
    MissingTimestamp,

    #[error("invalid datetime: {value}")]
    InvalidTimestamp { value: String },

    #[error("no address bootstrapped")]
    NoAddressBootstrapped,

    #[error("no peers bootstrapped")]
    NoPeersBootstrapped,
}

impl ParseError {
    /// Bootstrap failures are expected right after start-up.
    pub fn is_bootstrap(&self) -> bool {
        matches!(
            self,
            ParseError::NoAddressBootstrapped | ParseError::NoPeersBootstrapped
        )
    }
}

//! Classifier: ordered substring tests, first match wins.
//!
//! The top-level [`filter`] picks the family; the per-family classifiers
//! pick the record kind. All three are total: any byte sequence maps to
//! exactly one outcome.

use super::model::{BroadcastKind, Family, FilterOutcome, PeerKind};

const BROADCAST_MARKER: &[u8] = b"[uptime miner";
const PEERS_MARKER: &[u8] = b"[p2p]";

const RECEIVED_BLOCK: &[u8] = b"Received block";
const NEW_BLOCK: &[u8] = b"Start new block";
const NEW_ROUND: &[u8] = b"Start new round";
const BROADCASTED_VOTE: &[u8] = b"Broadcasted vote";

const NUM_PEERS: &[u8] = b"numPeers";

pub fn filter(line: &[u8]) -> FilterOutcome {
    if contains(line, BROADCAST_MARKER) {
        FilterOutcome::Family(Family::Broadcast)
    } else if contains(line, PEERS_MARKER) {
        FilterOutcome::Family(Family::Peers)
    } else {
        FilterOutcome::Unrecognized
    }
}

pub fn classify_broadcast(line: &[u8]) -> BroadcastKind {
    if contains(line, RECEIVED_BLOCK) {
        BroadcastKind::ReceivedBlock
    } else if contains(line, NEW_BLOCK) {
        // "Start new block" lines carry the same vote payload, parse them as votes
        BroadcastKind::BroadcastedVote
    } else if contains(line, NEW_ROUND) {
        BroadcastKind::NewRound
    } else if contains(line, BROADCASTED_VOTE) {
        BroadcastKind::BroadcastedVote
    } else {
        BroadcastKind::Unrecognized
    }
}

pub fn classify_peers(line: &[u8]) -> PeerKind {
    if contains(line, NUM_PEERS) {
        PeerKind::NumPeers
    } else {
        PeerKind::Unrecognized
    }
}

#[inline]
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::formats::fixtures::*;

    #[test]
    fn test_filter_families() {
        assert_eq!(filter(b"... [uptime miner] ..."), FilterOutcome::Family(Family::Broadcast));
        assert_eq!(filter(b"... [p2p] ..."), FilterOutcome::Family(Family::Peers));
        assert_eq!(filter(VOTE_LINE), FilterOutcome::Family(Family::Broadcast));
        assert_eq!(filter(PEERS_LINE), FilterOutcome::Family(Family::Peers));
    }

    #[test]
    fn test_filter_misses() {
        assert_eq!(filter(b"... [netsync] ..."), FilterOutcome::Unrecognized);
        assert_eq!(filter(br#"{"user": "Anonymous", ..."#), FilterOutcome::Unrecognized);
        assert_eq!(filter(b""), FilterOutcome::Unrecognized);
        // markers are case-sensitive
        assert_eq!(filter(b"[P2P] numPeers: 3"), FilterOutcome::Unrecognized);
    }

    #[test]
    fn test_filter_first_match_wins() {
        let line = b"[uptime miner] relayed from [p2p] numPeers: 3";
        assert_eq!(filter(line), FilterOutcome::Family(Family::Broadcast));
    }

    #[test]
    fn test_filter_is_total_over_arbitrary_bytes() {
        let inputs: Vec<&[u8]> = vec![b"\xff\xfe\x00", b"\n", b"[", b"[p2p", b"uptime miner]"];
        for input in inputs {
            assert_eq!(filter(input), FilterOutcome::Unrecognized);
            assert_eq!(classify_broadcast(input), BroadcastKind::Unrecognized);
            assert_eq!(classify_peers(input), PeerKind::Unrecognized);
        }
    }

    #[test]
    fn test_classify_broadcast_kinds() {
        assert_eq!(classify_broadcast(RECEIVED_LINE), BroadcastKind::ReceivedBlock);
        assert_eq!(classify_broadcast(NEW_BLOCK_LINE), BroadcastKind::BroadcastedVote);
        assert_eq!(classify_broadcast(NEW_ROUND_LINE), BroadcastKind::NewRound);
        assert_eq!(classify_broadcast(VOTE_LINE), BroadcastKind::BroadcastedVote);
        assert_eq!(classify_broadcast(b"no match log"), BroadcastKind::Unrecognized);
    }

    #[test]
    fn test_classify_peers_kinds() {
        assert_eq!(classify_peers(PEERS_LINE), PeerKind::NumPeers);
        assert_eq!(classify_peers(b"no match log"), PeerKind::Unrecognized);
    }
}

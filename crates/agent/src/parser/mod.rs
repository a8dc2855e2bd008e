/// Log line classification and record extraction
///
/// Turns raw lines of the node log into typed records in two passes:
/// the classifier decides which family (and kind) a line belongs to, then
/// the family parser extracts fields and applies the cross-record
/// bootstrap state.
///
/// # Architecture
///
/// - `filter.rs`: ordered substring classifier (family and kind)
/// - `fields.rs`: `key: value` scan and datetime extraction
/// - `bootstrap.rs`: node address / peer counts shared across families
/// - `formats/`: one parser per family
/// - `metrics.rs`: pipeline counters

pub mod traits;
pub mod bootstrap;
pub mod fields;
pub mod filter;
pub mod formats;
pub mod metrics;
pub mod model;
mod serde_utils;

pub use bootstrap::BootstrapState;
pub use filter::filter;
pub use model::{
    BroadcastKind, BroadcastRecord, Destination, Family, FilterOutcome, ParseError,
    PeerCountRecord, PeerKind, Record,
};
pub use traits::RecordParser;

use formats::{BroadcastParser, PeerCountParser};

/// The parser responsible for a family.
pub fn parser_for(family: Family) -> &'static dyn RecordParser {
    match family {
        Family::Broadcast => &BroadcastParser,
        Family::Peers => &PeerCountParser,
    }
}

/// Parse a line already classified as `family`.
pub fn parse(family: Family, raw: &[u8], state: &mut BootstrapState) -> Result<Record, ParseError> {
    parser_for(family).parse(raw, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formats::fixtures::*;

    #[test]
    fn test_parser_for_matches_family() {
        assert_eq!(parser_for(Family::Broadcast).family(), Family::Broadcast);
        assert_eq!(parser_for(Family::Peers).family(), Family::Peers);
    }

    #[test]
    fn test_mutual_bootstrap_sequence() {
        let mut state = BootstrapState::new();

        // neither side has been seen yet
        assert_eq!(
            parse(Family::Peers, PEERS_LINE, &mut state),
            Err(ParseError::NoAddressBootstrapped)
        );
        // peers were recorded, and this vote supplies the address itself
        let vote = parse(Family::Broadcast, VOTE_LINE, &mut state).unwrap();
        assert_eq!(vote.family(), Family::Broadcast);

        let peers = parse(Family::Peers, PEERS_LINE, &mut state).unwrap();
        let Record::PeerCount(peers) = peers else {
            panic!("expected a peer count record");
        };
        assert_eq!(peers.address, "0x8d25fa2e7d");
    }

    #[test]
    fn test_vote_first_then_peers_then_vote() {
        let mut state = BootstrapState::new();
        assert_eq!(
            parse(Family::Broadcast, VOTE_LINE, &mut state),
            Err(ParseError::NoPeersBootstrapped)
        );
        assert!(parse(Family::Peers, PEERS_LINE, &mut state).is_ok());
        assert!(parse(Family::Broadcast, VOTE_LINE, &mut state).is_ok());
    }

    #[test]
    fn test_wrong_family_is_no_match() {
        let mut state = BootstrapState::new();
        assert_eq!(parse(Family::Peers, VOTE_LINE, &mut state), Err(ParseError::NoMatch));
        assert_eq!(parse(Family::Broadcast, PEERS_LINE, &mut state), Err(ParseError::NoMatch));
    }
}

use crate::parser::fields::{parse_created_at, parse_int, scan_pairs};
use crate::parser::filter::classify_broadcast;
use crate::parser::traits::*;

/// Parser for uptime-miner vote lines ("Broadcasted vote" and
/// "Start new block").
pub struct BroadcastParser;

impl RecordParser for BroadcastParser {
    fn parse(&self, raw: &[u8], state: &mut BootstrapState) -> Result<Record, ParseError> {
        if classify_broadcast(raw) != BroadcastKind::BroadcastedVote {
            return Err(ParseError::NoMatch);
        }

        let mut block = String::new();
        let mut height = 0;
        let mut address = String::new();
        let mut signature = String::new();
        let mut timestamp = 0;

        for (key, value) in scan_pairs(raw) {
            match key.as_str() {
                "Block" => block = value,
                "Height" => height = parse_int(&key, &value)?,
                "Address" => address = value.to_lowercase(),
                "Signature" => signature = value,
                "CreationTimestamp" => timestamp = parse_int(&key, &value)?,
                // "block" and "height" only appear on "Start new block" lines
                "vote" | "block" | "height" => continue,
                _ => return Err(ParseError::UnknownField { key: key.clone(), value }),
            }
        }

        let created_at = parse_created_at(raw)?;

        state.set_address(&address)?;
        let (num_peers, sufficient_peers) = state.require_peers()?;

        Ok(Record::Broadcast(BroadcastRecord {
            block,
            height,
            address,
            signature,
            timestamp,
            num_peers,
            sufficient_peers,
            created_at,
        }))
    }

    fn family(&self) -> Family {
        Family::Broadcast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::formats::fixtures::*;

    fn bootstrapped() -> BootstrapState {
        let mut state = BootstrapState::new();
        state.set_peers(16, 16).unwrap();
        state
    }

    #[test]
    fn test_parse_broadcasted_vote() {
        let mut state = bootstrapped();
        let record = BroadcastParser.parse(VOTE_LINE, &mut state).unwrap();

        let expected = Record::Broadcast(BroadcastRecord {
            block: "0x6d0ae6972cd670a8f7dfd628ef516051d0fd699906c55f80cff12540bd3786a8".to_string(),
            height: 11759001,
            address: "0x8d25fa2e7d".to_string(),
            signature: "E1A06D0AE697786A8".to_string(),
            timestamp: 1630155386,
            num_peers: 16,
            sufficient_peers: 16,
            created_at: parse_created_at(VOTE_LINE).unwrap(),
        });
        assert_eq!(record, expected);
        assert_eq!(state.address(), Some("0x8d25fa2e7d"));
    }

    #[test]
    fn test_parse_start_new_block_as_vote() {
        let mut state = bootstrapped();
        let record = BroadcastParser.parse(NEW_BLOCK_LINE, &mut state).unwrap();

        let Record::Broadcast(vote) = record else {
            panic!("expected a broadcast record");
        };
        // the vote payload wins over the outer lower-case block/height
        assert_eq!(
            vote.block,
            "0xfdca353dd0dcb8d193b1d731e065db547dcdfc6b0af20efdabb1eeff0f430cf2"
        );
        assert_eq!(vote.height, 11759201);
        assert_eq!(vote.address, "0x8d25fa2e7d");
        assert_eq!(vote.signature, "E1A06D0AE697786A8");
        assert_eq!(vote.timestamp, 1630156631);
        assert_eq!((vote.num_peers, vote.sufficient_peers), (16, 16));
        assert_eq!(vote.created_at, parse_created_at(NEW_BLOCK_LINE).unwrap());
    }

    #[test]
    fn test_address_is_lower_cased() {
        let mut state = bootstrapped();
        let line = b"[2021-08-28 09:00:26.951] INFO [uptime miner] Broadcasted vote: EENVote{Block: 0xAB, Height: 1, Address: 0x8D25FA2E7D, Signature: S, CreationTimestamp: 1}";
        let Record::Broadcast(vote) = BroadcastParser.parse(line, &mut state).unwrap() else {
            panic!("expected a broadcast record");
        };
        assert_eq!(vote.address, "0x8d25fa2e7d");
        assert_eq!(vote.block, "0xAB");
    }

    #[test]
    fn test_no_peers_bootstrapped() {
        let mut state = BootstrapState::new();
        let result = BroadcastParser.parse(VOTE_LINE, &mut state);
        assert_eq!(result, Err(ParseError::NoPeersBootstrapped));
        // the address is still recorded for the peers family
        assert_eq!(state.address(), Some("0x8d25fa2e7d"));
    }

    #[test]
    fn test_missing_address_fails() {
        let mut state = bootstrapped();
        let line = b"[2021-08-28 09:00:26.951] INFO [uptime miner] Broadcasted vote: EENVote{Block: 0xab, Height: 1, Signature: S, CreationTimestamp: 1}";
        assert_eq!(
            BroadcastParser.parse(line, &mut state),
            Err(ParseError::NoAddressBootstrapped)
        );
    }

    #[test]
    fn test_unhandled_kinds_do_not_match() {
        let mut state = bootstrapped();
        assert_eq!(BroadcastParser.parse(RECEIVED_LINE, &mut state), Err(ParseError::NoMatch));
        assert_eq!(BroadcastParser.parse(NEW_ROUND_LINE, &mut state), Err(ParseError::NoMatch));
        assert_eq!(state.address(), None);
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let mut state = bootstrapped();
        let line = b"[2021-08-28 09:00:26.951] INFO [uptime miner] Broadcasted vote: EENVote{Block: 0xab, Epoch: 3, Address: 0x8d}";
        assert_eq!(
            BroadcastParser.parse(line, &mut state),
            Err(ParseError::UnknownField {
                key: "Epoch".to_string(),
                value: "3".to_string()
            })
        );
        assert_eq!(state.address(), None);
    }

    #[test]
    fn test_bad_height_is_an_error() {
        let mut state = bootstrapped();
        let line = b"[2021-08-28 09:00:26.951] INFO [uptime miner] Broadcasted vote: EENVote{Block: 0xab, Height: 0x10, Address: 0x8d}";
        assert!(matches!(
            BroadcastParser.parse(line, &mut state),
            Err(ParseError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_bad_datetime_is_an_error() {
        let mut state = bootstrapped();
        let line = b"[2021-08-28  09:00:26.951] INFO [uptime miner] Broadcasted vote: EENVote{Block: 0xab, Height: 1, Address: 0x8d, Signature: S, CreationTimestamp: 1}";
        assert_eq!(
            BroadcastParser.parse(line, &mut state),
            Err(ParseError::MissingTimestamp)
        );
        assert_eq!(state.address(), None);
    }
}

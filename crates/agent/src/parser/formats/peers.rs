use crate::parser::fields::{parse_created_at, parse_int, scan_pairs};
use crate::parser::filter::classify_peers;
use crate::parser::traits::*;

/// Parser for p2p "numPeers" lines.
pub struct PeerCountParser;

impl RecordParser for PeerCountParser {
    fn parse(&self, raw: &[u8], state: &mut BootstrapState) -> Result<Record, ParseError> {
        if classify_peers(raw) != PeerKind::NumPeers {
            return Err(ParseError::NoMatch);
        }

        let mut num_peers = 0;
        let mut sufficient_peers = 0;

        for (key, value) in scan_pairs(raw) {
            match key.as_str() {
                "numPeers" => num_peers = parse_int(&key, &value)?,
                "sufficientNumPeers" => sufficient_peers = parse_int(&key, &value)?,
                _ => return Err(ParseError::UnknownField { key: key.clone(), value }),
            }
        }

        let created_at = parse_created_at(raw)?;

        state.set_peers(num_peers, sufficient_peers)?;
        let address = state.require_address()?.to_string();

        Ok(Record::PeerCount(PeerCountRecord {
            address,
            num_peers,
            sufficient_peers,
            created_at,
        }))
    }

    fn family(&self) -> Family {
        Family::Peers
    }
}

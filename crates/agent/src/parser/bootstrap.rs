use super::model::ParseError;

/// Cross-record state shared by the two record families.
///
/// A broadcast line supplies the node address, a peer-count line supplies
/// the peer counts, and each family needs what the other one supplied.
/// Owned by the tailer and passed by `&mut` into every parse, so there is
/// exactly one writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapState {
    last_address: String,
    last_num_peers: u32,
    last_sufficient_peers: u32,
}

impl BootstrapState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(&self) -> Option<&str> {
        if self.last_address.is_empty() {
            None
        } else {
            Some(&self.last_address)
        }
    }

    /// `(num_peers, sufficient_peers)` once a peer count has been seen.
    pub fn peers(&self) -> Option<(u32, u32)> {
        if self.last_sufficient_peers == 0 {
            None
        } else {
            Some((self.last_num_peers, self.last_sufficient_peers))
        }
    }

    /// Record the node address. An empty address leaves the state unchanged.
    pub fn set_address(&mut self, address: &str) -> Result<(), ParseError> {
        if address.is_empty() {
            return Err(ParseError::NoAddressBootstrapped);
        }
        self.last_address.clear();
        self.last_address.push_str(address);
        Ok(())
    }

    /// Record the peer counts. A zero threshold leaves the state unchanged.
    pub fn set_peers(&mut self, num_peers: u32, sufficient_peers: u32) -> Result<(), ParseError> {
        if sufficient_peers == 0 {
            return Err(ParseError::NoPeersBootstrapped);
        }
        self.last_num_peers = num_peers;
        self.last_sufficient_peers = sufficient_peers;
        Ok(())
    }

    pub fn require_address(&self) -> Result<&str, ParseError> {
        self.address().ok_or(ParseError::NoAddressBootstrapped)
    }

    pub fn require_peers(&self) -> Result<(u32, u32), ParseError> {
        self.peers().ok_or(ParseError::NoPeersBootstrapped)
    }
}

pub use super::bootstrap::BootstrapState;
pub use super::model::{
    BroadcastKind, BroadcastRecord, Family, ParseError, PeerCountRecord, PeerKind, Record,
};

pub trait RecordParser: Send + Sync {
    /// parse one raw log line of this family into a record
    fn parse(&self, raw: &[u8], state: &mut BootstrapState) -> Result<Record, ParseError>;
    fn family(&self) -> Family;
}

/// Per-family record parsers

pub mod broadcast;
pub mod peers;

pub use broadcast::BroadcastParser;
pub use peers::PeerCountParser;

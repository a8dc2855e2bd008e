//! Tail: incremental, rotation-aware reading of the node log.

pub mod reader;
pub mod rotation;

pub use reader::{LineOutcome, TailError, TailReport, TailStats, Tailer};
pub use rotation::{drain_rotation, rotated_sibling};

//! Delivery: hands parsed records to the remote collector.
//!
//! The tail loop only ever sees [`RecordSink`]; the HTTP transport runs on a
//! background worker so offset bookkeeping never waits on the network.

pub mod http;
pub mod jitter;
pub mod sink;
pub mod worker;

pub use http::CollectorClient;
pub use jitter::{DelayStrategy, NoJitter, RandomJitter};
pub use sink::{ChannelSink, DeliveryError, RecordSink};
pub use worker::spawn_delivery_worker;

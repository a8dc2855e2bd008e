//! Runtime module: process lifecycle: boot, watch loop, shutdown.

pub mod boot;
pub mod stop;
pub mod watch;

// Module structure for the edge node log agent.

// Core pipeline
pub mod parser;
pub mod tail;
pub mod delivery;

// Process lifecycle
pub mod config;
pub mod runtime;

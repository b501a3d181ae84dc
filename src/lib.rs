pub mod common;
pub mod config;
pub mod sequence;

pub mod cm;
pub mod envelope;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod stats;

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod gateway;
pub mod orchestrator;
pub mod plan;

//! Document co-signing workflow engine.
//!
//! Tracks which parties must sign a document, who may sign in which role, and
//! derives completion from the collected signatures. Signing is serialized per
//! document and every transition lands in an append-only audit trail.

pub mod audit;
pub mod blob;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod ledger;
pub mod lock;
pub mod notary;
pub mod policy;
pub mod role;
pub mod saga;
pub mod store;
pub mod telemetry;
pub mod timestamp;
pub mod utils;

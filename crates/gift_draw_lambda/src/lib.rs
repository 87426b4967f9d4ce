//! AWS-oriented adapters and handlers for the gift-exchange draw service.
//!
//! This crate owns runtime integration details (Lambda handler, API Gateway
//! routing, DynamoDB storage) and exposes a single runtime module boundary for
//! the contract, derangement, entry, store and orchestrator primitives.
//! See `crates/gift_draw_lambda/README.md` for ownership boundaries.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod runtime;

//! Shared gift-exchange draw domain primitives.
//!
//! This crate owns the draw algorithm, the one-time reveal protocol and the
//! request/response contracts. It intentionally excludes AWS SDK and Lambda
//! runtime concerns. See `crates/gift_draw_core/README.md` for ownership
//! boundaries.

pub mod contract;
pub mod derangement;
pub mod entry;
pub mod orchestrator;
pub mod store;

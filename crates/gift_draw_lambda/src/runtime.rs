pub use gift_draw_core::{contract, derangement, entry, orchestrator, store};

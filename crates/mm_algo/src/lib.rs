//! mm_algo — the heuristic passes (spec §4.3–4.8) and the hybrid TF-IDF+KNN
//! ranker (§4.9).
//!
//! Every function here is a pure transformation over `mm_core::Environment`
//! and `mm_core::MatchTables` snapshots: it proposes votes or direct
//! confirmations as plain data, never mutating engine state itself. The
//! orchestrator (`mm_pipeline::engine::MergeEngine`) applies compatibility
//! filters and owns the actual mutation — a pure algorithm layer kept
//! separate from the stateful pipeline that calls it.

pub mod anchor;
pub mod descriptors;
pub mod structural;
pub mod unique_constants;
pub mod vote_collector;

#[cfg(feature = "hybrid")]
pub mod hybrid;

pub use anchor::{anchor_classes, anchor_members};
pub use descriptors::unique_descriptor_votes;
pub use structural::structural_votes;
pub use unique_constants::unique_constants_votes;
pub use vote_collector::collect_promotions;

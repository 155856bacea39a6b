//! Concrete pipeline stages (spec §4.3-4.9). Each wraps a pure `mm_algo`
//! function, applying its proposed votes/confirmations through the engine's
//! API so compatibility filters and owner-lock propagation stay centralized
//! in `engine.rs`.

use mm_algo::{anchor_classes, anchor_members, collect_promotions, structural_votes, unique_constants_votes, unique_descriptor_votes};

use crate::engine::{MergeEngine, Pass, PassResult};
use crate::errors::EngineError;

/// Spec §4.3: direct confirmation of non-obfuscated classes/methods/fields,
/// before any voting. Runs once at the head of the pipeline.
pub struct AnchorPass;

impl Pass for AnchorPass {
    fn name(&self) -> &str {
        "anchor"
    }

    fn run(&mut self, engine: &mut MergeEngine) -> Result<PassResult, EngineError> {
        let class_pairs = anchor_classes(engine.env_a(), engine.env_b());
        for (src, tgt) in &class_pairs {
            engine.confirm_class_direct(src.clone(), tgt.clone());
        }

        let (method_pairs, field_pairs) = anchor_members(engine.env_a(), engine.env_b(), &class_pairs);
        for (src, tgt) in method_pairs {
            engine.confirm_method_direct(src, tgt);
        }
        for (src, tgt) in field_pairs {
            engine.confirm_field_direct(src, tgt);
        }

        Ok(PassResult::Continue)
    }
}

/// Spec §4.4: votes for method pairs sharing a constant unique to one
/// method in each archive.
pub struct UniqueConstantsPass;

impl Pass for UniqueConstantsPass {
    fn name(&self) -> &str {
        "unique_constants"
    }

    fn run(&mut self, engine: &mut MergeEngine) -> Result<PassResult, EngineError> {
        let votes = unique_constants_votes(engine.env_a(), engine.env_b(), engine.methods());
        for (src, tgt, weight) in votes {
            engine.vote_method(src, tgt, weight);
        }
        Ok(PassResult::Continue)
    }
}

/// Spec §4.5: within confirmed class pairs, votes for methods whose
/// remapped descriptor key is unique on both sides.
pub struct UniqueDescriptorsPass;

impl Pass for UniqueDescriptorsPass {
    fn name(&self) -> &str {
        "unique_descriptors"
    }

    fn run(&mut self, engine: &mut MergeEngine) -> Result<PassResult, EngineError> {
        let votes = unique_descriptor_votes(engine.env_a(), engine.env_b(), engine.classes(), engine.methods());
        for (src, tgt, weight) in votes {
            engine.vote_method(src, tgt, weight);
        }
        Ok(PassResult::Continue)
    }
}

/// Spec §4.6: votes for unmatched obfuscated default-package class pairs by
/// structural similarity.
pub struct StructuralPass;

impl Pass for StructuralPass {
    fn name(&self) -> &str {
        "structural"
    }

    fn run(&mut self, engine: &mut MergeEngine) -> Result<PassResult, EngineError> {
        let votes = structural_votes(engine.env_a(), engine.env_b(), engine.classes());
        for (src, tgt, weight) in votes {
            engine.vote_class(src, tgt, weight);
        }
        Ok(PassResult::Continue)
    }
}

/// Spec §4.7: promotes promotable pending entries to confirmed, per symbol
/// kind, in deterministic gap-desc/source-key-asc order.
pub struct VoteCollectorPass;

impl Pass for VoteCollectorPass {
    fn name(&self) -> &str {
        "vote_collector"
    }

    fn run(&mut self, engine: &mut MergeEngine) -> Result<PassResult, EngineError> {
        let cfg = *engine.config();

        // Each list is a snapshot taken before any confirmation in this pass
        // runs; confirming one entry can purge another's ledger down to no
        // first-place target (two sources legitimately sharing a first-place
        // target, spec §4.1), so every entry is re-validated against the
        // live table immediately before confirming, and silently skipped if
        // an earlier confirmation in this same batch has invalidated it.
        let promotable_classes = collect_promotions(engine.classes(), cfg.min_votes, cfg.min_gap, cfg.batch_percent, cfg.floor_classes);
        for src in &promotable_classes {
            engine.confirm_class_if_promotable(src, cfg.min_votes, cfg.min_gap)?;
        }

        let promotable_methods = collect_promotions(engine.methods(), cfg.min_votes, cfg.min_gap, cfg.batch_percent, cfg.floor_methods);
        for src in &promotable_methods {
            engine.confirm_method_if_promotable(src, cfg.min_votes, cfg.min_gap)?;
        }

        let promotable_fields = collect_promotions(engine.fields(), cfg.min_votes, cfg.min_gap, cfg.batch_percent, cfg.floor_fields);
        for src in &promotable_fields {
            engine.confirm_field_if_promotable(src, cfg.min_votes, cfg.min_gap)?;
        }

        Ok(PassResult::Continue)
    }
}

fn changes_occurred(engine: &MergeEngine) -> bool {
    engine.changes_this_iteration() > 0
}

/// Spec §4.8: jumps back to `target_index` (the start of the repeated
/// unique-constants/descriptors/structural/collector segment) while the
/// previous cycle produced at least one confirmation.
pub struct ConditionalLoopPass {
    target_index: usize,
}

impl ConditionalLoopPass {
    pub fn new(target_index: usize) -> Self {
        Self { target_index }
    }
}

impl Pass for ConditionalLoopPass {
    fn name(&self) -> &str {
        "conditional_loop"
    }

    fn run(&mut self, _engine: &mut MergeEngine) -> Result<PassResult, EngineError> {
        Ok(PassResult::JumpTo(self.target_index, changes_occurred))
    }
}

/// Spec §4.9: late-stage TF-IDF+KNN tie-breaker for residual pending
/// methods once iterative voting stalls. Feature-gated; the default
/// pipeline places it last, after the loop has exhausted itself.
#[cfg(feature = "hybrid")]
pub struct HybridRankerPass;

#[cfg(feature = "hybrid")]
impl Pass for HybridRankerPass {
    fn name(&self) -> &str {
        "hybrid_ranker"
    }

    fn run(&mut self, engine: &mut MergeEngine) -> Result<PassResult, EngineError> {
        if !engine.config().hybrid_enabled {
            return Ok(PassResult::Done);
        }
        let top_k = engine.config().hybrid_top_k;
        let matches = mm_algo::hybrid::rank(engine.env_a(), engine.env_b(), engine.methods(), top_k);
        for m in matches {
            engine.confirm_method_direct(m.source, m.target);
        }
        Ok(PassResult::Done)
    }
}

/// Builds the default pipeline: anchor once, then loop
/// unique-constants/unique-descriptors/structural/collector until a full
/// cycle confirms nothing, then (optionally) the hybrid ranker.
pub fn default_pipeline(engine: &mut MergeEngine) {
    engine.add_pass(Box::new(AnchorPass));
    let loop_start = 1;
    engine.add_pass(Box::new(UniqueConstantsPass));
    engine.add_pass(Box::new(UniqueDescriptorsPass));
    engine.add_pass(Box::new(StructuralPass));
    engine.add_pass(Box::new(VoteCollectorPass));
    engine.add_pass(Box::new(ConditionalLoopPass::new(loop_start)));
    #[cfg(feature = "hybrid")]
    engine.add_pass(Box::new(HybridRankerPass));
}

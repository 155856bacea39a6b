//! Engine configuration (spec §4.1 promotion criteria), threaded through the
//! `MergeEngine` constructor instead of hardcoded so `mm_cli` can override it
//! from flags.

/// Tunables for the Vote Collector pass and the pipeline's safety bound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub min_votes: u32,
    pub min_gap: i64,
    pub batch_percent: u8,
    pub floor_classes: usize,
    pub floor_methods: usize,
    pub floor_fields: usize,
    pub max_iterations: u32,
    pub hybrid_enabled: bool,
    pub hybrid_top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_votes: 3,
            min_gap: 2,
            batch_percent: 10,
            floor_classes: 5,
            floor_methods: 10,
            floor_fields: 5,
            max_iterations: 50,
            hybrid_enabled: true,
            hybrid_top_k: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_promotion_criteria() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.min_votes, 3);
        assert_eq!(cfg.min_gap, 2);
        assert_eq!(cfg.batch_percent, 10);
        assert_eq!(cfg.floor_classes, 5);
        assert_eq!(cfg.floor_methods, 10);
        assert_eq!(cfg.floor_fields, 5);
        assert_eq!(cfg.max_iterations, 50);
    }
}

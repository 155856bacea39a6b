//! Hybrid TF-IDF + KNN ranker (spec §4.9): a late-stage tie-breaker for
//! residual ambiguity once iterative voting stalls.

pub mod knn;
pub mod tfidf;
pub mod tokenize;

use mm_core::{Environment, MatchTables, MethodKey};

/// Blend of TF-IDF similarity and KNN feature-vector similarity (spec
/// §4.9 "Combiner").
pub const TFIDF_BLEND: f64 = 0.4;
pub const KNN_BLEND: f64 = 0.6;
pub const ACCEPT_THRESHOLD: f64 = 0.7;
pub const ACCEPT_GAP: f64 = 0.15;

/// Default top-k candidates considered per query (spec §4.9).
pub const DEFAULT_TOP_K: usize = 20;

/// A proposed hybrid match, with its combined score for diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct HybridMatch {
    pub source: MethodKey,
    pub target: MethodKey,
    pub combined: f64,
}

/// Ranks every still-pending method of `env_a` against the still-pending
/// methods of `env_b`, returning accepted matches (combined ≥ 0.7, gap ≥
/// 0.15). Pure function: the caller (`mm_pipeline`) applies these as direct
/// confirmations.
pub fn rank(env_a: &Environment, env_b: &Environment, methods: &MatchTables<MethodKey>, top_k: usize) -> Vec<HybridMatch> {
    let corpus: Vec<(MethodKey, Vec<String>)> = env_b
        .methods
        .values()
        .filter(|m| !methods.is_target_claimed(&m.key()))
        .map(|m| (m.key(), tokenize::tokens_for(env_b, m)))
        .collect();
    if corpus.is_empty() {
        return Vec::new();
    }
    let index = tfidf::TfIdfIndex::build(&corpus);

    let mut matches = Vec::new();
    for method_a in env_a.methods.values() {
        let key_a = method_a.key();
        if methods.is_confirmed(&key_a) {
            continue;
        }
        let query_tokens = tokenize::tokens_for(env_a, method_a);
        let candidates = index.query(&query_tokens, top_k);
        if candidates.is_empty() {
            continue;
        }

        let feature_a = knn::feature_vector(method_a);
        let mut scored: Vec<(MethodKey, f64)> = candidates
            .into_iter()
            .filter_map(|(key_b, tfidf_score)| {
                let method_b = env_b.method(&key_b)?;
                let feature_b = knn::feature_vector(method_b);
                let knn_score = knn::weighted_cosine(&feature_a, &feature_b);
                Some((key_b, TFIDF_BLEND * tfidf_score + KNN_BLEND * knn_score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let Some((best_key, best_score)) = scored.first().cloned() else { continue };
        let second_score = scored.get(1).map(|(_, s)| *s).unwrap_or(0.0);
        if best_score >= ACCEPT_THRESHOLD && best_score - second_score >= ACCEPT_GAP {
            matches.push(HybridMatch { source: key_a, target: best_key, combined: best_score });
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::model::{Constant, Instruction, Opcode};
    use mm_io::fixtures::{environment_from, raw_class, raw_method, RawClassExt, RawMethodExt};

    #[test]
    fn empty_instruction_streams_never_panic() {
        let env_a = environment_from(vec![raw_class("a").method(raw_method("m", "()V"))]);
        let env_b = environment_from(vec![raw_class("q").method(raw_method("x", "()V"))]);
        let methods: MatchTables<MethodKey> = MatchTables::new();
        let _ = rank(&env_a, &env_b, &methods, DEFAULT_TOP_K);
    }

    #[test]
    fn distinctive_shared_evidence_is_accepted() {
        let body = |n: &str| {
            raw_method(n, "(I)I")
                .constant(Constant::String("a genuinely unique diagnostic string".into()))
                .instruction(Instruction::Opcode(Opcode::Load))
                .instruction(Instruction::Opcode(Opcode::Arithmetic))
                .instruction(Instruction::Opcode(Opcode::Return))
        };
        let env_a = environment_from(vec![raw_class("a").method(body("foo"))]);
        let env_b = environment_from(vec![raw_class("q").method(body("x"))]);
        let methods: MatchTables<MethodKey> = MatchTables::new();
        let matches = rank(&env_a, &env_b, &methods, DEFAULT_TOP_K);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].combined >= ACCEPT_THRESHOLD);
    }
}

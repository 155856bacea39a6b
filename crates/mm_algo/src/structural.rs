//! Structural pass (spec §4.6): votes for unmatched obfuscated class pairs
//! in the default package, scored by superclass/interface/member-shape
//! similarity.

use std::collections::BTreeSet;

use mm_core::{weight, ClassKey, ClassRecord, Environment, MatchTables};

/// `min/max` similarity ratio, `None` if both are zero (spec §8: "must
/// default to 0 contribution, never divide by zero").
fn count_ratio(a: usize, b: usize) -> Option<f64> {
    let max = a.max(b);
    if max == 0 {
        return None;
    }
    Some(a.min(b) as f64 / max as f64)
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn descriptor_set(env: &Environment, owner: &ClassKey, of_method: bool) -> BTreeSet<String> {
    if of_method {
        env.methods_of(owner).map(|m| m.descriptor.clone()).collect()
    } else {
        env.fields_of(owner).map(|f| f.descriptor.clone()).collect()
    }
}

fn is_structural_candidate(class: &ClassRecord, classes: &MatchTables<ClassKey>) -> bool {
    class.obfuscated && class.is_in_default_package() && !classes.is_confirmed(&class.name)
}

/// Sums the structural similarity signals between one candidate pair.
/// Returns `0` (no vote) rather than a negative/undefined score.
fn score_pair(env_a: &Environment, env_b: &Environment, src: &ClassRecord, tgt: &ClassRecord, classes: &MatchTables<ClassKey>) -> u32 {
    let mut total = 0u32;

    if let (Some(sa), Some(sb)) = (&src.super_name, &tgt.super_name) {
        if classes.confirmed_target_of(sa) == Some(sb) {
            total += weight::STRONG;
        }
    }

    for iface in &src.interfaces {
        if let Some(mapped) = classes.confirmed_target_of(iface) {
            if tgt.interfaces.contains(mapped) {
                total += weight::MEDIUM;
            }
        }
    }

    let method_ratio = count_ratio(src.methods.len(), tgt.methods.len());
    let field_ratio = count_ratio(src.fields.len(), tgt.fields.len());
    if matches!(method_ratio, Some(r) if r > 0.7) && matches!(field_ratio, Some(r) if r > 0.7) {
        total += weight::WEAK;
    }

    let method_jaccard = jaccard(&descriptor_set(env_a, &src.name, true), &descriptor_set(env_b, &tgt.name, true));
    if method_jaccard > 0.5 {
        total += weight::MEDIUM;
    } else if method_jaccard > 0.3 {
        total += weight::WEAK;
    }

    let field_jaccard = jaccard(&descriptor_set(env_a, &src.name, false), &descriptor_set(env_b, &tgt.name, false));
    if field_jaccard > 0.5 {
        total += weight::WEAK;
    }

    total
}

/// Proposed `(src, tgt, weight)` votes for every unmatched obfuscated
/// default-package class pair with positive structural similarity.
/// Quadratic in the number of candidates on each side; see spec §4.6.
pub fn structural_votes(env_a: &Environment, env_b: &Environment, classes: &MatchTables<ClassKey>) -> Vec<(ClassKey, ClassKey, u32)> {
    let candidates_a: Vec<&ClassRecord> = env_a.classes.values().filter(|c| is_structural_candidate(c, classes)).collect();
    let candidates_b: Vec<&ClassRecord> = env_b.classes.values().filter(|c| is_structural_candidate(c, classes)).collect();

    let mut votes = Vec::new();
    for src in &candidates_a {
        for tgt in &candidates_b {
            let score = score_pair(env_a, env_b, src, tgt, classes);
            if score > 0 {
                votes.push((src.name.clone(), tgt.name.clone(), score));
            }
        }
    }
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_io::fixtures::{environment_from, raw_class, raw_field, raw_method, RawClassExt};

    #[test]
    fn zero_member_classes_never_divide_by_zero() {
        assert_eq!(count_ratio(0, 0), None);
        assert_eq!(jaccard(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }

    #[test]
    fn shared_descriptor_shape_votes_via_jaccard() {
        let env_a = environment_from(vec![raw_class("a")
            .method(raw_method("m1", "(I)V"))
            .method(raw_method("m2", "(Z)V"))
            .field(raw_field("f1", "I"))]);
        let env_b = environment_from(vec![raw_class("q")
            .method(raw_method("x1", "(I)V"))
            .method(raw_method("x2", "(Z)V"))
            .field(raw_field("y1", "I"))]);

        let classes: MatchTables<ClassKey> = MatchTables::new();
        let votes = structural_votes(&env_a, &env_b, &classes);
        assert_eq!(votes.len(), 1);
        assert!(votes[0].2 > 0);
    }

    #[test]
    fn confirmed_classes_are_excluded_from_candidacy() {
        let env_a = environment_from(vec![raw_class("a")]);
        let env_b = environment_from(vec![raw_class("q")]);
        let mut classes: MatchTables<ClassKey> = MatchTables::new();
        classes.confirm_direct(ClassKey::new("a"), ClassKey::new("q"));
        assert!(structural_votes(&env_a, &env_b, &classes).is_empty());
    }
}

//! Unique constants pass (spec §4.4): votes for method pairs that share a
//! literal constant unique to one method in each archive.

use std::collections::HashMap;

use mm_core::model::Constant;
use mm_core::{weight, Environment, MatchTables, MethodKey};

/// Builds the per-archive `constant -> method` map, restricted to still-
/// pending methods and significant constants. A constant seen in more than
/// one distinct method within the archive is marked non-unique (`None`).
fn unique_constant_map(env: &Environment, is_pending: impl Fn(&MethodKey) -> bool) -> HashMap<Constant, Option<MethodKey>> {
    let mut map: HashMap<Constant, Option<MethodKey>> = HashMap::new();
    for method in env.methods.values() {
        let key = method.key();
        if !is_pending(&key) {
            continue;
        }
        for constant in &method.constants {
            if !constant.is_significant() {
                continue;
            }
            map.entry(constant.clone())
                .and_modify(|slot| {
                    if slot.as_ref() != Some(&key) {
                        *slot = None;
                    }
                })
                .or_insert_with(|| Some(key.clone()));
        }
    }
    map
}

/// Vote weight for a constant shared by exactly one method on each side
/// (spec §4.4's weight table).
fn weight_for(constant: &Constant) -> u32 {
    match constant {
        Constant::String(s) if s.len() > 20 => weight::VERY_STRONG,
        Constant::String(s) if s.len() >= 11 => weight::STRONG,
        Constant::String(_) => weight::MEDIUM,
        Constant::Int(v) if v.unsigned_abs() as i64 > 1000 => weight::STRONG,
        Constant::Int(_) => weight::MEDIUM,
        Constant::Long(v) if v.unsigned_abs() as i64 > 1000 => weight::STRONG,
        Constant::Long(_) => weight::MEDIUM,
        Constant::Float(bits) if f32::from_bits(*bits).abs() as f64 > 1000.0 => weight::STRONG,
        Constant::Float(_) => weight::MEDIUM,
        Constant::Double(bits) if f64::from_bits(*bits).abs() > 1000.0 => weight::STRONG,
        Constant::Double(_) => weight::MEDIUM,
        // Never reached: `Constant::Type` is never significant.
        Constant::Type(_) => weight::WEAK,
    }
}

/// Proposed `(src, tgt, weight)` votes for methods sharing a constant
/// unique to one method in each archive.
pub fn unique_constants_votes(env_a: &Environment, env_b: &Environment, methods: &MatchTables<MethodKey>) -> Vec<(MethodKey, MethodKey, u32)> {
    let map_a = unique_constant_map(env_a, |k| !methods.is_confirmed(k));
    let map_b = unique_constant_map(env_b, |k| !methods.is_target_claimed(k));

    let mut votes = Vec::new();
    for (constant, slot_a) in &map_a {
        let Some(method_a) = slot_a else { continue };
        let Some(Some(method_b)) = map_b.get(constant) else { continue };
        votes.push((method_a.clone(), method_b.clone(), weight_for(constant)));
    }
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::model::Instruction;
    use mm_io::fixtures::{environment_from, raw_class, raw_method, RawClassExt, RawMethodExt};

    #[test]
    fn unique_string_drives_a_strong_vote() {
        let env_a = environment_from(vec![raw_class("a/A")
            .method(raw_method("foo", "()V").constant(Constant::String("Database connection failed".into())))]);
        let env_b = environment_from(vec![raw_class("b/Q")
            .method(raw_method("x", "()V").constant(Constant::String("Database connection failed".into())))]);

        let methods: MatchTables<MethodKey> = MatchTables::new();
        let votes = unique_constants_votes(&env_a, &env_b, &methods);
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].2, weight::VERY_STRONG);
    }

    #[test]
    fn constant_repeated_across_methods_in_same_archive_is_not_unique() {
        let env_a = environment_from(vec![raw_class("a/A")
            .method(raw_method("foo", "()V").constant(Constant::String("repeated value token".into())))
            .method(raw_method("bar", "()V").constant(Constant::String("repeated value token".into())))]);
        let env_b = environment_from(vec![raw_class("b/Q")
            .method(raw_method("x", "()V").constant(Constant::String("repeated value token".into())))]);

        let methods: MatchTables<MethodKey> = MatchTables::new();
        let votes = unique_constants_votes(&env_a, &env_b, &methods);
        assert!(votes.is_empty());
    }

    #[test]
    fn insignificant_constants_never_vote() {
        let env_a = environment_from(vec![raw_class("a/A").method(
            raw_method("foo", "()V").constant(Constant::String("true".into())).instruction(Instruction::Opcode(mm_core::model::Opcode::Nop)),
        )]);
        let env_b = environment_from(vec![raw_class("b/Q").method(raw_method("x", "()V").constant(Constant::String("true".into())))]);

        let methods: MatchTables<MethodKey> = MatchTables::new();
        assert!(unique_constants_votes(&env_a, &env_b, &methods).is_empty());
    }
}

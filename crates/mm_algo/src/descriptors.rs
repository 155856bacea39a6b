//! Unique descriptors pass (spec §4.5): within each confirmed class pair,
//! vote for method pairs whose remapped descriptor key is unique on both
//! sides.

use std::collections::HashMap;

use mm_core::{weight, ClassKey, Environment, MatchTables, MethodKey};

/// Rewrites every `Lname;` class reference in a JVM descriptor to its
/// confirmed target name, or `*` if the class has no confirmed match yet.
/// Primitives, array markers, and parens pass through unchanged.
fn remap_descriptor(descriptor: &str, classes: &MatchTables<ClassKey>) -> String {
    let mut out = String::with_capacity(descriptor.len());
    let bytes = descriptor.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == 'L' {
            let end = descriptor[i..].find(';').map(|p| i + p).unwrap_or(descriptor.len() - 1);
            let name = &descriptor[i + 1..end];
            out.push('L');
            match classes.confirmed_target_of(&ClassKey::new(name)) {
                Some(tgt) => out.push_str(tgt.as_str()),
                None => out.push('*'),
            }
            out.push(';');
            i = end + 1;
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

/// Builds the per-class `remapped key -> method` map, restricted to still-
/// pending methods of `owner`; duplicates are marked non-unique (`None`).
fn unique_descriptor_map(
    env: &Environment,
    owner: &ClassKey,
    classes: &MatchTables<ClassKey>,
    is_pending: impl Fn(&MethodKey) -> bool,
) -> HashMap<String, Option<MethodKey>> {
    let mut map: HashMap<String, Option<MethodKey>> = HashMap::new();
    for method in env.methods_of(owner) {
        let key = method.key();
        if !is_pending(&key) {
            continue;
        }
        let prefix = if method.is_static() { "STATIC:" } else { "INSTANCE:" };
        let remapped = format!("{prefix}{}", remap_descriptor(&method.descriptor, classes));
        map.entry(remapped)
            .and_modify(|slot| {
                if slot.as_ref() != Some(&key) {
                    *slot = None;
                }
            })
            .or_insert_with(|| Some(key.clone()));
    }
    map
}

/// Proposed `(src, tgt, STRONG)` votes for every confirmed class pair's
/// within-class descriptor-unique method pairs.
pub fn unique_descriptor_votes(
    env_a: &Environment,
    env_b: &Environment,
    classes: &MatchTables<ClassKey>,
    methods: &MatchTables<MethodKey>,
) -> Vec<(MethodKey, MethodKey, u32)> {
    let mut votes = Vec::new();
    for (src_class, tgt_class) in classes.confirmed_forward() {
        let map_a = unique_descriptor_map(env_a, src_class, classes, |k| !methods.is_confirmed(k));
        let map_b = unique_descriptor_map(env_b, tgt_class, classes, |k| !methods.is_target_claimed(k));

        for (key, slot_a) in &map_a {
            let Some(method_a) = slot_a else { continue };
            let Some(Some(method_b)) = map_b.get(key) else { continue };
            votes.push((method_a.clone(), method_b.clone(), weight::STRONG));
        }
    }
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_io::fixtures::{environment_from, raw_class, raw_method, RawClassExt};

    #[test]
    fn unique_descriptor_within_confirmed_class_votes_strong() {
        let env_a = environment_from(vec![raw_class("a/A").method(raw_method("m1", "(I)V")).method(raw_method("m2", "(Ljava/lang/String;)V"))]);
        let env_b = environment_from(vec![raw_class("b/B").method(raw_method("x1", "(I)V")).method(raw_method("x2", "(Ljava/lang/String;)V"))]);

        let mut classes: MatchTables<ClassKey> = MatchTables::new();
        classes.confirm_direct(ClassKey::new("a/A"), ClassKey::new("b/B"));
        let methods: MatchTables<MethodKey> = MatchTables::new();

        let votes = unique_descriptor_votes(&env_a, &env_b, &classes, &methods);
        assert_eq!(votes.len(), 2);
        assert!(votes.iter().all(|(_, _, w)| *w == weight::STRONG));
    }

    #[test]
    fn ambiguous_descriptors_do_not_vote() {
        let env_a = environment_from(vec![raw_class("a/A").method(raw_method("m1", "(I)V")).method(raw_method("m2", "(I)V"))]);
        let env_b = environment_from(vec![raw_class("b/B").method(raw_method("x1", "(I)V")).method(raw_method("x2", "(I)V"))]);

        let mut classes: MatchTables<ClassKey> = MatchTables::new();
        classes.confirm_direct(ClassKey::new("a/A"), ClassKey::new("b/B"));
        let methods: MatchTables<MethodKey> = MatchTables::new();

        assert!(unique_descriptor_votes(&env_a, &env_b, &classes, &methods).is_empty());
    }

    #[test]
    fn remap_descriptor_falls_back_to_wildcard_for_unconfirmed_class() {
        let classes: MatchTables<ClassKey> = MatchTables::new();
        assert_eq!(remap_descriptor("(La/Obf;)V", &classes), "(L*;)V");
    }

    proptest::proptest! {
        /// No mix of primitive descriptor characters and parens ever
        /// reaches the `L...;` branch, so remapping is a no-op on them.
        #[test]
        fn remap_descriptor_is_identity_without_class_references(
            primitives in proptest::collection::vec(proptest::sample::select(vec!['I', 'J', 'Z', 'B', 'C', 'S', 'F', 'D', 'V', '[']), 0..12)
        ) {
            let descriptor: String = std::iter::once('(').chain(primitives).chain(std::iter::once(')')).chain(std::iter::once('V')).collect();
            let classes: MatchTables<ClassKey> = MatchTables::new();
            assert_eq!(remap_descriptor(&descriptor, &classes), descriptor);
        }
    }
}

//! Anchor pass (spec §4.3): direct confirmation by non-obfuscated name
//! equality, before any voting happens.

use mm_core::{ClassKey, Environment, FieldKey, MethodKey};

/// Non-obfuscated classes present under the same binary name in both
/// environments. Ground truth, confirmed directly by the caller.
pub fn anchor_classes(env_a: &Environment, env_b: &Environment) -> Vec<(ClassKey, ClassKey)> {
    let mut pairs = Vec::new();
    for (name, class_a) in &env_a.classes {
        if !class_a.obfuscated {
            if let Some(class_b) = env_b.classes.get(name) {
                if !class_b.obfuscated {
                    pairs.push((name.clone(), class_b.name.clone()));
                }
            }
        }
    }
    pairs
}

/// For every already-anchored class pair, non-obfuscated methods/fields
/// whose name+descriptor match across the pair (spec §4.3: "for each
/// non-obfuscated method in A whose name + descriptor + non-obfuscated-ness
/// match a method in B, confirm directly; likewise fields").
pub fn anchor_members(
    env_a: &Environment,
    env_b: &Environment,
    anchored_classes: &[(ClassKey, ClassKey)],
) -> (Vec<(MethodKey, MethodKey)>, Vec<(FieldKey, FieldKey)>) {
    let mut methods = Vec::new();
    let mut fields = Vec::new();

    for (src_class, tgt_class) in anchored_classes {
        for ma in env_a.methods_of(src_class) {
            if !ma.obfuscated {
                for mb in env_b.methods_of(tgt_class) {
                    if !mb.obfuscated && mb.name == ma.name && mb.descriptor == ma.descriptor {
                        methods.push((ma.key(), mb.key()));
                        break;
                    }
                }
            }
        }
        for fa in env_a.fields_of(src_class) {
            if !fa.obfuscated {
                for fb in env_b.fields_of(tgt_class) {
                    if !fb.obfuscated && fb.name == fa.name && fb.descriptor == fa.descriptor {
                        fields.push((fa.key(), fb.key()));
                        break;
                    }
                }
            }
        }
    }

    (methods, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_io::fixtures::{environment_from, raw_class, raw_field, raw_method, RawClassExt};

    #[test]
    fn anchors_classes_by_non_obfuscated_name() {
        let env_a = environment_from(vec![raw_class("com/example/client_A"), raw_class("com/example/a")]);
        let env_b = environment_from(vec![raw_class("com/example/client_A"), raw_class("com/example/x")]);
        let pairs = anchor_classes(&env_a, &env_b);
        assert_eq!(pairs, vec![(ClassKey::new("com/example/client_A"), ClassKey::new("com/example/client_A"))]);
    }

    #[test]
    fn anchors_members_of_anchored_class() {
        let env_a = environment_from(vec![raw_class("com/example/client_A")
            .method(raw_method("clientRun", "()V"))
            .field(raw_field("clientFlag", "Z"))]);
        let env_b = environment_from(vec![raw_class("com/example/client_A")
            .method(raw_method("clientRun", "()V"))
            .field(raw_field("clientFlag", "Z"))]);
        let classes = anchor_classes(&env_a, &env_b);
        let (methods, fields) = anchor_members(&env_a, &env_b, &classes);
        assert_eq!(methods.len(), 1);
        assert_eq!(fields.len(), 1);
    }
}

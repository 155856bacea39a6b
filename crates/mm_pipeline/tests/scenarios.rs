//! End-to-end pipeline scenarios (spec §8 "End-to-end scenarios").

use mm_core::model::{Constant, Instruction, Opcode};
use mm_core::{ClassKey, FieldKey, MethodKey};
use mm_io::fixtures::{environment_from, raw_class, raw_field, raw_method, RawClassExt, RawMethodExt};
use mm_pipeline::passes::default_pipeline;
use mm_pipeline::{EngineConfig, MergeEngine, Pass, PassResult};

/// Scenario 1: A = B with all names clean. Every class/method/field should
/// map to itself at full coverage.
#[test]
fn identity_scenario_maps_every_symbol_to_itself() {
    let make = || {
        vec![raw_class("com/example/clientApp")
            .method(raw_method("clientRun", "()V"))
            .method(raw_method("clientStop", "()V"))
            .field(raw_field("clientFlag", "Z"))]
    };
    let env_a = environment_from(make());
    let env_b = environment_from(make());

    let mut engine = MergeEngine::new(env_a, env_b, EngineConfig::default());
    default_pipeline(&mut engine);
    let summary = engine.run().unwrap();

    let owner = ClassKey::new("com/example/clientApp");
    assert_eq!(summary.bundle.classes.get(&owner), Some(&owner));
    assert_eq!(summary.bundle.class_coverage().ratio(), 1.0);
    assert_eq!(summary.bundle.method_coverage().ratio(), 1.0);
    assert_eq!(summary.bundle.field_coverage().ratio(), 1.0);
}

/// Scenario 2: identical structure, obfuscated default-package classes with
/// matching method/field descriptor shapes. The structural pass alone
/// should be enough to confirm the class pair.
#[test]
fn pure_rename_scenario_confirms_via_structural_similarity() {
    let env_a = environment_from(vec![raw_class("a")
        .method(raw_method("m1", "(I)V"))
        .method(raw_method("m2", "(Z)V"))
        .field(raw_field("f1", "I"))]);
    let env_b = environment_from(vec![raw_class("q")
        .method(raw_method("x1", "(I)V"))
        .method(raw_method("x2", "(Z)V"))
        .field(raw_field("y1", "I"))]);

    let mut engine = MergeEngine::new(env_a, env_b, EngineConfig::default());
    default_pipeline(&mut engine);
    let summary = engine.run().unwrap();

    assert_eq!(summary.bundle.classes.get(&ClassKey::new("a")), Some(&ClassKey::new("q")));
}

/// Scenario 3: a string constant unique to one method on each side drives a
/// single confirming vote once the collector runs.
#[test]
fn unique_string_scenario_promotes_with_gap_five() {
    let env_a = environment_from(vec![raw_class("a/A").method(
        raw_method("foo", "()V")
            .constant(Constant::String("Database connection failed".into()))
            .instruction(Instruction::Opcode(Opcode::Return)),
    )]);
    let env_b = environment_from(vec![raw_class("b/Q").method(
        raw_method("x", "()V")
            .constant(Constant::String("Database connection failed".into()))
            .instruction(Instruction::Opcode(Opcode::Return)),
    )]);

    let mut engine = MergeEngine::new(env_a, env_b, EngineConfig::default());
    default_pipeline(&mut engine);
    let summary = engine.run().unwrap();

    let foo = MethodKey::build(&ClassKey::new("a/A"), "foo", "()V");
    let x = MethodKey::build(&ClassKey::new("b/Q"), "x", "()V");
    assert_eq!(summary.bundle.methods.get(&foo), Some(&x));
}

/// Scenario 4: two methods per side with identical signatures and
/// constants. Gap is 0 on both candidates, so neither ever promotes.
#[test]
fn ambiguous_pair_scenario_leaves_both_pending() {
    let env_a = environment_from(vec![raw_class("a/A")
        .method(raw_method("foo", "()V").constant(Constant::String("same shared evidence token".into())))
        .method(raw_method("bar", "()V").constant(Constant::String("same shared evidence token".into())))]);
    let env_b = environment_from(vec![raw_class("b/Q")
        .method(raw_method("x", "()V").constant(Constant::String("same shared evidence token".into())))
        .method(raw_method("y", "()V").constant(Constant::String("same shared evidence token".into())))]);

    let mut engine = MergeEngine::new(env_a, env_b, EngineConfig::default());
    default_pipeline(&mut engine);
    let summary = engine.run().unwrap();

    assert!(summary.bundle.methods.is_empty());
}

/// Scenario 5: owner-lock propagation purges a vote cast toward a class the
/// engine has ruled out, narrowing the gap on the remaining candidate.
#[test]
fn owner_lock_narrowing_purges_the_non_owner_vote() {
    let env_a = environment_from(vec![raw_class("a/A").method(raw_method("m", "()V")).method(raw_method("n", "()V"))]);
    let env_b = environment_from(vec![raw_class("b/B1").method(raw_method("x", "()V")), raw_class("b/B2").method(raw_method("y", "()V"))]);

    let mut engine = MergeEngine::new(env_a, env_b, EngineConfig::default());

    let m = MethodKey::build(&ClassKey::new("a/A"), "m", "()V");
    let x = MethodKey::build(&ClassKey::new("b/B1"), "x", "()V");
    let y = MethodKey::build(&ClassKey::new("b/B2"), "y", "()V");
    engine.vote_method(m.clone(), x.clone(), 2);
    engine.vote_method(m.clone(), y, 3);

    engine.confirm_class_direct(ClassKey::new("a/A"), ClassKey::new("b/B1"));

    let entry = engine.methods().pending(&m).unwrap();
    assert_eq!(entry.first_target(), Some(&x));
    assert_eq!(entry.second_votes(), 0);
}

/// Scenario 6: a pathological pipeline that confirms exactly one new symbol
/// per loop iteration never converges within the cap. The engine must halt
/// at `max_iterations`, emit a warning, and still return the partial bundle.
#[test]
fn iteration_cap_scenario_halts_with_a_warning() {
    struct AlwaysJump;
    impl Pass for AlwaysJump {
        fn name(&self) -> &str {
            "always_jump"
        }
        fn run(&mut self, _engine: &mut MergeEngine) -> Result<PassResult, mm_pipeline::EngineError> {
            fn always(_e: &MergeEngine) -> bool {
                true
            }
            Ok(PassResult::JumpTo(0, always))
        }
    }

    let env_a = environment_from(vec![raw_class("a/A")]);
    let env_b = environment_from(vec![raw_class("b/B")]);
    let mut config = EngineConfig::default();
    config.max_iterations = 50;
    let mut engine = MergeEngine::new(env_a, env_b, config);
    engine.add_pass(Box::new(AlwaysJump));

    let summary = engine.run().unwrap();

    assert_eq!(summary.iterations, 50);
    assert_eq!(summary.warnings.len(), 1);
}

/// §8 invariant: forward and inverse confirmed maps are mutual inverses —
/// equivalently, no two sources are ever confirmed to the same target.
#[test]
fn confirmed_maps_never_let_two_sources_share_a_target() {
    let env_a = environment_from(vec![raw_class("com/example/clientOne").method(raw_method("clientGo", "()V"))]);
    let env_b = environment_from(vec![raw_class("com/example/clientOne").method(raw_method("clientGo", "()V"))]);

    let mut engine = MergeEngine::new(env_a, env_b, EngineConfig::default());
    default_pipeline(&mut engine);
    let summary = engine.run().unwrap();

    let mut targets: Vec<&ClassKey> = summary.bundle.classes.values().collect();
    let before = targets.len();
    targets.sort();
    targets.dedup();
    assert_eq!(targets.len(), before);
}

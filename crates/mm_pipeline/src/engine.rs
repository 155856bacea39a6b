//! The Merge Engine (spec §4.1): owns both environments and all match
//! state, exposes the voting API to passes, and drives the pass pipeline to
//! a fixed point.

use mm_core::{ClassKey, Environment, FieldKey, MatchTables, MethodKey};
use tracing::{debug, info, info_span, warn};

use crate::bundle::ResultBundle;
use crate::config::EngineConfig;
use crate::errors::EngineError;

/// One pipeline stage. `run` returns what the engine should do next; the
/// engine itself evaluates `JumpTo`'s predicate, never the pass (spec §9
/// "polymorphic pass dispatch": either a trait or a tagged sum is fine,
/// this crate picks the trait-object form so `add_pass` can hold a
/// `Vec<Box<dyn Pass>>`).
pub trait Pass {
    fn name(&self) -> &str;
    fn run(&mut self, engine: &mut MergeEngine) -> Result<PassResult, EngineError>;
}

/// What a pass wants the engine to do after it runs (spec §4.1).
pub enum PassResult {
    Continue,
    /// `predicate` is a plain function pointer, not a boxed closure: the
    /// only state it needs (`changes_last_cycle`) lives on the engine it is
    /// handed, so there is nothing to capture.
    JumpTo(usize, fn(&MergeEngine) -> bool),
    Done,
}

/// Summary of one `MergeEngine::run` invocation: the bundle plus anything a
/// caller (`mm_cli`) should report to the user (spec §7 "convergence
/// failure... warning, return partial result bundle").
#[derive(Debug)]
pub struct RunSummary {
    pub bundle: ResultBundle,
    pub iterations: u32,
    pub warnings: Vec<EngineError>,
}

/// Owns both environments, the three match tables, the pass pipeline, and
/// the iteration/change counters (spec §4.1).
pub struct MergeEngine {
    env_a: Environment,
    env_b: Environment,
    classes: MatchTables<ClassKey>,
    methods: MatchTables<MethodKey>,
    fields: MatchTables<FieldKey>,
    config: EngineConfig,
    passes: Vec<Box<dyn Pass>>,
    changes_this_iteration: u32,
    iterations: u32,
}

impl MergeEngine {
    pub fn new(env_a: Environment, env_b: Environment, config: EngineConfig) -> Self {
        Self {
            env_a,
            env_b,
            classes: MatchTables::new(),
            methods: MatchTables::new(),
            fields: MatchTables::new(),
            config,
            passes: Vec::new(),
            changes_this_iteration: 0,
            iterations: 0,
        }
    }

    pub fn env_a(&self) -> &Environment {
        &self.env_a
    }

    pub fn env_b(&self) -> &Environment {
        &self.env_b
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classes(&self) -> &MatchTables<ClassKey> {
        &self.classes
    }

    pub fn methods(&self) -> &MatchTables<MethodKey> {
        &self.methods
    }

    pub fn fields(&self) -> &MatchTables<FieldKey> {
        &self.fields
    }

    pub fn changes_this_iteration(&self) -> u32 {
        self.changes_this_iteration
    }

    /// Reset performed by the engine itself, exactly when a loop-back jump
    /// is accepted (spec §4.8: "reset at the start of each iteration, not
    /// the end" — the start of the new iteration and the end of the old one
    /// are the same instant once no pass runs between them).
    fn reset_changes_counter(&mut self) {
        self.changes_this_iteration = 0;
    }

    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    // --- voting -------------------------------------------------------

    /// No per-vote compatibility filter for classes (spec §4.2: "type
    /// compatibility is left as a future filter point").
    pub fn vote_class(&mut self, src: ClassKey, tgt: ClassKey, weight: u32) -> bool {
        let accepted = self.classes.vote(src.clone(), tgt.clone(), weight);
        debug!(src = %src, tgt = %tgt, weight, accepted, "class vote");
        accepted
    }

    /// Rejects static/instance mismatches, constructor-marker mismatches,
    /// and owner-lock violations before accumulating (spec §4.2).
    ///
    /// The owner-lock check is against `self.classes` directly, not a lock
    /// stamped on the pending entry: a stamp is only written at class
    /// confirmation time (`apply_class_owner_lock`), so an entry created for
    /// the first time *after* its owner class already confirmed would never
    /// receive one, letting a cross-owner vote slip through undetected. The
    /// owner table is authoritative and already reflects any confirmation
    /// regardless of when the entry was created; `apply_class_owner_lock`
    /// still purges votes accumulated by pre-existing entries before their
    /// owner confirmed.
    pub fn vote_method(&mut self, src: MethodKey, tgt: MethodKey, weight: u32) -> bool {
        let Some(src_m) = self.env_a.method(&src) else { return false };
        let Some(tgt_m) = self.env_b.method(&tgt) else { return false };
        if src_m.is_static() != tgt_m.is_static() {
            return false;
        }
        if src_m.is_constructor_marker() != tgt_m.is_constructor_marker() {
            return false;
        }
        if let Some(locked_to) = self.classes.confirmed_target_of(&src_m.owner) {
            if &tgt_m.owner != locked_to {
                return false;
            }
        }
        let accepted = self.methods.vote(src.clone(), tgt.clone(), weight);
        debug!(src = %src, tgt = %tgt, weight, accepted, "method vote");
        accepted
    }

    /// Rejects static/instance mismatches and owner-lock violations (spec
    /// §4.2). See `vote_method` for why the lock is read from `self.classes`
    /// rather than from the pending entry.
    pub fn vote_field(&mut self, src: FieldKey, tgt: FieldKey, weight: u32) -> bool {
        let Some(src_f) = self.env_a.field(&src) else { return false };
        let Some(tgt_f) = self.env_b.field(&tgt) else { return false };
        if src_f.is_static() != tgt_f.is_static() {
            return false;
        }
        if let Some(locked_to) = self.classes.confirmed_target_of(&src_f.owner) {
            if &tgt_f.owner != locked_to {
                return false;
            }
        }
        let accepted = self.fields.vote(src.clone(), tgt.clone(), weight);
        debug!(src = %src, tgt = %tgt, weight, accepted, "field vote");
        accepted
    }

    // --- confirmation ---------------------------------------------------

    /// Promotes `src` to confirmed and cascades owner-lock to every method
    /// and field it owns (spec §3, §4.1).
    pub fn confirm_class(&mut self, src: &ClassKey) -> Result<ClassKey, EngineError> {
        let tgt = self.classes.confirm(src).map_err(|e| EngineError::Class(src.to_string(), e))?;
        self.apply_class_owner_lock(src, &tgt);
        self.changes_this_iteration += 1;
        info!(src = %src, tgt = %tgt, "class confirmed");
        Ok(tgt)
    }

    pub fn confirm_method(&mut self, src: &MethodKey) -> Result<MethodKey, EngineError> {
        let tgt = self.methods.confirm(src).map_err(|e| EngineError::Method(src.to_string(), e))?;
        self.changes_this_iteration += 1;
        info!(src = %src, tgt = %tgt, "method confirmed");
        Ok(tgt)
    }

    pub fn confirm_field(&mut self, src: &FieldKey) -> Result<FieldKey, EngineError> {
        let tgt = self.fields.confirm(src).map_err(|e| EngineError::Field(src.to_string(), e))?;
        self.changes_this_iteration += 1;
        info!(src = %src, tgt = %tgt, "field confirmed");
        Ok(tgt)
    }

    /// Re-validates promotability immediately before confirming, rather than
    /// trusting a batch snapshot taken before the loop started. An earlier
    /// confirmation in the same batch can purge `src`'s ledger entirely (two
    /// sources legitimately sharing a first-place target is expected, spec
    /// §4.1: "confirming may drop other entries to zero votes"), so a no
    /// longer promotable entry is skipped here rather than treated as the
    /// `ConfirmWithoutTarget` precondition violation `confirm_class` raises.
    pub fn confirm_class_if_promotable(&mut self, src: &ClassKey, min_votes: u32, min_gap: i64) -> Result<Option<ClassKey>, EngineError> {
        if !self.classes.pending(src).is_some_and(|e| e.is_promotable(min_votes, min_gap)) {
            return Ok(None);
        }
        self.confirm_class(src).map(Some)
    }

    pub fn confirm_method_if_promotable(&mut self, src: &MethodKey, min_votes: u32, min_gap: i64) -> Result<Option<MethodKey>, EngineError> {
        if !self.methods.pending(src).is_some_and(|e| e.is_promotable(min_votes, min_gap)) {
            return Ok(None);
        }
        self.confirm_method(src).map(Some)
    }

    pub fn confirm_field_if_promotable(&mut self, src: &FieldKey, min_votes: u32, min_gap: i64) -> Result<Option<FieldKey>, EngineError> {
        if !self.fields.pending(src).is_some_and(|e| e.is_promotable(min_votes, min_gap)) {
            return Ok(None);
        }
        self.confirm_field(src).map(Some)
    }

    /// Direct confirmation bypassing voting (spec §4.3 anchor pass). Returns
    /// `false` (no-op) rather than erroring if the target is already
    /// claimed by a different source — anchor candidates are name
    /// coincidences, not programmer preconditions.
    pub fn confirm_class_direct(&mut self, src: ClassKey, tgt: ClassKey) -> bool {
        let ok = self.classes.confirm_direct(src.clone(), tgt.clone());
        if ok {
            self.apply_class_owner_lock(&src, &tgt);
            self.changes_this_iteration += 1;
        }
        ok
    }

    pub fn confirm_method_direct(&mut self, src: MethodKey, tgt: MethodKey) -> bool {
        let ok = self.methods.confirm_direct(src, tgt);
        if ok {
            self.changes_this_iteration += 1;
        }
        ok
    }

    pub fn confirm_field_direct(&mut self, src: FieldKey, tgt: FieldKey) -> bool {
        let ok = self.fields.confirm_direct(src, tgt);
        if ok {
            self.changes_this_iteration += 1;
        }
        ok
    }

    fn apply_class_owner_lock(&mut self, owner_class: &ClassKey, locked_to: &ClassKey) {
        self.methods.apply_owner_lock(
            |k| self.env_a.method(k).map(|m| m.owner.clone()).unwrap_or_else(|| ClassKey::new("")),
            owner_class,
            locked_to,
            |k| self.env_b.method(k).map(|m| m.owner.clone()).unwrap_or_else(|| ClassKey::new("")),
        );
        self.fields.apply_owner_lock(
            |k| self.env_a.field(k).map(|f| f.owner.clone()).unwrap_or_else(|| ClassKey::new("")),
            owner_class,
            locked_to,
            |k| self.env_b.field(k).map(|f| f.owner.clone()).unwrap_or_else(|| ClassKey::new("")),
        );
    }

    // --- pipeline ---------------------------------------------------

    /// Drives the pipeline to a fixed point and assembles the Result Bundle.
    /// Precondition violations abort via `Err`; the iteration cap is a
    /// warning, not an error (spec §7).
    pub fn run(mut self) -> Result<RunSummary, EngineError> {
        let total_classes = self.env_a.classes.len();
        let total_methods = self.env_a.methods.len();
        let total_fields = self.env_a.fields.len();

        let passes = std::mem::take(&mut self.passes);
        let mut warnings = Vec::new();
        let mut i = 0usize;

        while i < passes.len() {
            if self.iterations >= self.config.max_iterations {
                warn!(cap = self.config.max_iterations, "iteration cap reached with changes still occurring");
                warnings.push(EngineError::ConvergenceWarning(self.config.max_iterations));
                break;
            }

            let span = info_span!("pass", name = passes[i].name(), index = i, iteration = self.iterations);
            let _enter = span.enter();
            let result = {
                // SAFETY-free indexing trick: `passes` no longer lives on
                // `self`, so `self` is free to be reborrowed mutably here.
                let pass = &mut passes[i];
                pass.run(&mut self)?
            };

            match result {
                PassResult::Continue => i += 1,
                PassResult::Done => break,
                PassResult::JumpTo(target, predicate) => {
                    if predicate(&self) {
                        self.iterations += 1;
                        self.reset_changes_counter();
                        i = target;
                    } else {
                        i += 1;
                    }
                }
            }
        }

        self.passes = passes;

        let bundle = ResultBundle::new(
            self.classes.confirmed_forward().clone(),
            self.methods.confirmed_forward().clone(),
            self.fields.confirmed_forward().clone(),
            total_classes,
            total_methods,
            total_fields,
        );

        Ok(RunSummary { bundle, iterations: self.iterations, warnings })
    }
}

//! Match tables and voting entries (spec §3 "Match entry" / "Match tables",
//! §4.2 "Voting Entry").
//!
//! `MatchTables<K>` is generic over the symbol-kind key type so the three
//! concrete instantiations (`MatchTables<ClassKey>`, `MatchTables<MethodKey>`,
//! `MatchTables<FieldKey>`) share one implementation instead of three
//! hand-duplicated ones. Compatibility filters (static/instance, constructor
//! marker, owner-lock) depend on the `Environment`s and therefore live one
//! layer up, in the Merge Engine (`mm_pipeline::engine`) — this module only
//! owns the ledger bookkeeping spec §3/§4.2 describe.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::keys::ClassKey;

/// Precondition violations (spec §7: "programmer errors; the engine must
/// fail fast with a descriptive diagnostic").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TablesError {
    #[error("cannot confirm {0}: entry has no first-place target")]
    ConfirmWithoutTarget(String),
    #[error("cannot confirm {0} -> {1}: target already claimed by {2}")]
    ConfirmTargetAlreadyClaimed(String, String, String),
    #[error("{0} is not a pending entry")]
    NotPending(String),
}

/// Marker trait naming the three symbol kinds without repeating the
/// `MatchTables`/`VotingEntry` implementation per kind. `mm_pipeline` uses
/// the associated `Key` to name `MatchTables<Class::Key>` etc. as
/// `ClassTables`/`MethodTables`/`FieldTables` type aliases.
pub trait SymbolKind {
    type Key: Ord + Clone + std::fmt::Display + std::fmt::Debug;
}

/// Class-kind marker.
pub enum Class {}
/// Method-kind marker.
pub enum Method {}
/// Field-kind marker.
pub enum Field {}

impl SymbolKind for Class {
    type Key = ClassKey;
}
impl SymbolKind for Method {
    type Key = crate::keys::MethodKey;
}
impl SymbolKind for Field {
    type Key = crate::keys::FieldKey;
}

/// Per-candidate vote ledger for one pending source symbol (spec §4.2).
#[derive(Clone, Debug)]
pub struct VotingEntry<K: Ord + Clone> {
    source: K,
    ledger: BTreeMap<K, u32>,
    first: Option<(K, u32)>,
    second_votes: u32,
    owner_lock: Option<ClassKey>,
    confirmed: Option<K>,
}

impl<K: Ord + Clone + std::fmt::Display> VotingEntry<K> {
    pub fn new(source: K) -> Self {
        Self {
            source,
            ledger: BTreeMap::new(),
            first: None,
            second_votes: 0,
            owner_lock: None,
            confirmed: None,
        }
    }

    pub fn source(&self) -> &K {
        &self.source
    }

    /// Adds `weight` to the accumulated ledger total for `target` and
    /// recomputes first/second place. Weight accumulation, never replacement.
    pub fn add_vote(&mut self, target: K, weight: u32) {
        *self.ledger.entry(target).or_insert(0) += weight;
        self.recompute();
    }

    /// Zeroes the ledger entry for `target` and recomputes first/second from
    /// scratch, per spec §4.2: "needed when a target becomes globally
    /// claimed or when an owner-lock invalidates candidates."
    pub fn remove_vote(&mut self, target: &K) {
        self.ledger.remove(target);
        self.recompute();
    }

    /// Drops every ledger candidate whose resolved owner isn't `owner`. Used
    /// for owner-lock propagation (spec §3: "all votes whose target owner
    /// does not equal the locked name are purged").
    pub fn purge_non_owner(&mut self, owner: &ClassKey, owner_of: impl Fn(&K) -> ClassKey) {
        self.ledger.retain(|tgt, _| &owner_of(tgt) == owner);
        self.recompute();
    }

    fn recompute(&mut self) {
        // Sort descending by weight, ties broken by key ascending — gives a
        // deterministic first/second even when several targets tie on votes.
        let mut entries: Vec<(&K, &u32)> = self.ledger.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        self.first = entries.first().map(|(k, v)| ((*k).clone(), **v));
        self.second_votes = entries.get(1).map(|(_, v)| **v).unwrap_or(0);
    }

    pub fn first_target(&self) -> Option<&K> {
        self.first.as_ref().map(|(k, _)| k)
    }

    pub fn first_votes(&self) -> u32 {
        self.first.as_ref().map(|(_, v)| *v).unwrap_or(0)
    }

    pub fn second_votes(&self) -> u32 {
        self.second_votes
    }

    /// Vote gap (spec glossary): `first − second`.
    pub fn gap(&self) -> i64 {
        self.first_votes() as i64 - self.second_votes as i64
    }

    pub fn owner_lock(&self) -> Option<&ClassKey> {
        self.owner_lock.as_ref()
    }

    pub fn set_owner_lock(&mut self, owner: ClassKey) {
        self.owner_lock = Some(owner);
    }

    pub fn is_promotable(&self, min_votes: u32, min_gap: i64) -> bool {
        self.first.is_some() && self.first_votes() >= min_votes && self.gap() >= min_gap
    }
}

/// Pending + confirmed (forward/inverse) maps for one symbol kind.
#[derive(Clone, Debug, Default)]
pub struct MatchTables<K: Ord + Clone + std::fmt::Display> {
    pending: BTreeMap<K, VotingEntry<K>>,
    confirmed_forward: BTreeMap<K, K>,
    confirmed_inverse: BTreeMap<K, K>,
}

impl<K: Ord + Clone + std::fmt::Display + std::fmt::Debug> MatchTables<K> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            confirmed_forward: BTreeMap::new(),
            confirmed_inverse: BTreeMap::new(),
        }
    }

    /// Casts a vote (spec §4.1 `vote_*`). Compatibility filters must already
    /// have been applied by the caller — this only enforces the
    /// already-confirmed / target-already-claimed invariants and ledger
    /// accumulation. Returns whether the vote was accepted.
    pub fn vote(&mut self, src: K, tgt: K, weight: u32) -> bool {
        if let Some(existing) = self.confirmed_forward.get(&src) {
            return existing == &tgt;
        }
        if let Some(claimant) = self.confirmed_inverse.get(&tgt) {
            return claimant == &src;
        }
        self.pending
            .entry(src.clone())
            .or_insert_with(|| VotingEntry::new(src))
            .add_vote(tgt, weight);
        true
    }

    pub fn pending(&self, src: &K) -> Option<&VotingEntry<K>> {
        self.pending.get(src)
    }

    pub fn pending_mut(&mut self, src: &K) -> Option<&mut VotingEntry<K>> {
        self.pending.get_mut(src)
    }

    pub fn pending_entries(&self) -> impl Iterator<Item = &VotingEntry<K>> {
        self.pending.values()
    }

    pub fn confirmed_forward(&self) -> &BTreeMap<K, K> {
        &self.confirmed_forward
    }

    pub fn confirmed_target_of(&self, src: &K) -> Option<&K> {
        self.confirmed_forward.get(src)
    }

    pub fn is_confirmed(&self, src: &K) -> bool {
        self.confirmed_forward.contains_key(src)
    }

    pub fn is_target_claimed(&self, tgt: &K) -> bool {
        self.confirmed_inverse.contains_key(tgt)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Promotes `src` from pending to confirmed (spec §4.1 `confirm_*`).
    /// Purges the newly-bound target from every other pending entry's
    /// ledger. Returns the confirmed target.
    pub fn confirm(&mut self, src: &K) -> Result<K, TablesError> {
        let entry = self
            .pending
            .get(src)
            .ok_or_else(|| TablesError::NotPending(src.to_string()))?;
        let tgt = entry
            .first_target()
            .cloned()
            .ok_or_else(|| TablesError::ConfirmWithoutTarget(src.to_string()))?;
        if let Some(claimant) = self.confirmed_inverse.get(&tgt) {
            return Err(TablesError::ConfirmTargetAlreadyClaimed(
                src.to_string(),
                tgt.to_string(),
                claimant.to_string(),
            ));
        }

        self.pending.remove(src);
        self.confirmed_forward.insert(src.clone(), tgt.clone());
        self.confirmed_inverse.insert(tgt.clone(), src.clone());

        for other in self.pending.values_mut() {
            other.remove_vote(&tgt);
        }

        Ok(tgt)
    }

    /// Confirms `(src, tgt)` directly, bypassing the pending ledger entirely
    /// (spec §4.3 anchor pass: "not via voting — this is direct"). Still
    /// purges `tgt` from every pending entry's ledger. Returns `false`
    /// (no-op) if `tgt` is already claimed by a different source.
    pub fn confirm_direct(&mut self, src: K, tgt: K) -> bool {
        if let Some(claimant) = self.confirmed_inverse.get(&tgt) {
            return claimant == &src;
        }
        if let Some(existing) = self.confirmed_forward.get(&src) {
            return existing == &tgt;
        }
        self.pending.remove(&src);
        self.confirmed_forward.insert(src.clone(), tgt.clone());
        self.confirmed_inverse.insert(tgt.clone(), src);
        for other in self.pending.values_mut() {
            other.remove_vote(&tgt);
        }
        true
    }

    /// Applies an owner-lock to every pending entry whose source owner is
    /// `owner_class`, purging any target candidates outside `locked_to`
    /// (spec §3: class-confirmation owner-lock propagation).
    pub fn apply_owner_lock(
        &mut self,
        sources_owned_by: impl Fn(&K) -> ClassKey,
        owner_class: &ClassKey,
        locked_to: &ClassKey,
        owner_of_target: impl Fn(&K) -> ClassKey,
    ) {
        for entry in self.pending.values_mut() {
            if &sources_owned_by(entry.source()) == owner_class {
                entry.set_owner_lock(locked_to.clone());
                entry.purge_non_owner(locked_to, &owner_of_target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::ClassKey;

    fn ck(s: &str) -> ClassKey {
        ClassKey::new(s)
    }

    #[test]
    fn vote_accumulates_and_recomputes_gap() {
        let mut t: MatchTables<ClassKey> = MatchTables::new();
        assert!(t.vote(ck("A"), ck("X"), 2));
        assert!(t.vote(ck("A"), ck("X"), 3));
        assert!(t.vote(ck("A"), ck("Y"), 1));
        let e = t.pending(&ck("A")).unwrap();
        assert_eq!(e.first_votes(), 5);
        assert_eq!(e.second_votes(), 1);
        assert_eq!(e.gap(), 4);
    }

    #[test]
    fn vote_rejected_once_target_claimed_by_other() {
        let mut t: MatchTables<ClassKey> = MatchTables::new();
        t.vote(ck("A"), ck("X"), 5);
        t.confirm(&ck("A")).unwrap();
        assert!(!t.vote(ck("B"), ck("X"), 100));
        assert!(t.vote(ck("A"), ck("X"), 1)); // already confirmed to X: accepted (no-op)
    }

    #[test]
    fn confirm_without_target_fails() {
        let mut t: MatchTables<ClassKey> = MatchTables::new();
        t.pending.insert(ck("A"), VotingEntry::new(ck("A")));
        assert!(matches!(t.confirm(&ck("A")), Err(TablesError::ConfirmWithoutTarget(_))));
    }

    #[test]
    fn confirm_purges_target_from_other_pending_entries() {
        let mut t: MatchTables<ClassKey> = MatchTables::new();
        t.vote(ck("A"), ck("X"), 5);
        t.vote(ck("B"), ck("X"), 3);
        t.vote(ck("B"), ck("Y"), 1);
        t.confirm(&ck("A")).unwrap();
        let b = t.pending(&ck("B")).unwrap();
        assert_eq!(b.first_target(), Some(&ck("Y")));
        assert_eq!(b.first_votes(), 1);
    }

    #[test]
    fn remove_vote_restores_exact_prior_sum_when_reapplied() {
        let mut e = VotingEntry::new(ck("A"));
        e.add_vote(ck("X"), 5);
        e.add_vote(ck("Y"), 2);
        assert_eq!(e.first_votes(), 5);
        e.remove_vote(&ck("X"));
        assert_eq!(e.first_votes(), 2);
        e.add_vote(ck("X"), 5);
        assert_eq!(e.first_votes(), 5);
        assert_eq!(e.second_votes(), 2);
    }

    #[test]
    fn single_candidate_gap_is_trivially_met() {
        let mut e = VotingEntry::new(ck("A"));
        e.add_vote(ck("X"), 3);
        assert!(e.is_promotable(3, 2));
    }

    #[test]
    fn confirm_direct_bypasses_pending_and_purges_target() {
        let mut t: MatchTables<ClassKey> = MatchTables::new();
        t.vote(ck("B"), ck("X"), 2);
        assert!(t.confirm_direct(ck("A"), ck("X")));
        assert_eq!(t.confirmed_target_of(&ck("A")), Some(&ck("X")));
        assert!(t.pending(&ck("B")).unwrap().first_target().is_none());
        assert!(!t.confirm_direct(ck("C"), ck("X")));
    }
}

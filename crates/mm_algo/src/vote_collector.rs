//! Vote collector pass (spec §4.7/§4.1): selects which pending entries are
//! promotable this invocation, in the deterministic order the engine must
//! apply confirmations in (spec §5 "Ordering guarantee").

use std::fmt::{Debug, Display};

use mm_core::MatchTables;

/// Source keys eligible for confirmation this invocation, already capped
/// and ordered: gap descending, ties broken source-key ascending (spec
/// §4.1/§5). The caller confirms them in this exact order.
///
/// This is a snapshot: two distinct sources can legitimately share the same
/// first-place target (spec §4.1), and confirming one purges the other's
/// ledger. The caller must re-check promotability immediately before
/// confirming each entry, not assume this list stays valid across the loop.
pub fn collect_promotions<K: Ord + Clone + Display + Debug>(
    tables: &MatchTables<K>,
    min_votes: u32,
    min_gap: i64,
    batch_percent: u8,
    floor: usize,
) -> Vec<K> {
    let mut candidates: Vec<(K, i64)> = tables
        .pending_entries()
        .filter(|e| e.is_promotable(min_votes, min_gap))
        .map(|e| (e.source().clone(), e.gap()))
        .collect();

    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let batch_size = ((tables.pending_len() * batch_percent as usize) / 100).max(floor);
    candidates.truncate(batch_size);
    candidates.into_iter().map(|(k, _)| k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::ClassKey;

    fn ck(s: &str) -> ClassKey {
        ClassKey::new(s)
    }

    #[test]
    fn promotions_ordered_by_gap_desc_then_key_asc() {
        let mut t: MatchTables<ClassKey> = MatchTables::new();
        t.vote(ck("B"), ck("Y"), 5);
        t.vote(ck("A"), ck("X"), 5);
        t.vote(ck("C"), ck("Z"), 4);

        let picked = collect_promotions(&t, 3, 2, 100, 10);
        assert_eq!(picked, vec![ck("A"), ck("B"), ck("C")]);
    }

    #[test]
    fn batch_is_capped_by_floor_and_percent() {
        let mut t: MatchTables<ClassKey> = MatchTables::new();
        for i in 0..20 {
            t.vote(ck(&format!("S{i}")), ck(&format!("T{i}")), 5);
        }
        let picked = collect_promotions(&t, 3, 2, 10, 5);
        assert_eq!(picked.len(), 5);
    }

    #[test]
    fn non_promotable_entries_are_excluded() {
        let mut t: MatchTables<ClassKey> = MatchTables::new();
        t.vote(ck("A"), ck("X"), 2);
        t.vote(ck("A"), ck("Y"), 2);
        assert!(collect_promotions(&t, 3, 2, 100, 10).is_empty());
    }
}

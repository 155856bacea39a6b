//! TF-IDF index and cosine query (spec §4.9).

use std::collections::HashMap;

use mm_core::MethodKey;

fn term_frequencies(tokens: &[String]) -> HashMap<&str, u32> {
    let mut tf = HashMap::new();
    for t in tokens {
        *tf.entry(t.as_str()).or_insert(0) += 1;
    }
    tf
}

fn tfidf_vector(tokens: &[String], df: &HashMap<String, usize>, corpus_size: usize) -> HashMap<String, f64> {
    let tf = term_frequencies(tokens);
    let doc_len = tokens.len().max(1) as f64;
    let n = corpus_size.max(1) as f64;
    tf.into_iter()
        .map(|(term, count)| {
            let document_frequency = df.get(term).copied().unwrap_or(1).max(1) as f64;
            let weight = (count as f64 / doc_len) * (n / document_frequency).ln().max(0.0);
            (term.to_string(), weight)
        })
        .collect()
}

fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for v in a.values() {
        norm_a += v * v;
    }
    for v in b.values() {
        norm_b += v * v;
    }
    let (smaller, larger) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    for (term, va) in smaller {
        if let Some(vb) = larger.get(term) {
            dot += va * vb;
        }
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Document-frequency index over a target corpus of methods, used to score
/// a query method's token bag by TF-IDF cosine similarity.
pub struct TfIdfIndex {
    df: HashMap<String, usize>,
    docs: Vec<(MethodKey, HashMap<String, f64>)>,
}

impl TfIdfIndex {
    pub fn build(corpus: &[(MethodKey, Vec<String>)]) -> Self {
        let mut df: HashMap<String, usize> = HashMap::new();
        for (_, tokens) in corpus {
            let mut seen = std::collections::HashSet::new();
            for t in tokens {
                if seen.insert(t.as_str()) {
                    *df.entry(t.clone()).or_insert(0) += 1;
                }
            }
        }
        let docs = corpus.iter().map(|(key, tokens)| (key.clone(), tfidf_vector(tokens, &df, corpus.len()))).collect();
        Self { df, docs }
    }

    /// Top-`k` corpus candidates by cosine similarity to `query_tokens`.
    pub fn query(&self, query_tokens: &[String], k: usize) -> Vec<(MethodKey, f64)> {
        let query_vector = tfidf_vector(query_tokens, &self.df, self.docs.len());
        let mut scored: Vec<(MethodKey, f64)> = self.docs.iter().map(|(key, v)| (key.clone(), cosine(&query_vector, v))).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(key: &str, tokens: &[&str]) -> (MethodKey, Vec<String>) {
        (MethodKey::build(&mm_core::ClassKey::new("a/A"), key, "()V"), tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn exact_token_overlap_scores_highest() {
        let corpus = vec![doc("match", &["DESC:()V", "OPC:return"]), doc("unrelated", &["DESC:(I)I", "OPC:push", "OPC:return"])];
        let index = TfIdfIndex::build(&corpus);
        let results = index.query(&["DESC:()V".to_string(), "OPC:return".to_string()], 5);
        assert_eq!(results[0].0.as_str(), "a/A.match()V");
    }

    #[test]
    fn empty_query_is_well_defined() {
        let corpus = vec![doc("m", &["OPC:return"])];
        let index = TfIdfIndex::build(&corpus);
        let results = index.query(&[], 5);
        assert_eq!(results[0].1, 0.0);
    }
}

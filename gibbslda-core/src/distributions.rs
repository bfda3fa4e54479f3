//! Point estimates of the document-topic and topic-word distributions.

use crate::sampler::WordTerm;
use crate::state::CountTables;
use crate::types::WordId;

/// `theta[m][k] = (n[m][k] + alpha) / (n[m] + K * alpha)`
pub fn compute_theta(tables: &CountTables, alpha: f64) -> Vec<Vec<f64>> {
    let k_alpha = tables.num_topics() as f64 * alpha;
    (0..tables.num_docs())
        .map(|m| {
            let norm = tables.doc_length(m) as f64 + k_alpha;
            tables.doc_row(m).iter().map(|&c| (c as f64 + alpha) / norm).collect()
        })
        .collect()
}

/// `phi[k][w]` over the vocabulary of `tables`, using the same word term the
/// sampler used.
pub fn compute_phi<T: WordTerm>(tables: &CountTables, term: &T, beta: f64) -> Vec<Vec<f64>> {
    (0..tables.num_topics())
        .map(|k| {
            (0..tables.vocab_size())
                .map(|w| term.weight(tables, w as WordId, k, beta))
                .collect()
        })
        .collect()
}

/// The `n` most probable word ids of a phi row, best first. Ties keep the
/// lower id first.
pub fn top_words(row: &[f64], n: usize) -> Vec<(WordId, f64)> {
    let mut ranked: Vec<(WordId, f64)> = row.iter().enumerate().map(|(w, &p)| (w as WordId, p)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

//! Collapsed Gibbs update.
//!
//! A token at document `m` with word `w` is resampled from
//!
//! ```text
//! p(z = k | rest) ∝ word_term(w, k) * (n[m][k] + alpha) / (n[m] + K * alpha)
//! ```
//!
//! where every count excludes the token itself. The word term is supplied by
//! a [`WordTerm`] strategy: training uses the sampled tables alone, inference
//! adds the frozen tables of a trained model.

use crate::corpus::Document;
use crate::prng::Pcg32;
use crate::state::CountTables;
use crate::types::{Topic, WordId};

/// Which count tables contribute to the word factor of the conditional.
pub trait WordTerm {
    /// `p(w | k)` estimate for word `w` of the sampled tables.
    fn weight(&self, tables: &CountTables, w: WordId, k: usize, beta: f64) -> f64;
}

/// Word factor from the sampled tables only (training, resuming).
#[derive(Clone, Copy, Debug, Default)]
pub struct Standalone;

impl WordTerm for Standalone {
    #[inline]
    fn weight(&self, tables: &CountTables, w: WordId, k: usize, beta: f64) -> f64 {
        (tables.word_topic(w, k) as f64 + beta)
            / (tables.topic_total(k) as f64 + tables.vocab_size() as f64 * beta)
    }
}

/// Word factor from a trained model's read-only tables plus the shadow
/// tables of new documents. `remap` takes a local word id to its trained id.
#[derive(Clone, Copy, Debug)]
pub struct Frozen<'a> {
    pub trained: &'a CountTables,
    pub remap: &'a [WordId],
}

impl WordTerm for Frozen<'_> {
    #[inline]
    fn weight(&self, tables: &CountTables, w: WordId, k: usize, beta: f64) -> f64 {
        let tw = self.remap[w as usize];
        (self.trained.word_topic(tw, k) as f64 + tables.word_topic(w, k) as f64 + beta)
            / (self.trained.topic_total(k) as f64
                + tables.topic_total(k) as f64
                + self.trained.vocab_size() as f64 * beta)
    }
}

#[derive(Clone, Debug)]
pub struct GibbsSampler {
    alpha: f64,
    beta: f64,
    cumulative: Vec<f64>,
}

impl GibbsSampler {
    pub fn new(num_topics: usize, alpha: f64, beta: f64) -> Self {
        GibbsSampler { alpha, beta, cumulative: vec![0.0; num_topics] }
    }

    /// Resample one token currently assigned `current`; returns the new topic.
    /// The tables are left consistent with the returned topic.
    pub fn sample_token<T: WordTerm>(
        &mut self,
        tables: &mut CountTables,
        term: &T,
        m: usize,
        w: WordId,
        current: Topic,
        rng: &mut Pcg32,
    ) -> Topic {
        let num_topics = self.cumulative.len();
        tables.remove(m, w, current as usize);

        let k_alpha = num_topics as f64 * self.alpha;
        let doc_norm = tables.doc_length(m) as f64 + k_alpha;
        let mut sum = 0.0;
        for k in 0..num_topics {
            let p = term.weight(tables, w, k, self.beta)
                * (tables.doc_topic(m, k) as f64 + self.alpha)
                / doc_norm;
            sum += p;
            self.cumulative[k] = sum;
        }

        // scaled draw over the unnormalized mass
        let u = rng.next_f64() * sum;
        let topic = self
            .cumulative
            .iter()
            .position(|&c| c > u)
            .unwrap_or(num_topics - 1);

        tables.add(m, w, topic);
        topic as Topic
    }

    /// One pass over every token, documents in order, positions in order.
    pub fn sweep<T: WordTerm>(
        &mut self,
        docs: &[Document],
        assignment: &mut [Vec<Topic>],
        tables: &mut CountTables,
        term: &T,
        rng: &mut Pcg32,
    ) {
        for (m, (doc, z)) in docs.iter().zip(assignment.iter_mut()).enumerate() {
            for (n, &w) in doc.words.iter().enumerate() {
                z[n] = self.sample_token(tables, term, m, w, z[n], rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> (Vec<Document>, CountTables, Vec<Vec<Topic>>, Pcg32) {
        let docs = vec![
            Document::new(vec![0, 1, 0]),
            Document::new(vec![1, 2]),
            Document::new(vec![0, 2, 2]),
        ];
        let mut rng = Pcg32::seeded(2024);
        let (tables, z) = CountTables::randomized(2, 3, &docs, &mut rng);
        (docs, tables, z, rng)
    }

    #[test]
    fn single_update_keeps_invariants() {
        let (docs, mut tables, mut z, mut rng) = scenario();
        let mut sampler = GibbsSampler::new(2, 1.0, 0.1);
        for (m, doc) in docs.iter().enumerate() {
            for n in 0..doc.len() {
                z[m][n] = sampler.sample_token(&mut tables, &Standalone, m, doc.words[n], z[m][n], &mut rng);
                assert!(tables.marginals_consistent());
                assert!(tables.matches(&docs, &z));
                assert_eq!(tables.total_tokens(), 8);
            }
        }
    }

    #[test]
    fn sweeps_keep_invariants() {
        let (docs, mut tables, mut z, mut rng) = scenario();
        let mut sampler = GibbsSampler::new(2, 1.0, 0.1);
        for _ in 0..25 {
            sampler.sweep(&docs, &mut z, &mut tables, &Standalone, &mut rng);
            assert!(tables.matches(&docs, &z));
            assert_eq!(tables.doc_length(0), 3);
            assert_eq!(tables.doc_length(1), 2);
            assert_eq!(tables.doc_length(2), 3);
        }
    }

    #[test]
    fn fixed_seed_reproduces_trajectory() {
        let run = || {
            let (docs, mut tables, mut z, mut rng) = scenario();
            let mut sampler = GibbsSampler::new(2, 1.0, 0.1);
            let mut history = Vec::new();
            for _ in 0..10 {
                sampler.sweep(&docs, &mut z, &mut tables, &Standalone, &mut rng);
                history.push(z.clone());
            }
            history
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn single_topic_always_selected() {
        let docs = vec![Document::new(vec![0, 1, 1])];
        let mut rng = Pcg32::seeded(5);
        let (mut tables, mut z) = CountTables::randomized(1, 2, &docs, &mut rng);
        let mut sampler = GibbsSampler::new(1, 0.5, 0.1);
        sampler.sweep(&docs, &mut z, &mut tables, &Standalone, &mut rng);
        assert_eq!(z, vec![vec![0, 0, 0]]);
    }

    #[test]
    fn dominant_topic_attracts_token() {
        // elsewhere word 0 is always topic 1 and word 1 always topic 0
        let mut docs = vec![Document::new(vec![0])];
        let mut z = vec![vec![0]];
        for _ in 0..200 {
            docs.push(Document::new(vec![0, 0, 1, 1]));
            z.push(vec![1, 1, 0, 0]);
        }
        let mut tables = CountTables::from_assignment(2, 2, &docs, &z);
        let mut sampler = GibbsSampler::new(2, 0.01, 0.01);
        let mut rng = Pcg32::seeded(9);
        let mut hits = 0;
        for _ in 0..100 {
            z[0][0] = sampler.sample_token(&mut tables, &Standalone, 0, 0, z[0][0], &mut rng);
            if z[0][0] == 1 {
                hits += 1;
            }
        }
        assert!(hits > 90, "hits = {hits}");
    }

    #[test]
    fn frozen_term_reads_trained_tables_through_remap() {
        let trained_docs = vec![Document::new(vec![0, 1, 2, 2])];
        let trained = CountTables::from_assignment(2, 3, &trained_docs, &[vec![0, 0, 1, 1]]);
        let remap = vec![2, 0];
        let term = Frozen { trained: &trained, remap: &remap };

        let new_docs = vec![Document::new(vec![0, 1])];
        let shadow = CountTables::from_assignment(2, 2, &new_docs, &[vec![1, 0]]);

        // local 0 -> trained 2: trained count 2 under topic 1, shadow 1
        let expected = (2.0 + 1.0 + 0.1) / (2.0 + 1.0 + 3.0 * 0.1);
        assert!((term.weight(&shadow, 0, 1, 0.1) - expected).abs() < 1e-12);
        let standalone = (1.0 + 0.1) / (1.0 + 2.0 * 0.1);
        assert!((Standalone.weight(&shadow, 0, 1, 0.1) - standalone).abs() < 1e-12);
    }

    #[test]
    fn inference_sweep_leaves_trained_tables_untouched() {
        let trained_docs = vec![Document::new(vec![0, 1, 2, 2]), Document::new(vec![1, 1])];
        let trained = CountTables::from_assignment(2, 3, &trained_docs, &[vec![0, 0, 1, 1], vec![0, 1]]);
        let snapshot = trained.clone();
        let remap = vec![1, 2];
        let new_docs = vec![Document::new(vec![0, 1, 1]), Document::new(vec![1])];
        let mut rng = Pcg32::seeded(77);
        let (mut shadow, mut z) = CountTables::randomized(2, 2, &new_docs, &mut rng);
        let mut sampler = GibbsSampler::new(2, 0.5, 0.1);
        let term = Frozen { trained: &trained, remap: &remap };
        for _ in 0..10 {
            sampler.sweep(&new_docs, &mut z, &mut shadow, &term, &mut rng);
            assert!(shadow.matches(&new_docs, &z));
        }
        assert_eq!(trained, snapshot);
    }
}

//! Count tables for collapsed Gibbs sampling.
//!
//! All four tables live in one value and are sized once, at construction.
//! They must always agree with the topic assignment they were built from:
//! every token is counted exactly once, under its current topic.

use crate::corpus::Document;
use crate::prng::Pcg32;
use crate::types::{Count, Topic, WordId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountTables {
    num_topics: usize,
    vocab_size: usize,
    // row-major, word * K + topic
    word_topic: Vec<Count>,
    // row-major, doc * K + topic
    doc_topic: Vec<Count>,
    topic_total: Vec<Count>,
    doc_length: Vec<Count>,
}

impl CountTables {
    /// Zeroed tables for `num_docs` documents over `vocab_size` words.
    pub fn new(num_topics: usize, num_docs: usize, vocab_size: usize) -> Self {
        CountTables {
            num_topics,
            vocab_size,
            word_topic: vec![0; vocab_size * num_topics],
            doc_topic: vec![0; num_docs * num_topics],
            topic_total: vec![0; num_topics],
            doc_length: vec![0; num_docs],
        }
    }

    /// Tables that reflect `assignment` exactly. Callers validate ids first.
    pub fn from_assignment(
        num_topics: usize,
        vocab_size: usize,
        docs: &[Document],
        assignment: &[Vec<Topic>],
    ) -> Self {
        let mut tables = CountTables::new(num_topics, docs.len(), vocab_size);
        for (m, (doc, z)) in docs.iter().zip(assignment).enumerate() {
            for (&w, &k) in doc.words.iter().zip(z) {
                tables.add(m, w, k as usize);
            }
        }
        tables
    }

    /// Draws a uniform topic for every token and counts it.
    pub fn randomized(
        num_topics: usize,
        vocab_size: usize,
        docs: &[Document],
        rng: &mut Pcg32,
    ) -> (Self, Vec<Vec<Topic>>) {
        let mut tables = CountTables::new(num_topics, docs.len(), vocab_size);
        let mut assignment = Vec::with_capacity(docs.len());
        for (m, doc) in docs.iter().enumerate() {
            let mut z = Vec::with_capacity(doc.len());
            for &w in &doc.words {
                let k = rng.next_usize(num_topics);
                tables.add(m, w, k);
                z.push(k as Topic);
            }
            assignment.push(z);
        }
        (tables, assignment)
    }

    #[inline] pub fn num_topics(&self) -> usize { self.num_topics }
    #[inline] pub fn num_docs(&self) -> usize { self.doc_length.len() }
    #[inline] pub fn vocab_size(&self) -> usize { self.vocab_size }

    #[inline]
    pub fn word_topic(&self, w: WordId, k: usize) -> Count {
        self.word_topic[w as usize * self.num_topics + k]
    }

    #[inline]
    pub fn doc_topic(&self, m: usize, k: usize) -> Count {
        self.doc_topic[m * self.num_topics + k]
    }

    #[inline]
    pub fn topic_total(&self, k: usize) -> Count {
        self.topic_total[k]
    }

    #[inline]
    pub fn doc_length(&self, m: usize) -> Count {
        self.doc_length[m]
    }

    /// Counts of every topic for word `w`.
    #[inline]
    pub fn word_row(&self, w: WordId) -> &[Count] {
        let base = w as usize * self.num_topics;
        &self.word_topic[base..base + self.num_topics]
    }

    /// Counts of every topic in document `m`.
    #[inline]
    pub fn doc_row(&self, m: usize) -> &[Count] {
        let base = m * self.num_topics;
        &self.doc_topic[base..base + self.num_topics]
    }

    #[inline]
    pub fn add(&mut self, m: usize, w: WordId, k: usize) {
        self.word_topic[w as usize * self.num_topics + k] += 1;
        self.doc_topic[m * self.num_topics + k] += 1;
        self.topic_total[k] += 1;
        self.doc_length[m] += 1;
    }

    #[inline]
    pub fn remove(&mut self, m: usize, w: WordId, k: usize) {
        self.word_topic[w as usize * self.num_topics + k] -= 1;
        self.doc_topic[m * self.num_topics + k] -= 1;
        self.topic_total[k] -= 1;
        self.doc_length[m] -= 1;
    }

    pub fn total_tokens(&self) -> u64 {
        self.doc_length.iter().map(|&n| n as u64).sum()
    }

    /// Whether the marginals agree with the cells: topic totals are the
    /// column sums of `word_topic` and document lengths the row sums of
    /// `doc_topic`.
    pub fn marginals_consistent(&self) -> bool {
        let k = self.num_topics;
        let topics_ok = (0..k).all(|t| {
            let col: u64 = (0..self.vocab_size).map(|w| self.word_topic[w * k + t] as u64).sum();
            col == self.topic_total[t] as u64
        });
        let docs_ok = (0..self.num_docs()).all(|m| {
            let row: u64 = self.doc_row(m).iter().map(|&c| c as u64).sum();
            row == self.doc_length[m] as u64
        });
        topics_ok && docs_ok
    }

    /// Whether these tables are exactly the counts of `assignment`.
    pub fn matches(&self, docs: &[Document], assignment: &[Vec<Topic>]) -> bool {
        *self == CountTables::from_assignment(self.num_topics, self.vocab_size, docs, assignment)
    }
}

//! Corpus and word-map reading.
//!
//! Document files start with the number of documents, followed by one
//! document per line as whitespace separated words. Word-map files start with
//! the number of entries, followed by `word id` lines.

use std::fs;
use std::path::Path;

use hashbrown::HashMap;

use crate::error::{LdaError, Result};
use crate::types::WordId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub words: Vec<WordId>,
}

impl Document {
    pub fn new(words: Vec<WordId>) -> Self {
        Document { words }
    }
    #[inline] pub fn len(&self) -> usize { self.words.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.words.is_empty() }
}

#[derive(Clone, Debug)]
pub struct Corpus {
    pub docs: Vec<Document>,
    pub vocabulary_size: usize,
}

impl Corpus {
    pub fn new(docs: Vec<Document>, vocabulary_size: usize) -> Self {
        Corpus { docs, vocabulary_size }
    }
    #[inline] pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn num_tokens(&self) -> usize {
        self.docs.iter().map(Document::len).sum()
    }
}

/// Bidirectional word <-> id mapping with dense ids `0..len`.
#[derive(Clone, Debug, Default)]
pub struct WordMap {
    word2id: HashMap<String, WordId>,
    id2word: Vec<String>,
}

impl WordMap {
    pub fn new() -> Self {
        WordMap::default()
    }
    #[inline] pub fn len(&self) -> usize { self.id2word.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.id2word.is_empty() }

    pub fn id(&self, word: &str) -> Option<WordId> {
        self.word2id.get(word).copied()
    }

    pub fn word(&self, id: WordId) -> Option<&str> {
        self.id2word.get(id as usize).map(String::as_str)
    }

    /// Words indexed by id.
    pub fn words(&self) -> &[String] {
        &self.id2word
    }

    pub fn get_or_insert(&mut self, word: &str) -> WordId {
        if let Some(&id) = self.word2id.get(word) {
            return id;
        }
        let id = self.id2word.len() as WordId;
        self.word2id.insert(word.to_string(), id);
        self.id2word.push(word.to_string());
        id
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.id2word.len()));
        for (id, w) in self.id2word.iter().enumerate() {
            out.push_str(&format!("{} {}\n", w, id));
        }
        out
    }
}

pub fn parse_wordmap(s: &str, label: &str) -> Result<WordMap> {
    let mut lines = s.lines();
    let header = lines.next().ok_or_else(|| LdaError::format(label, 1, "missing header"))?;
    let n: usize = header
        .trim()
        .parse()
        .map_err(|_| LdaError::format(label, 1, "bad entry count"))?;

    let mut slots: Vec<Option<String>> = vec![None; n];
    let mut word2id = HashMap::with_capacity(n);
    for i in 0..n {
        let lineno = i + 2;
        let line = lines
            .next()
            .ok_or_else(|| LdaError::format(label, lineno, "missing word map entry"))?;
        let mut it = line.split_whitespace();
        let word = it.next().ok_or_else(|| LdaError::format(label, lineno, "missing word"))?;
        let id: usize = it
            .next()
            .ok_or_else(|| LdaError::format(label, lineno, "missing id"))?
            .parse()
            .map_err(|_| LdaError::format(label, lineno, "bad id"))?;
        if id >= n {
            return Err(LdaError::format(label, lineno, format!("id {} >= {}", id, n)));
        }
        if slots[id].is_some() {
            return Err(LdaError::format(label, lineno, format!("duplicate id {}", id)));
        }
        if word2id.insert(word.to_string(), id as WordId).is_some() {
            return Err(LdaError::format(label, lineno, format!("duplicate word {}", word)));
        }
        slots[id] = Some(word.to_string());
    }
    // n distinct ids below n fill every slot
    let id2word = slots.into_iter().flatten().collect();
    Ok(WordMap { word2id, id2word })
}

/// Documents of a counted document file, as word strings.
pub fn parse_documents<'a>(s: &'a str, label: &str) -> Result<Vec<Vec<&'a str>>> {
    let mut lines = s.lines();
    let header = lines.next().ok_or_else(|| LdaError::format(label, 1, "missing header"))?;
    let n: usize = header
        .trim()
        .parse()
        .map_err(|_| LdaError::format(label, 1, "bad document count"))?;

    let mut docs = Vec::with_capacity(n);
    for i in 0..n {
        let lineno = i + 2;
        let line = lines
            .next()
            .ok_or_else(|| LdaError::format(label, lineno, format!("expected {} documents, found {}", n, i)))?;
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Err(LdaError::format(label, lineno, "invalid (empty) document"));
        }
        docs.push(words);
    }
    Ok(docs)
}

/// Raw text: every non-blank line is a document, lowercased and split on
/// anything that is not alphanumeric.
pub fn parse_raw_documents(s: &str) -> Vec<Vec<String>> {
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            l.split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
                .map(str::to_lowercase)
                .collect()
        })
        .collect()
}

/// Assigns ids in order of first occurrence.
pub fn build_training_corpus<S: AsRef<str>>(docs: &[Vec<S>]) -> (Corpus, WordMap) {
    let mut wordmap = WordMap::new();
    let docs: Vec<Document> = docs
        .iter()
        .map(|words| Document::new(words.iter().map(|w| wordmap.get_or_insert(w.as_ref())).collect()))
        .collect();
    (Corpus::new(docs, wordmap.len()), wordmap)
}

/// New documents mapped onto a trained word map.
#[derive(Clone, Debug)]
pub struct InferenceCorpus {
    /// Documents over local ids `0..remap.len()`.
    pub corpus: Corpus,
    /// Local id to trained id.
    pub remap: Vec<WordId>,
    /// Tokens dropped because the trained word map does not know them.
    pub dropped: usize,
}

impl InferenceCorpus {
    /// The same documents expressed with trained ids.
    pub fn trained_docs(&self) -> Vec<Document> {
        self.corpus
            .docs
            .iter()
            .map(|d| Document::new(d.words.iter().map(|&w| self.remap[w as usize]).collect()))
            .collect()
    }

    /// Word strings indexed by local id.
    pub fn local_words(&self, trained: &WordMap) -> Vec<String> {
        self.remap
            .iter()
            .map(|&t| trained.word(t).unwrap_or_default().to_string())
            .collect()
    }
}

/// Unknown words are dropped from the document; they get no topic slot.
pub fn build_inference_corpus<S: AsRef<str>>(docs: &[Vec<S>], trained: &WordMap) -> InferenceCorpus {
    let mut local: HashMap<WordId, WordId> = HashMap::new();
    let mut remap: Vec<WordId> = Vec::new();
    let mut dropped = 0usize;
    let mut out = Vec::with_capacity(docs.len());
    for words in docs {
        let mut ids = Vec::with_capacity(words.len());
        for w in words {
            let Some(tid) = trained.id(w.as_ref()) else {
                dropped += 1;
                continue;
            };
            let lid = *local.entry(tid).or_insert_with(|| {
                remap.push(tid);
                (remap.len() - 1) as WordId
            });
            ids.push(lid);
        }
        out.push(Document::new(ids));
    }
    let vocab = remap.len();
    InferenceCorpus { corpus: Corpus::new(out, vocab), remap, dropped }
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| LdaError::Read { path: path.to_path_buf(), source })
}

pub(crate) fn write_file(path: &Path, data: &str) -> Result<()> {
    fs::write(path, data).map_err(|source| LdaError::Write { path: path.to_path_buf(), source })
}

pub fn load_vocabulary(path: &Path) -> Result<WordMap> {
    let s = read_file(path)?;
    parse_wordmap(&s, &path.display().to_string())
}

/// Reads training documents and writes the word map built from them.
pub fn read_training_corpus(doc_path: &Path, wordmap_path: &Path) -> Result<(Corpus, WordMap)> {
    let s = read_file(doc_path)?;
    let docs = parse_documents(&s, &doc_path.display().to_string())?;
    let (corpus, wordmap) = build_training_corpus(&docs);
    write_file(wordmap_path, &wordmap.render())?;
    tracing::info!(
        "read {} documents, {} tokens, {} distinct words from {}",
        corpus.num_docs(),
        corpus.num_tokens(),
        corpus.vocabulary_size,
        doc_path.display()
    );
    Ok((corpus, wordmap))
}

pub fn read_inference_corpus(
    doc_path: &Path,
    wordmap_path: &Path,
    raw_text: bool,
) -> Result<(InferenceCorpus, WordMap)> {
    let wordmap = load_vocabulary(wordmap_path)?;
    let s = read_file(doc_path)?;
    let corpus = if raw_text {
        build_inference_corpus(&parse_raw_documents(&s), &wordmap)
    } else {
        build_inference_corpus(&parse_documents(&s, &doc_path.display().to_string())?, &wordmap)
    };
    if corpus.dropped > 0 {
        tracing::warn!("dropped {} tokens not present in the trained word map", corpus.dropped);
    }
    tracing::info!(
        "read {} new documents, {} known distinct words from {}",
        corpus.corpus.num_docs(),
        corpus.remap.len(),
        doc_path.display()
    );
    Ok((corpus, wordmap))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_ids_follow_first_occurrence() {
        let docs = parse_documents("2\nb a b\nc a\n", "docs").unwrap();
        let (corpus, wm) = build_training_corpus(&docs);
        assert_eq!(corpus.vocabulary_size, 3);
        assert_eq!(corpus.docs[0].words, vec![0, 1, 0]);
        assert_eq!(corpus.docs[1].words, vec![2, 1]);
        assert_eq!(wm.word(2), Some("c"));
        assert_eq!(corpus.num_tokens(), 5);
    }

    #[test]
    fn wordmap_render_parses_back() {
        let (_, wm) = build_training_corpus(&[vec!["x", "y"], vec!["z"]]);
        let back = parse_wordmap(&wm.render(), "wordmap").unwrap();
        assert_eq!(back.words(), wm.words());
        assert_eq!(back.id("z"), Some(2));
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = parse_documents("2\na b\n   \n", "docs").unwrap_err();
        match err {
            LdaError::Format { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn short_document_file_is_rejected() {
        assert!(parse_documents("3\na\nb\n", "docs").is_err());
        assert!(parse_documents("x\na\n", "docs").is_err());
    }

    #[test]
    fn wordmap_rejects_bad_ids() {
        assert!(parse_wordmap("2\na 0\nb 2\n", "wm").is_err());
        assert!(parse_wordmap("2\na 0\nb 0\n", "wm").is_err());
        assert!(parse_wordmap("2\na 0\na 1\n", "wm").is_err());
        assert!(parse_wordmap("2\na 0\n", "wm").is_err());
    }

    #[test]
    fn unknown_words_are_dropped_and_known_words_remapped() {
        let wm = parse_wordmap("3\napple 0\nbanana 1\ncherry 2\n", "wm").unwrap();
        let docs = vec![vec!["cherry", "durian", "apple"], vec!["apple", "elder"]];
        let inf = build_inference_corpus(&docs, &wm);
        assert_eq!(inf.dropped, 2);
        assert_eq!(inf.remap, vec![2, 0]);
        assert_eq!(inf.corpus.vocabulary_size, 2);
        assert_eq!(inf.corpus.docs[0].words, vec![0, 1]);
        assert_eq!(inf.corpus.docs[1].words, vec![1]);
        assert_eq!(inf.trained_docs()[0].words, vec![2, 0]);
        assert_eq!(inf.local_words(&wm), vec!["cherry".to_string(), "apple".to_string()]);
    }

    #[test]
    fn raw_text_is_lowercased_and_split() {
        let docs = parse_raw_documents("Hello, World!\n\n  \nfoo-bar baz\n");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], vec!["hello", "world"]);
        assert_eq!(docs[1], vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn training_corpus_writes_wordmap() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("trndocs.dat");
        let wm = dir.path().join("wordmap.txt");
        fs::write(&docs, "2\nred blue\nblue green\n").unwrap();
        let (corpus, map) = read_training_corpus(&docs, &wm).unwrap();
        assert_eq!(corpus.num_docs(), 2);
        let loaded = load_vocabulary(&wm).unwrap();
        assert_eq!(loaded.words(), map.words());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_vocabulary(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, LdaError::Read { .. }));
    }
}

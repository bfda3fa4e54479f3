//! Model files.
//!
//! A saved model `<name>` is a set of text files in one directory:
//! `<name>.tassign`, `<name>.theta`, `<name>.phi`, `<name>.others` and,
//! when top words are requested, `<name>.twords`.

use std::path::PathBuf;

use crate::corpus::{read_file, write_file, Document};
use crate::distributions::top_words;
use crate::error::{LdaError, Result};
use crate::types::*;

/// Hyperparameters and sizes recorded in `.others`.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelMeta {
    pub alpha: f64,
    pub beta: f64,
    pub num_topics: usize,
    pub num_docs: usize,
    pub num_words: usize,
    /// Completed sweeps.
    pub iterations: usize,
}

/// Everything needed to write one model.
#[derive(Clone, Debug)]
pub struct ModelSnapshot<'a> {
    pub meta: ModelMeta,
    /// Documents with the word ids to persist.
    pub docs: &'a [Document],
    pub assignment: &'a [Vec<Topic>],
    pub theta: Vec<Vec<f64>>,
    pub phi: Vec<Vec<f64>>,
    /// Word strings for the columns of `phi`.
    pub words: Option<&'a [String]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedModel {
    pub name: String,
    pub tassign: String,
    pub theta: String,
    pub phi: String,
    pub others: String,
    pub twords: Option<String>,
}

pub fn render_tassign(docs: &[Document], assignment: &[Vec<Topic>]) -> String {
    let mut out = String::new();
    for (doc, z) in docs.iter().zip(assignment) {
        let line: Vec<String> = doc.words.iter().zip(z).map(|(w, k)| format!("{}:{}", w, k)).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

pub fn render_matrix(rows: &[Vec<f64>]) -> String {
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row.iter().map(|p| format!("{:.6}", p)).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

pub fn render_others(meta: &ModelMeta) -> String {
    format!(
        "alpha={}\nbeta={}\nntopics={}\nndocs={}\nnwords={}\nliter={}\n",
        meta.alpha, meta.beta, meta.num_topics, meta.num_docs, meta.num_words, meta.iterations
    )
}

/// Top `n` words of every topic; `n` is clamped to the vocabulary size, so an
/// empty vocabulary yields only the topic headers.
pub fn render_twords(phi: &[Vec<f64>], words: Option<&[String]>, n: usize) -> Result<String> {
    let words = words.ok_or(LdaError::EmptyVocabulary)?;
    let vocab = phi.first().map(Vec::len).unwrap_or(0);
    let n = if n > vocab {
        tracing::warn!("{} top words requested, vocabulary has {}; reporting {}", n, vocab, vocab);
        vocab
    } else {
        n
    };

    let mut out = String::new();
    for (k, row) in phi.iter().enumerate() {
        out.push_str(&format!("Topic {}th:\n", k));
        for (w, p) in top_words(row, n) {
            let word = words.get(w as usize).map(String::as_str).unwrap_or("");
            out.push_str(&format!("{}\t{:.6}\n", word, p));
        }
    }
    Ok(out)
}

pub fn render_model(name: &str, snapshot: &ModelSnapshot<'_>, twords: usize) -> Result<RenderedModel> {
    let twords = if twords > 0 {
        Some(render_twords(&snapshot.phi, snapshot.words, twords)?)
    } else {
        None
    };
    Ok(RenderedModel {
        name: name.to_string(),
        tassign: render_tassign(snapshot.docs, snapshot.assignment),
        theta: render_matrix(&snapshot.theta),
        phi: render_matrix(&snapshot.phi),
        others: render_others(&snapshot.meta),
        twords,
    })
}

pub fn parse_others(s: &str, label: &str) -> Result<ModelMeta> {
    let (mut alpha, mut beta) = (None, None);
    let (mut ntopics, mut ndocs, mut nwords, mut liter) = (None, None, None, None);
    for (i, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| LdaError::format(label, i + 1, "expected key=value"))?;
        let value = value.trim();
        let bad = || LdaError::format(label, i + 1, format!("bad value for {}", key.trim()));
        match key.trim() {
            "alpha" => alpha = Some(value.parse::<f64>().map_err(|_| bad())?),
            "beta" => beta = Some(value.parse::<f64>().map_err(|_| bad())?),
            "ntopics" => ntopics = Some(value.parse::<usize>().map_err(|_| bad())?),
            "ndocs" => ndocs = Some(value.parse::<usize>().map_err(|_| bad())?),
            "nwords" => nwords = Some(value.parse::<usize>().map_err(|_| bad())?),
            "liter" => liter = Some(value.parse::<usize>().map_err(|_| bad())?),
            _ => {}
        }
    }
    let missing = |key: &str| LdaError::format(label, 0, format!("missing {}", key));
    Ok(ModelMeta {
        alpha: alpha.ok_or_else(|| missing("alpha"))?,
        beta: beta.ok_or_else(|| missing("beta"))?,
        num_topics: ntopics.ok_or_else(|| missing("ntopics"))?,
        num_docs: ndocs.ok_or_else(|| missing("ndocs"))?,
        num_words: nwords.ok_or_else(|| missing("nwords"))?,
        iterations: liter.unwrap_or(0),
    })
}

/// Documents and topics of a `.tassign` file, checked against `meta`.
pub fn parse_tassign(s: &str, meta: &ModelMeta, label: &str) -> Result<(Vec<Document>, Vec<Vec<Topic>>)> {
    let mut lines = s.lines();
    let mut docs = Vec::with_capacity(meta.num_docs);
    let mut assignment = Vec::with_capacity(meta.num_docs);
    for m in 0..meta.num_docs {
        let lineno = m + 1;
        let line = lines.next().ok_or_else(|| {
            LdaError::format(label, lineno, format!("expected {} documents, found {}", meta.num_docs, m))
        })?;
        let mut words = Vec::new();
        let mut topics = Vec::new();
        for token in line.split_whitespace() {
            let (w, k) = token
                .split_once(':')
                .ok_or_else(|| LdaError::format(label, lineno, format!("token {:?} is not word:topic", token)))?;
            let w: WordId = w
                .parse()
                .map_err(|_| LdaError::format(label, lineno, format!("bad word id in {:?}", token)))?;
            let k: Topic = k
                .parse()
                .map_err(|_| LdaError::format(label, lineno, format!("bad topic in {:?}", token)))?;
            if w as usize >= meta.num_words {
                return Err(LdaError::format(label, lineno, format!("word id {} >= {}", w, meta.num_words)));
            }
            if k as usize >= meta.num_topics {
                return Err(LdaError::format(label, lineno, format!("topic {} >= {}", k, meta.num_topics)));
            }
            words.push(w);
            topics.push(k);
        }
        docs.push(Document::new(words));
        assignment.push(topics);
    }
    Ok((docs, assignment))
}

/// Destination for saved models.
pub trait ModelSink {
    fn save(&mut self, name: &str, snapshot: &ModelSnapshot<'_>) -> Result<()>;
}

/// A previously saved model, as read back from disk.
#[derive(Clone, Debug)]
pub struct LoadedModel {
    pub meta: ModelMeta,
    pub docs: Vec<Document>,
    pub assignment: Vec<Vec<Topic>>,
}

/// Reads and writes model files in a directory.
#[derive(Clone, Debug)]
pub struct ModelStore {
    dir: PathBuf,
    twords: usize,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>, twords: usize) -> Self {
        ModelStore { dir: dir.into(), twords }
    }

    pub fn path(&self, name: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", name, suffix))
    }

    pub fn load(&self, name: &str) -> Result<LoadedModel> {
        let others_path = self.path(name, OTHERS_SUFFIX);
        let meta = parse_others(&read_file(&others_path)?, &others_path.display().to_string())?;
        let tassign_path = self.path(name, TASSIGN_SUFFIX);
        let (docs, assignment) =
            parse_tassign(&read_file(&tassign_path)?, &meta, &tassign_path.display().to_string())?;
        tracing::info!(
            "loaded model {} ({} docs, {} words, {} topics, {} sweeps)",
            name,
            meta.num_docs,
            meta.num_words,
            meta.num_topics,
            meta.iterations
        );
        Ok(LoadedModel { meta, docs, assignment })
    }
}

impl ModelSink for ModelStore {
    fn save(&mut self, name: &str, snapshot: &ModelSnapshot<'_>) -> Result<()> {
        let model = render_model(name, snapshot, self.twords)?;
        write_file(&self.path(name, TASSIGN_SUFFIX), &model.tassign)?;
        write_file(&self.path(name, OTHERS_SUFFIX), &model.others)?;
        write_file(&self.path(name, THETA_SUFFIX), &model.theta)?;
        write_file(&self.path(name, PHI_SUFFIX), &model.phi)?;
        if let Some(twords) = &model.twords {
            write_file(&self.path(name, TWORDS_SUFFIX), twords)?;
        }
        tracing::info!("saved model {} to {}", name, self.dir.display());
        Ok(())
    }
}

/// Keeps rendered models in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    twords: usize,
    pub saved: Vec<RenderedModel>,
}

impl MemorySink {
    pub fn new(twords: usize) -> Self {
        MemorySink { twords, saved: Vec::new() }
    }

    pub fn last(&self) -> Option<&RenderedModel> {
        self.saved.last()
    }

    pub fn names(&self) -> Vec<&str> {
        self.saved.iter().map(|m| m.name.as_str()).collect()
    }
}

impl ModelSink for MemorySink {
    fn save(&mut self, name: &str, snapshot: &ModelSnapshot<'_>) -> Result<()> {
        let model = render_model(name, snapshot, self.twords)?;
        self.saved.push(model);
        Ok(())
    }
}

//! Training, continued training and inference sessions.
//!
//! A session is created for one [`Mode`] and never changes mode. Training
//! and continued training share [`Estimator`] and differ only in how the
//! initial counts are seeded; inference uses [`Inferencer`], which samples
//! new documents against the frozen counts of a trained model.

use crate::config::{Hyperparams, LdaConfig, Mode};
use crate::corpus::{load_vocabulary, read_inference_corpus, read_training_corpus, Corpus, Document, InferenceCorpus, WordMap};
use crate::distributions::{compute_phi, compute_theta};
use crate::error::{LdaError, Result};
use crate::persist::{LoadedModel, ModelMeta, ModelSink, ModelSnapshot, ModelStore};
use crate::prng::Pcg32;
use crate::sampler::{Frozen, GibbsSampler, Standalone};
use crate::state::CountTables;
use crate::types::*;

/// Collapsed Gibbs estimation over a training corpus.
#[derive(Clone, Debug)]
pub struct Estimator {
    hyper: Hyperparams,
    docs: Vec<Document>,
    assignment: Vec<Vec<Topic>>,
    tables: CountTables,
    sampler: GibbsSampler,
    rng: Pcg32,
    words: Option<Vec<String>>,
    iteration: usize,
}

impl Estimator {
    /// New model: every token gets a uniformly drawn topic.
    pub fn fresh(corpus: Corpus, hyper: Hyperparams, words: Option<Vec<String>>, mut rng: Pcg32) -> Result<Self> {
        hyper.validate()?;
        let (tables, assignment) =
            CountTables::randomized(hyper.num_topics, corpus.vocabulary_size, &corpus.docs, &mut rng);
        Ok(Estimator {
            hyper,
            docs: corpus.docs,
            assignment,
            tables,
            sampler: GibbsSampler::new(hyper.num_topics, hyper.alpha, hyper.beta),
            rng,
            words,
            iteration: 0,
        })
    }

    /// Continue a saved model: counts are rebuilt from its assignment and
    /// sweep numbering resumes after its last completed sweep.
    pub fn resume(model: LoadedModel, words: Option<Vec<String>>, rng: Pcg32) -> Result<Self> {
        let hyper = hyper_of(&model.meta);
        hyper.validate()?;
        if let Some(words) = &words {
            if words.len() != model.meta.num_words {
                return Err(LdaError::Config(format!(
                    "word map does not match the model: {} words, model has {}",
                    words.len(),
                    model.meta.num_words
                )));
            }
        }
        let tables = CountTables::from_assignment(hyper.num_topics, model.meta.num_words, &model.docs, &model.assignment);
        Ok(Estimator {
            hyper,
            docs: model.docs,
            assignment: model.assignment,
            tables,
            sampler: GibbsSampler::new(hyper.num_topics, hyper.alpha, hyper.beta),
            rng,
            words,
            iteration: model.meta.iterations,
        })
    }

    pub fn hyperparams(&self) -> Hyperparams { self.hyper }
    pub fn docs(&self) -> &[Document] { &self.docs }
    pub fn assignment(&self) -> &[Vec<Topic>] { &self.assignment }
    pub fn tables(&self) -> &CountTables { &self.tables }
    /// Completed sweeps, including those of a resumed model.
    pub fn iteration(&self) -> usize { self.iteration }

    /// One sweep over every token.
    pub fn sweep(&mut self) {
        self.sampler.sweep(&self.docs, &mut self.assignment, &mut self.tables, &Standalone, &mut self.rng);
        self.iteration += 1;
    }

    /// Runs `niters` more sweeps, saving a checkpoint every `savestep` sweeps
    /// and the final model at the end.
    pub fn run<S: ModelSink + ?Sized>(&mut self, niters: usize, savestep: usize, sink: &mut S) -> Result<()> {
        tracing::info!("sampling {} iterations from iteration {}", niters, self.iteration);
        for _ in 0..niters {
            self.sweep();
            tracing::debug!("iteration {}", self.iteration);
            if savestep > 0 && self.iteration % savestep == 0 {
                tracing::info!("saving the model at iteration {}", self.iteration);
                sink.save(&checkpoint_name(self.iteration), &self.snapshot())?;
            }
        }
        tracing::info!("gibbs sampling completed, saving the final model");
        sink.save(FINAL_MODEL_NAME, &self.snapshot())
    }

    /// Current model with freshly computed theta and phi.
    pub fn snapshot(&self) -> ModelSnapshot<'_> {
        ModelSnapshot {
            meta: ModelMeta {
                alpha: self.hyper.alpha,
                beta: self.hyper.beta,
                num_topics: self.hyper.num_topics,
                num_docs: self.docs.len(),
                num_words: self.tables.vocab_size(),
                iterations: self.iteration,
            },
            docs: &self.docs,
            assignment: &self.assignment,
            theta: compute_theta(&self.tables, self.hyper.alpha),
            phi: compute_phi(&self.tables, &Standalone, self.hyper.beta),
            words: self.words.as_deref(),
        }
    }
}

/// Samples topics for new documents against a trained model.
#[derive(Clone, Debug)]
pub struct Inferencer {
    hyper: Hyperparams,
    trained: CountTables,
    remap: Vec<WordId>,
    docs: Vec<Document>,
    // the same documents with trained word ids, as persisted
    trained_docs: Vec<Document>,
    words: Vec<String>,
    assignment: Vec<Vec<Topic>>,
    shadow: CountTables,
    sampler: GibbsSampler,
    rng: Pcg32,
    iteration: usize,
}

impl Inferencer {
    pub fn new(model: LoadedModel, corpus: InferenceCorpus, trained_words: &WordMap, mut rng: Pcg32) -> Result<Self> {
        let hyper = hyper_of(&model.meta);
        hyper.validate()?;
        if let Some(&bad) = corpus.remap.iter().find(|&&w| w as usize >= model.meta.num_words) {
            return Err(LdaError::Config(format!(
                "word map does not match the model: word id {} >= {}",
                bad, model.meta.num_words
            )));
        }
        let trained =
            CountTables::from_assignment(hyper.num_topics, model.meta.num_words, &model.docs, &model.assignment);
        let (shadow, assignment) =
            CountTables::randomized(hyper.num_topics, corpus.corpus.vocabulary_size, &corpus.corpus.docs, &mut rng);
        let trained_docs = corpus.trained_docs();
        let words = corpus.local_words(trained_words);
        Ok(Inferencer {
            hyper,
            trained,
            remap: corpus.remap,
            docs: corpus.corpus.docs,
            trained_docs,
            words,
            assignment,
            shadow,
            sampler: GibbsSampler::new(hyper.num_topics, hyper.alpha, hyper.beta),
            rng,
            iteration: 0,
        })
    }

    pub fn hyperparams(&self) -> Hyperparams { self.hyper }
    pub fn docs(&self) -> &[Document] { &self.docs }
    pub fn assignment(&self) -> &[Vec<Topic>] { &self.assignment }
    pub fn trained_tables(&self) -> &CountTables { &self.trained }
    pub fn shadow_tables(&self) -> &CountTables { &self.shadow }
    pub fn remap(&self) -> &[WordId] { &self.remap }
    pub fn iteration(&self) -> usize { self.iteration }

    pub fn sweep(&mut self) {
        let term = Frozen { trained: &self.trained, remap: &self.remap };
        self.sampler.sweep(&self.docs, &mut self.assignment, &mut self.shadow, &term, &mut self.rng);
        self.iteration += 1;
    }

    /// Runs `niters` sweeps and saves the result once, under `name`.
    pub fn run<S: ModelSink + ?Sized>(&mut self, niters: usize, name: &str, sink: &mut S) -> Result<()> {
        tracing::info!("sampling {} iterations for inference", niters);
        for _ in 0..niters {
            self.sweep();
            tracing::debug!("iteration {}", self.iteration);
        }
        tracing::info!("gibbs sampling for inference completed, saving {}", name);
        sink.save(name, &self.snapshot())
    }

    pub fn snapshot(&self) -> ModelSnapshot<'_> {
        let term = Frozen { trained: &self.trained, remap: &self.remap };
        ModelSnapshot {
            meta: ModelMeta {
                alpha: self.hyper.alpha,
                beta: self.hyper.beta,
                num_topics: self.hyper.num_topics,
                num_docs: self.docs.len(),
                num_words: self.shadow.vocab_size(),
                iterations: self.iteration,
            },
            docs: &self.trained_docs,
            assignment: &self.assignment,
            theta: compute_theta(&self.shadow, self.hyper.alpha),
            phi: compute_phi(&self.shadow, &term, self.hyper.beta),
            words: Some(&self.words),
        }
    }
}

fn hyper_of(meta: &ModelMeta) -> Hyperparams {
    Hyperparams { num_topics: meta.num_topics, alpha: meta.alpha, beta: meta.beta }
}

fn session_rng(seed: Option<u64>) -> Pcg32 {
    match seed {
        Some(seed) => {
            tracing::info!("using seed {}", seed);
            Pcg32::seeded(seed)
        }
        None => {
            let (rng, seed) = Pcg32::from_time();
            tracing::info!("seeded from clock: {}", seed);
            rng
        }
    }
}

#[derive(Debug)]
enum Engine {
    Estimate(Estimator),
    Infer(Inferencer),
}

/// One run of the tool: initialized for a mode, then run to completion.
#[derive(Debug)]
pub struct Session {
    engine: Engine,
    store: ModelStore,
    niters: usize,
    savestep: usize,
    output_name: String,
}

impl Session {
    pub fn init(mode: Mode, config: &LdaConfig) -> Result<Self> {
        config.validate(mode)?;
        let store = ModelStore::new(&config.dir, config.twords);
        let rng = session_rng(config.seed);
        tracing::info!("initializing {:?} session in {}", mode, config.dir.display());

        let engine = match mode {
            Mode::Estimate => {
                let (corpus, wordmap) = read_training_corpus(&config.dfile_path(), &config.wordmap_path())?;
                let words = wordmap.words().to_vec();
                Engine::Estimate(Estimator::fresh(corpus, config.hyperparams(), Some(words), rng)?)
            }
            Mode::Continue => {
                let model = store.load(&config.model_name)?;
                let words = if config.twords > 0 {
                    Some(load_vocabulary(&config.wordmap_path())?.words().to_vec())
                } else {
                    None
                };
                Engine::Estimate(Estimator::resume(model, words, rng)?)
            }
            Mode::Infer => {
                let model = store.load(&config.model_name)?;
                let (corpus, wordmap) =
                    read_inference_corpus(&config.dfile_path(), &config.wordmap_path(), config.raw_text)?;
                Engine::Infer(Inferencer::new(model, corpus, &wordmap, rng)?)
            }
        };

        Ok(Session {
            engine,
            store,
            niters: config.niters,
            savestep: config.savestep,
            output_name: config.dfile.clone(),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        match &mut self.engine {
            Engine::Estimate(est) => est.run(self.niters, self.savestep, &mut self.store),
            Engine::Infer(inf) => inf.run(self.niters, &self.output_name, &mut self.store),
        }
    }

    pub fn estimator(&self) -> Option<&Estimator> {
        match &self.engine {
            Engine::Estimate(est) => Some(est),
            Engine::Infer(_) => None,
        }
    }

    pub fn inferencer(&self) -> Option<&Inferencer> {
        match &self.engine {
            Engine::Infer(inf) => Some(inf),
            Engine::Estimate(_) => None,
        }
    }
}

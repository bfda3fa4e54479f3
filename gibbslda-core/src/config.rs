use std::path::PathBuf;

use crate::error::{LdaError, Result};
use crate::types::*;

/// Which of the three lifecycle paths a session follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Train a new model from a document file.
    Estimate,
    /// Continue training a saved model.
    Continue,
    /// Apply a saved model to new documents.
    Infer,
}

#[derive(Clone, Debug)]
pub struct LdaConfig {
    /// Directory holding the document file, word map and models.
    pub dir: PathBuf,
    /// Document file name inside `dir`.
    pub dfile: String,
    /// Model to continue from or to infer with.
    pub model_name: String,
    pub wordmap_file: String,
    pub num_topics: usize,
    /// `None` means `50 / K`.
    pub alpha: Option<f64>,
    pub beta: f64,
    pub niters: usize,
    /// Checkpoint every `savestep` sweeps; 0 disables checkpoints.
    pub savestep: usize,
    /// Top words per topic to report; 0 disables the report.
    pub twords: usize,
    /// Treat new documents as raw text lines (inference only).
    pub raw_text: bool,
    /// Fixed PRNG seed; `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for LdaConfig {
    fn default() -> Self {
        LdaConfig {
            dir: PathBuf::from("."),
            dfile: TRAIN_DOCS_FILE.to_string(),
            model_name: FINAL_MODEL_NAME.to_string(),
            wordmap_file: WORDMAP_FILE.to_string(),
            num_topics: DEFAULT_NUM_TOPICS,
            alpha: None,
            beta: DEFAULT_BETA,
            niters: DEFAULT_NITERS,
            savestep: DEFAULT_SAVESTEP,
            twords: 0,
            raw_text: false,
            seed: None,
        }
    }
}

impl LdaConfig {
    pub fn effective_alpha(&self) -> f64 {
        self.alpha.unwrap_or_else(|| default_alpha(self.num_topics))
    }

    pub fn hyperparams(&self) -> Hyperparams {
        Hyperparams {
            num_topics: self.num_topics,
            alpha: self.effective_alpha(),
            beta: self.beta,
        }
    }

    pub fn dfile_path(&self) -> PathBuf {
        self.dir.join(&self.dfile)
    }

    pub fn wordmap_path(&self) -> PathBuf {
        self.dir.join(&self.wordmap_file)
    }

    /// Checks what `mode` actually reads. Hyperparameters of a saved model
    /// come from its `.others` file and are checked when it is loaded.
    pub fn validate(&self, mode: Mode) -> Result<()> {
        if self.wordmap_file.is_empty() {
            return Err(LdaError::Config("word map file name is empty".into()));
        }
        match mode {
            Mode::Estimate => {
                if self.dfile.is_empty() {
                    return Err(LdaError::Config("document file name is empty".into()));
                }
                self.hyperparams().validate()
            }
            Mode::Continue => {
                if self.model_name.is_empty() {
                    return Err(LdaError::Config("model name is empty".into()));
                }
                Ok(())
            }
            Mode::Infer => {
                if self.model_name.is_empty() || self.dfile.is_empty() {
                    return Err(LdaError::Config("inference needs a model name and a document file".into()));
                }
                Ok(())
            }
        }
    }
}

/// Model hyperparameters, fixed for the lifetime of a model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hyperparams {
    pub num_topics: usize,
    pub alpha: f64,
    pub beta: f64,
}

impl Hyperparams {
    pub fn validate(&self) -> Result<()> {
        if self.num_topics == 0 {
            return Err(LdaError::Config("number of topics must be positive".into()));
        }
        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return Err(LdaError::Config(format!("alpha must be positive, got {}", self.alpha)));
        }
        if !(self.beta > 0.0 && self.beta.is_finite()) {
            return Err(LdaError::Config(format!("beta must be positive, got {}", self.beta)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_classic_settings() {
        let cfg = LdaConfig::default();
        assert_eq!(cfg.num_topics, 100);
        assert!((cfg.effective_alpha() - 0.5).abs() < 1e-12);
        assert_eq!(cfg.niters, 2000);
        assert_eq!(cfg.savestep, 200);
        assert_eq!(cfg.wordmap_path(), PathBuf::from("./wordmap.txt"));
        assert!(cfg.validate(Mode::Estimate).is_ok());
    }

    #[test]
    fn explicit_alpha_wins() {
        let cfg = LdaConfig { num_topics: 10, alpha: Some(0.2), ..Default::default() };
        assert_eq!(cfg.effective_alpha(), 0.2);
        let cfg = LdaConfig { num_topics: 10, ..Default::default() };
        assert_eq!(cfg.effective_alpha(), 5.0);
    }

    #[test]
    fn invalid_hyperparameters_are_rejected() {
        let zero_k = LdaConfig { num_topics: 0, ..Default::default() };
        assert!(matches!(zero_k.validate(Mode::Estimate), Err(LdaError::Config(_))));
        let bad_beta = LdaConfig { beta: 0.0, ..Default::default() };
        assert!(bad_beta.validate(Mode::Estimate).is_err());
        let bad_alpha = LdaConfig { alpha: Some(-1.0), ..Default::default() };
        assert!(bad_alpha.validate(Mode::Estimate).is_err());
        // hyperparameters are not read from the config when continuing
        assert!(zero_k.validate(Mode::Continue).is_ok());
    }

    #[test]
    fn inference_needs_a_document_file() {
        let cfg = LdaConfig { dfile: String::new(), ..Default::default() };
        assert!(cfg.validate(Mode::Infer).is_err());
    }
}

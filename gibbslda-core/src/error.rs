use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading input, loading or saving a model.
#[derive(Error, Debug)]
pub enum LdaError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{context}, line {line}: {message}")]
    Format {
        context: String,
        line: usize,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no word map loaded, cannot report top words")]
    EmptyVocabulary,
}

impl LdaError {
    pub(crate) fn format(context: &str, line: usize, message: impl Into<String>) -> Self {
        LdaError::Format {
            context: context.to_string(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = core::result::Result<T, LdaError>;

pub mod types;
pub mod error;
pub mod prng;
pub mod corpus;
pub mod state;
pub mod sampler;
pub mod distributions;
pub mod persist;
pub mod config;
pub mod lifecycle;

pub use config::{Hyperparams, LdaConfig, Mode};
pub use corpus::{build_training_corpus, parse_documents, parse_raw_documents, Corpus, Document, WordMap};
pub use error::{LdaError, Result};
pub use lifecycle::{Estimator, Inferencer, Session};
pub use persist::{MemorySink, ModelSink, ModelStore, RenderedModel};
pub use prng::Pcg32;
pub use state::CountTables;

pub type WordId = u32;
pub type Topic = u32;
pub type Count = u32;

pub const DEFAULT_NUM_TOPICS: usize = 100;
pub const DEFAULT_ALPHA_MASS: f64 = 50.0; // alpha = mass / K
pub const DEFAULT_BETA: f64 = 0.1;
pub const DEFAULT_NITERS: usize = 2000;
pub const DEFAULT_SAVESTEP: usize = 200;

pub const WORDMAP_FILE: &str = "wordmap.txt";
pub const TRAIN_DOCS_FILE: &str = "trndocs.dat";
pub const FINAL_MODEL_NAME: &str = "model-final";

pub const TASSIGN_SUFFIX: &str = ".tassign";
pub const THETA_SUFFIX: &str = ".theta";
pub const PHI_SUFFIX: &str = ".phi";
pub const OTHERS_SUFFIX: &str = ".others";
pub const TWORDS_SUFFIX: &str = ".twords";

// PCG stream id; only the seed varies between runs
pub const PCG_STREAM: u64 = 54;

#[inline]
pub fn checkpoint_name(iteration: usize) -> String {
    format!("model-{:05}", iteration)
}

#[inline]
pub fn default_alpha(num_topics: usize) -> f64 {
    DEFAULT_ALPHA_MASS / num_topics.max(1) as f64
}

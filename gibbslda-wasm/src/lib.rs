use gibbslda_core::types::default_alpha;
use gibbslda_core::{build_training_corpus, parse_raw_documents, Estimator, Hyperparams, MemorySink, Pcg32, RenderedModel};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct EstimateOutput {
    model: RenderedModel,
}

#[wasm_bindgen]
impl EstimateOutput {
    #[wasm_bindgen(getter)]
    pub fn tassign(&self) -> String {
        self.model.tassign.clone()
    }
    #[wasm_bindgen(getter)]
    pub fn theta(&self) -> String {
        self.model.theta.clone()
    }
    #[wasm_bindgen(getter)]
    pub fn phi(&self) -> String {
        self.model.phi.clone()
    }
    #[wasm_bindgen(getter)]
    pub fn others(&self) -> String {
        self.model.others.clone()
    }
    #[wasm_bindgen(getter)]
    pub fn twords(&self) -> Option<String> {
        self.model.twords.clone()
    }
}

/// Trains on `text`, one document per non-blank line. A non-positive
/// `alpha` means `50 / ntopics`.
#[wasm_bindgen]
pub fn estimate_text(
    text: &str,
    ntopics: usize,
    alpha: f64,
    beta: f64,
    niters: usize,
    twords: usize,
    seed: u64,
) -> Result<EstimateOutput, JsValue> {
    estimate(text, ntopics, alpha, beta, niters, twords, seed).map_err(|e| JsValue::from_str(&e))
}

fn estimate(
    text: &str,
    ntopics: usize,
    alpha: f64,
    beta: f64,
    niters: usize,
    twords: usize,
    seed: u64,
) -> Result<EstimateOutput, String> {
    let docs = parse_raw_documents(text);
    if docs.is_empty() {
        return Err("no documents in input".to_string());
    }
    let (corpus, wordmap) = build_training_corpus(&docs);
    let hyper = Hyperparams {
        num_topics: ntopics,
        alpha: if alpha > 0.0 { alpha } else { default_alpha(ntopics) },
        beta,
    };
    let mut estimator = Estimator::fresh(corpus, hyper, Some(wordmap.words().to_vec()), Pcg32::seeded(seed))
        .map_err(|e| e.to_string())?;
    let mut sink = MemorySink::new(twords);
    estimator.run(niters, 0, &mut sink).map_err(|e| e.to_string())?;
    let model = sink.saved.pop().ok_or_else(|| "no model produced".to_string())?;
    Ok(EstimateOutput { model })
}

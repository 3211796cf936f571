//! Cosine similarity ranking of one query against a list of candidates.
use crate::embedder::{Embedder, EmbedderError};

/// Result of comparing a new text against historical texts.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// One score per candidate, in candidate order.
    pub scores: Vec<f32>,
    pub best_match_index: usize,
    pub best_score: f32,
    /// `best_score` strictly above the threshold.
    pub threshold_met: bool,
}

impl Comparison {
    /// Pick the best match out of `scores`. Returns `None` for no scores.
    pub fn from_scores(scores: Vec<f32>, threshold: f32) -> Option<Self> {
        let best_match_index = argmax(&scores)?;
        let best_score = scores[best_match_index];
        Some(Self {
            threshold_met: best_score > threshold,
            scores,
            best_match_index,
            best_score,
        })
    }
}

/// Embed `new_text` and every entry of `old_texts`, then rank the old texts
/// by cosine similarity to the new one.
pub fn compare(
    embedder: &dyn Embedder,
    new_text: &str,
    old_texts: &[String],
    threshold: f32,
) -> Result<Comparison, EmbedderError> {
    let query = embedder.embed(new_text)?;

    let refs: Vec<&str> = old_texts.iter().map(String::as_str).collect();
    let candidates = embedder.embed_batch(&refs)?;
    if candidates.len() != old_texts.len() {
        return Err(EmbedderError::InferenceFailed(format!(
            "expected {} embeddings, got {}",
            old_texts.len(),
            candidates.len()
        )));
    }

    let scores = cosine_scores(&query, &candidates)?;
    Comparison::from_scores(scores, threshold).ok_or_else(|| {
        EmbedderError::InferenceFailed("no historical texts to compare against".to_string())
    })
}

/// Cosine similarity of `query` against each candidate.
pub fn cosine_scores(query: &[f32], candidates: &[Vec<f32>]) -> Result<Vec<f32>, EmbedderError> {
    candidates
        .iter()
        .map(|c| {
            if c.len() != query.len() {
                return Err(EmbedderError::InferenceFailed(format!(
                    "dimension mismatch: {} vs {}",
                    query.len(),
                    c.len()
                )));
            }
            Ok(cosine_similarity(query, c))
        })
        .collect()
}

/// Cosine similarity of two equal-length vectors, clamped to `[-1, 1]`.
///
/// A zero vector has no direction; its similarity to anything is 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Index of the largest value; the first one wins on ties.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

//! Request and response bodies for the HTTP API.
//!
//! Request fields are all optional at the serde level so that a missing or
//! `null` field reaches validation and gets the documented error message
//! rather than an extractor rejection.
use serde::{Deserialize, Serialize};

use super::errors::ApiError;
use crate::similarity::Comparison;

pub const TEXT_REQUIRED: &str = "text is required";
pub const COMPARE_FIELDS_REQUIRED: &str = "new_text and old_texts are required";

/// Body of `POST /embed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl EmbedRequest {
    /// Returns the text to embed.
    pub fn validate(self) -> Result<String, ApiError> {
        match self.text {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(ApiError::Validation(TEXT_REQUIRED)),
        }
    }
}

/// Body of `POST /compare`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub new_text: Option<String>,
    #[serde(default)]
    pub old_texts: Option<Vec<String>>,
}

/// A compare request whose required fields are present and non-empty.
#[derive(Debug, Clone)]
pub struct ValidCompare {
    pub new_text: String,
    pub old_texts: Vec<String>,
}

impl CompareRequest {
    pub fn validate(self) -> Result<ValidCompare, ApiError> {
        match (self.new_text, self.old_texts) {
            (Some(new_text), Some(old_texts)) if !new_text.is_empty() && !old_texts.is_empty() => {
                Ok(ValidCompare {
                    new_text,
                    old_texts,
                })
            }
            _ => Err(ApiError::Validation(COMPARE_FIELDS_REQUIRED)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompareResponse {
    pub new_text: String,
    pub scores: Vec<f32>,
    pub best_match_index: usize,
    pub best_score: f32,
    pub threshold_met: bool,
}

impl CompareResponse {
    pub fn new(new_text: String, comparison: Comparison) -> Self {
        Self {
            new_text,
            scores: comparison.scores,
            best_match_index: comparison.best_match_index,
            best_score: comparison.best_score,
            threshold_met: comparison.threshold_met,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    /// `"ok"` when the model is loaded, `"degraded"` otherwise.
    pub status: String,
    pub model: String,
    pub model_loaded: bool,
    pub dimensions: Option<usize>,
}

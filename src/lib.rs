//! # echofinder-embed — Sentence Embedding Service
//!
//! Small HTTP service that embeds text with a pretrained sentence-transformers
//! model and finds the closest semantic match for a new text among a list of
//! historical texts (used to flag likely duplicate issues).
//!
//! ## Architecture
//!
//! - **[`config`]** — JSON configuration with documented defaults
//! - **[`embedder`]** — Text embedding via ONNX Runtime (all-MiniLM-L6-v2), model download
//! - **[`model`]** — Load-once model holder; empty when loading failed
//! - **[`similarity`]** — Cosine similarity, argmax and threshold check
//! - **[`api`]** — axum routes for `/embed`, `/compare` and `/health`

pub mod api;
pub mod config;
pub mod embedder;
pub mod model;
pub mod similarity;

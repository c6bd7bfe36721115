#![cfg_attr(doc, forbid(rustdoc::broken_intra_doc_links, rustdoc::private_intra_doc_links))]
//! Local sentence embeddings and cross-encoder relevance scores.
//!
//! A model directory with a `config.json`, a `tokenizer.json` and an onnx model is loaded into
//! either an [`Embedder`], which computes normalized embeddings of sequences, or a
//! [`CrossEncoder`], which scores the relevance of candidates for a query.
//!
//! ```no_run
//! use encoder::Builder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let embedder = Builder::from_dir("all-MiniLM-L6-v2")?
//!         .with_token_size(128)
//!         .build_embedder()?;
//!     let embedding = embedder.embed_one("This is a sequence.")?;
//!     assert_eq!(embedding.shape(), [embedder.embedding_size()]);
//!
//!     let reranker = Builder::from_dir("ms-marco-MiniLM-L-6-v2")?.build_cross_encoder()?;
//!     let ranked = reranker.score_and_rank("query", &["a candidate", "another one"], 1)?;
//!     assert_eq!(ranked.len(), 1);
//!
//!     Ok(())
//! }
//! ```

mod adapter;
mod batch;
mod builder;
mod config;
mod pipeline;
mod pooler;
mod scorer;
mod session;

pub use crate::{
    adapter::Architecture,
    builder::{Builder, BuilderError},
    config::{ConfigurationError, ModelConfig, ModelDir},
    pipeline::{CrossEncoder, Embedder, PipelineError},
    pooler::{AveragePooler, Embedding, Embedding1, Embedding2, FirstPooler, Pooler},
    session::{InferenceError, ResourceError, Session, SessionError, TractSession},
};
pub use wordpiece::{Family, TokenizerError};

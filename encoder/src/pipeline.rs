use std::cmp::Ordering;

use displaydoc::Display;
use ndarray::{ArrayD, Ix3};
use thiserror::Error;
use wordpiece::{Encoding, Tokenizer, TokenizerError};

use crate::{
    adapter::{attention_mask, Adapter, Architecture},
    batch::run_batched,
    pooler::{normalize, Embedding1, Pooler},
    scorer::scores,
    session::{InferenceError, ResourceError, SessionError},
};

/// The potential errors of the pipelines.
#[derive(Debug, Display, Error)]
pub enum PipelineError {
    /// Failed to tokenize the sequence: {0}
    Tokenization(#[from] TokenizerError),
    /// Failed to run the model: {0}
    Inference(#[from] InferenceError),
    /// Failed to acquire the resources of the model: {0}
    Resource(#[from] ResourceError),
    /// The batch size must be greater than zero
    BatchSize,
}

impl From<SessionError> for PipelineError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Inference(error) => error.into(),
            SessionError::Resource(error) => error.into(),
        }
    }
}

/// A pipeline which embeds sequences.
///
/// Can be created via the [`Builder`] and consists of a tokenizer, a model session and a pooler.
///
/// [`Builder`]: crate::Builder
pub struct Embedder {
    pub(crate) tokenizer: Tokenizer<i64>,
    pub(crate) adapter: Adapter,
    pub(crate) pooler: Pooler,
    pub(crate) normalize: bool,
    pub(crate) hidden_size: usize,
    pub(crate) batch_size: usize,
}

impl Embedder {
    /// Runs the encodings as one batch.
    fn run(&self, encodings: Vec<Encoding<i64>>) -> Result<Vec<Embedding1>, PipelineError> {
        let hidden = self.adapter.run(&encodings)?;
        let shape = hidden.shape().to_vec();
        let hidden = match shape.as_slice() {
            [batch_size, _, hidden_size] if *batch_size == encodings.len() => {
                if *hidden_size != self.hidden_size {
                    return Err(InferenceError::HiddenSize(self.hidden_size, *hidden_size).into());
                }
                hidden
                    .into_dimensionality::<Ix3>()
                    .map_err(ResourceError::from)?
            }
            shape => return Err(InferenceError::Output(format!("{:?}", shape)).into()),
        };

        let attention_mask = attention_mask(&encodings)?;
        Ok(self
            .pooler
            .pool(hidden.view(), Some(attention_mask.view()))
            .into_iter()
            .map(|embedding| {
                if self.normalize {
                    normalize(embedding).into()
                } else {
                    embedding.into()
                }
            })
            .collect())
    }

    /// Computes the embedding of the sequence.
    pub fn embed_one(&self, sequence: impl AsRef<str>) -> Result<Embedding1, PipelineError> {
        let encoding = self.tokenizer.encode(sequence);
        self.single(self.run(vec![encoding])?)
    }

    /// Computes the embedding of the raw sequence.
    ///
    /// # Errors
    /// Fails if the sequence is not valid utf-8.
    pub fn embed_bytes(&self, sequence: &[u8]) -> Result<Embedding1, PipelineError> {
        let encoding = self.tokenizer.encode_bytes(sequence)?;
        self.single(self.run(vec![encoding])?)
    }

    fn single(&self, embeddings: Vec<Embedding1>) -> Result<Embedding1, PipelineError> {
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::Output("[0]".into()).into())
    }

    /// Computes the embeddings of the sequences in batches of the given size.
    ///
    /// The embeddings are in the same order as the sequences.
    pub fn embed_batch(
        &self,
        sequences: &[impl AsRef<str>],
        batch_size: usize,
    ) -> Result<Vec<Embedding1>, PipelineError> {
        if batch_size == 0 {
            return Err(PipelineError::BatchSize);
        }

        run_batched(sequences, batch_size, |batch| {
            self.run(self.tokenizer.encode_batch(batch))
        })
    }

    /// Computes the embeddings of the sequences in batches of the configured size.
    pub fn embed_all(
        &self,
        sequences: &[impl AsRef<str>],
    ) -> Result<Vec<Embedding1>, PipelineError> {
        self.embed_batch(sequences, self.batch_size)
    }

    /// Gets the token size.
    pub fn token_size(&self) -> Option<usize> {
        self.tokenizer.token_size()
    }

    /// Gets the embedding size.
    pub fn embedding_size(&self) -> usize {
        self.hidden_size
    }

    /// Gets the input architecture of the model.
    pub fn architecture(&self) -> Architecture {
        self.adapter.architecture()
    }

    /// Gets the tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer<i64> {
        &self.tokenizer
    }
}

/// A pipeline which scores the relevance of candidates for a query.
///
/// Can be created via the [`Builder`] and consists of a pair tokenizer and a model session.
///
/// [`Builder`]: crate::Builder
pub struct CrossEncoder {
    pub(crate) tokenizer: Tokenizer<i64>,
    pub(crate) adapter: Adapter,
    pub(crate) batch_size: usize,
}

impl CrossEncoder {
    /// Runs the encodings as one batch.
    fn run(&self, encodings: Vec<Encoding<i64>>) -> Result<Vec<f32>, PipelineError> {
        let logits: ArrayD<f32> = self.adapter.run(&encodings)?;
        scores(logits, encodings.len()).map_err(Into::into)
    }

    /// Computes the relevance score of the candidate for the query.
    pub fn score(
        &self,
        query: impl AsRef<str>,
        candidate: impl AsRef<str>,
    ) -> Result<f32, PipelineError> {
        let encoding = self.tokenizer.encode_pair(query, candidate);
        self.run(vec![encoding])?
            .first()
            .copied()
            .ok_or_else(|| InferenceError::Output("[0]".into()).into())
    }

    /// Computes the relevance scores of the candidates for the query in batches of the given size.
    ///
    /// The scores are in the same order as the candidates.
    pub fn score_batch(
        &self,
        query: impl AsRef<str>,
        candidates: &[impl AsRef<str>],
        batch_size: usize,
    ) -> Result<Vec<f32>, PipelineError> {
        if batch_size == 0 {
            return Err(PipelineError::BatchSize);
        }

        let query = query.as_ref();
        run_batched(candidates, batch_size, |batch| {
            self.run(self.tokenizer.encode_pair_batch(query, batch))
        })
    }

    /// Ranks the candidates for the query by descending relevance and keeps at most `limit` of
    /// them.
    ///
    /// Candidates with equal scores keep their relative order.
    pub fn score_and_rank(
        &self,
        query: impl AsRef<str>,
        candidates: &[impl AsRef<str>],
        limit: usize,
    ) -> Result<Vec<(String, f32)>, PipelineError> {
        let scores = self.score_batch(query, candidates, self.batch_size)?;
        let mut ranked = candidates
            .iter()
            .map(|candidate| candidate.as_ref().to_string())
            .zip(scores)
            .collect::<Vec<_>>();
        ranked.sort_by(|(_, this), (_, other)| {
            other.partial_cmp(this).unwrap_or(Ordering::Equal)
        });
        ranked.truncate(limit);

        Ok(ranked)
    }

    /// Gets the token size.
    pub fn token_size(&self) -> Option<usize> {
        self.tokenizer.token_size()
    }

    /// Gets the input architecture of the model.
    pub fn architecture(&self) -> Architecture {
        self.adapter.architecture()
    }
}

use std::{fs::File, io::BufReader, path::Path};

use displaydoc::Display;
use log::info;
use thiserror::Error;
use wordpiece::{Family, Padding, Tokenizer, Truncation};

use crate::{
    adapter::{Adapter, Architecture},
    config::{ConfigurationError, ModelDir},
    pipeline::{CrossEncoder, Embedder},
    pooler::Pooler,
    session::{InferenceError, Session, TractSession},
};

/// The default number of sequences per batch.
const DEFAULT_BATCH_SIZE: usize = 16;

/// A builder to create an [`Embedder`] or a [`CrossEncoder`] pipeline from a model directory.
pub struct Builder {
    model: ModelDir,
    token_size: Option<usize>,
    batch_size: usize,
    pooler: Option<Pooler>,
    normalize: bool,
    family: Option<Family>,
}

/// The potential errors of the [`Builder`].
#[derive(Debug, Display, Error)]
pub enum BuilderError {
    /// Invalid model configuration: {0}
    Configuration(#[from] ConfigurationError),
    /// Failed to load the model session: {0}
    Session(#[from] InferenceError),
}

impl From<wordpiece::BuilderError> for BuilderError {
    fn from(error: wordpiece::BuilderError) -> Self {
        ConfigurationError::from(error).into()
    }
}

impl Builder {
    /// Creates a pipeline builder from a model directory.
    ///
    /// # Errors
    /// Fails if the configuration files of the directory are missing or malformed.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self, BuilderError> {
        Ok(Self {
            model: ModelDir::open(path)?,
            token_size: None,
            batch_size: DEFAULT_BATCH_SIZE,
            pooler: None,
            normalize: true,
            family: None,
        })
    }

    /// Sets the token size for the tokenizer and the model.
    ///
    /// Defaults to the sequence length declared by the model directory, else to `512`. It is
    /// clipped to the maximum position embeddings of the model.
    pub fn with_token_size(mut self, size: usize) -> Self {
        self.token_size = Some(size);
        self
    }

    /// Sets the batch size for the batched operations of the pipelines and the execution plan of
    /// the onnx model.
    ///
    /// Defaults to `16`.
    ///
    /// # Errors
    /// Fails if `size` is zero.
    pub fn with_batch_size(mut self, size: usize) -> Result<Self, BuilderError> {
        if size == 0 {
            Err(ConfigurationError::BatchSize.into())
        } else {
            self.batch_size = size;
            Ok(self)
        }
    }

    /// Sets the pooling strategy for the embeddings.
    ///
    /// Defaults to the strategy declared by the model directory, else to [`Pooler::Average`].
    pub fn with_pooling(mut self, pooler: Pooler) -> Self {
        self.pooler = Some(pooler);
        self
    }

    /// Toggles the normalization of the embeddings to unit length.
    ///
    /// Defaults to `true`.
    pub fn with_normalization(mut self, toggle: bool) -> Self {
        self.normalize = toggle;
        self
    }

    /// Sets the family of the special tokens.
    ///
    /// Defaults to the family of the `model_type` of the model configuration.
    pub fn with_family(mut self, family: Family) -> Self {
        self.family = Some(family);
        self
    }

    fn family(&self) -> Family {
        self.family.unwrap_or_else(|| self.model.family())
    }

    /// Resolves the token size from the settings and the tokenizer description.
    fn resolve_token_size(&self) -> Result<usize, BuilderError> {
        let described = self.model.tokenizer()?.max_length();
        Ok(self.model.token_size(self.token_size, described))
    }

    /// Loads the onnx model of the directory.
    fn load_session(&self) -> Result<TractSession, BuilderError> {
        let path = self.model.onnx()?;
        let model = BufReader::new(File::open(path).map_err(ConfigurationError::from)?);
        TractSession::new(model, self.batch_size, self.resolve_token_size()?).map_err(Into::into)
    }

    /// Creates the adapter and the matching tokenizer for the session.
    fn load(
        &self,
        session: impl Session + Send + Sync + 'static,
    ) -> Result<(Adapter, Tokenizer<i64>), BuilderError> {
        let adapter = Adapter::new(Box::new(session))?;
        let token_size = self.resolve_token_size()?;
        let tokenizer = self
            .model
            .tokenizer()?
            .with_family(self.family())
            .with_type_ids(adapter.architecture() == Architecture::DualSpan)
            .with_truncation(Truncation::fixed(token_size))
            .with_padding(Padding::fixed(token_size))
            .build()?;
        info!(
            "loaded the {:?} model from {} with {:?} architecture, token size {} and hidden size {}",
            tokenizer.family(),
            self.model.path().display(),
            adapter.architecture(),
            token_size,
            self.model.config().hidden_size,
        );

        Ok((adapter, tokenizer))
    }

    /// Builds an [`Embedder`] with the onnx model of the directory.
    ///
    /// # Errors
    /// Fails on invalid configurations or if the model can't be loaded.
    pub fn build_embedder(self) -> Result<Embedder, BuilderError> {
        let session = self.load_session()?;
        self.build_embedder_with_session(session)
    }

    /// Builds an [`Embedder`] with an externally created session.
    ///
    /// # Errors
    /// Fails on invalid configurations or unsupported session inputs.
    pub fn build_embedder_with_session(
        self,
        session: impl Session + Send + Sync + 'static,
    ) -> Result<Embedder, BuilderError> {
        let (adapter, tokenizer) = self.load(session)?;

        Ok(Embedder {
            tokenizer,
            adapter,
            pooler: self
                .pooler
                .or_else(|| self.model.pooler())
                .unwrap_or_default(),
            normalize: self.normalize,
            hidden_size: self.model.config().hidden_size,
            batch_size: self.batch_size,
        })
    }

    /// Builds a [`CrossEncoder`] with the onnx model of the directory.
    ///
    /// # Errors
    /// Fails on invalid configurations or if the model can't be loaded.
    pub fn build_cross_encoder(self) -> Result<CrossEncoder, BuilderError> {
        let session = self.load_session()?;
        self.build_cross_encoder_with_session(session)
    }

    /// Builds a [`CrossEncoder`] with an externally created session.
    ///
    /// # Errors
    /// Fails on invalid configurations or unsupported session inputs.
    pub fn build_cross_encoder_with_session(
        self,
        session: impl Session + Send + Sync + 'static,
    ) -> Result<CrossEncoder, BuilderError> {
        let (adapter, tokenizer) = self.load(session)?;

        Ok(CrossEncoder {
            tokenizer,
            adapter,
            batch_size: self.batch_size,
        })
    }
}

use std::{
    fs::File,
    io::{BufReader, Error as IoError},
    path::{Path, PathBuf},
};

use displaydoc::Display;
use log::warn;
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use wordpiece::{BuilderError as TokenizerBuilderError, Description, Family};

use crate::pooler::Pooler;

/// The sequence length if neither the caller nor the model directory declares one.
const DEFAULT_TOKEN_SIZE: usize = 512;

/// The potential errors of the model configuration.
#[derive(Debug, Display, Error)]
pub enum ConfigurationError {
    /// The model file {0} is missing
    MissingFile(String),
    /// Failed to load a model file: {0}
    DataFile(#[from] IoError),
    /// Failed to parse a model file: {0}
    Json(#[from] serde_json::Error),
    /// Failed to build the tokenizer: {0}
    Tokenizer(#[from] TokenizerBuilderError),
    /// The hidden size must be greater than zero
    HiddenSize,
    /// The batch size must be greater than zero
    BatchSize,
    /// The model declares the unsupported input {0}
    Input(String),
    /// The model declares no token ids input
    MissingIds,
}

/// The `config.json` of a model.
#[derive(Clone, Debug, Deserialize)]
pub struct ModelConfig {
    /// The size of the hidden states and the embeddings.
    pub hidden_size: usize,
    /// The maximum number of tokens per sequence the model supports.
    pub max_position_embeddings: usize,
    /// The architecture name, which determines the family of the special tokens.
    #[serde(default)]
    pub model_type: Option<String>,
}

/// The `sentence_bert_config.json` of a sentence-transformers model.
#[derive(Clone, Debug, Default, Deserialize)]
struct SentenceConfig {
    #[serde(default)]
    max_seq_length: Option<usize>,
    #[serde(default)]
    do_lower_case: Option<bool>,
}

/// The `1_Pooling/config.json` of a sentence-transformers model.
#[derive(Clone, Debug, Deserialize)]
struct PoolingConfig {
    #[serde(default)]
    pooling_mode_cls_token: bool,
    #[serde(default)]
    pooling_mode_mean_tokens: bool,
    #[serde(default)]
    pooling_mode_max_tokens: bool,
    #[serde(default)]
    pooling_mode_mean_sqrt_len_tokens: bool,
}

impl PoolingConfig {
    fn pooler(&self) -> Pooler {
        if self.pooling_mode_max_tokens || self.pooling_mode_mean_sqrt_len_tokens {
            warn!("the declared pooling mode is unsupported, mean pooling is used instead");
        }
        if self.pooling_mode_cls_token && !self.pooling_mode_mean_tokens {
            Pooler::First
        } else {
            Pooler::Average
        }
    }
}

/// The parsed configuration files of a model directory.
#[derive(Clone, Debug)]
pub struct ModelDir {
    path: PathBuf,
    config: ModelConfig,
    description: Description,
    sentence: SentenceConfig,
    pooler: Option<Pooler>,
}

fn read_json<T>(path: &Path) -> Result<T, ConfigurationError>
where
    T: DeserializeOwned,
{
    serde_json::from_reader(BufReader::new(File::open(path)?)).map_err(Into::into)
}

fn read_optional_json<T>(path: &Path) -> Result<Option<T>, ConfigurationError>
where
    T: DeserializeOwned,
{
    if path.is_file() {
        read_json(path).map(Some)
    } else {
        Ok(None)
    }
}

fn require(path: PathBuf) -> Result<PathBuf, ConfigurationError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigurationError::MissingFile(path.display().to_string()))
    }
}

impl ModelDir {
    /// Reads the configuration files of the model directory.
    ///
    /// # Errors
    /// Fails if the `config.json` or the `tokenizer.json` is missing or if any present
    /// configuration file is malformed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref().to_path_buf();
        let config = read_json::<ModelConfig>(&require(path.join("config.json"))?)?;
        if config.hidden_size == 0 {
            return Err(ConfigurationError::HiddenSize);
        }
        let description = Description::from_reader(BufReader::new(File::open(require(
            path.join("tokenizer.json"),
        )?)?))?;
        let sentence =
            read_optional_json::<SentenceConfig>(&path.join("sentence_bert_config.json"))?
                .unwrap_or_default();
        let pooler =
            read_optional_json::<PoolingConfig>(&path.join("1_Pooling").join("config.json"))?
                .map(|pooling| pooling.pooler());

        Ok(Self {
            path,
            config,
            description,
            sentence,
            pooler,
        })
    }

    /// Gets the path of the model directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Gets the family of the special tokens.
    pub fn family(&self) -> Family {
        self.config
            .model_type
            .as_deref()
            .map(Family::from_model_type)
            .unwrap_or_default()
    }

    /// Gets the pooling strategy declared by the model directory, if any.
    pub fn pooler(&self) -> Option<Pooler> {
        self.pooler
    }

    /// Gets the path of the onnx model, either `model.onnx` or `onnx/model.onnx`.
    pub fn onnx(&self) -> Result<PathBuf, ConfigurationError> {
        let root = self.path.join("model.onnx");
        if root.is_file() {
            Ok(root)
        } else {
            require(self.path.join("onnx").join("model.onnx"))
        }
    }

    /// Creates the tokenizer builder from the `tokenizer.json`.
    pub fn tokenizer(&self) -> Result<wordpiece::Builder<i64>, ConfigurationError> {
        let builder = wordpiece::Builder::from_description(self.description.clone())?;
        Ok(match self.sentence.do_lower_case {
            Some(lowercase) => builder.with_lowercase(lowercase),
            None => builder,
        })
    }

    /// Resolves the sequence length.
    ///
    /// The requested length is taken from the override, else the sentence-transformers
    /// configuration, else the tokenizer description, else it defaults to `512`. It is clipped to
    /// the maximum position embeddings of the model.
    pub fn token_size(&self, requested: Option<usize>, described: Option<usize>) -> usize {
        let requested = requested
            .or(self.sentence.max_seq_length)
            .or(described)
            .unwrap_or(DEFAULT_TOKEN_SIZE);
        let max = self.config.max_position_embeddings;
        if requested > max {
            warn!(
                "the token size {} exceeds the maximum position embeddings, clipping it to {}",
                requested, max,
            );
            max
        } else {
            requested
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::create_dir;

    use test_utils::fixture::{model_dir, write_json};

    use super::*;

    #[test]
    fn test_open() {
        let dir = model_dir("bert", 512, Some(128)).unwrap();
        let model = ModelDir::open(dir.path()).unwrap();
        assert_eq!(model.config().hidden_size, 4);
        assert_eq!(model.family(), Family::Bert);
        assert!(model.pooler().is_none());
        assert_eq!(model.tokenizer().unwrap().max_length(), Some(128));
    }

    #[test]
    fn test_family() {
        let dir = model_dir("mpnet", 512, None).unwrap();
        assert_eq!(ModelDir::open(dir.path()).unwrap().family(), Family::MpNet);

        let dir = model_dir("distilbert", 512, None).unwrap();
        assert_eq!(ModelDir::open(dir.path()).unwrap().family(), Family::Bert);
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ModelDir::open(dir.path()),
            Err(ConfigurationError::MissingFile(_)),
        ));
    }

    #[test]
    fn test_missing_tokenizer() {
        let dir = model_dir("bert", 512, None).unwrap();
        std::fs::remove_file(dir.path().join("tokenizer.json")).unwrap();
        assert!(matches!(
            ModelDir::open(dir.path()),
            Err(ConfigurationError::MissingFile(file)) if file.ends_with("tokenizer.json"),
        ));
    }

    #[test]
    fn test_malformed_config() {
        let dir = model_dir("bert", 512, None).unwrap();
        write_json(
            dir.path().join("config.json"),
            &serde_json::json!({ "hidden_size": 4 }),
        )
        .unwrap();
        assert!(matches!(
            ModelDir::open(dir.path()),
            Err(ConfigurationError::Json(_)),
        ));

        write_json(
            dir.path().join("config.json"),
            &serde_json::json!({ "hidden_size": 0, "max_position_embeddings": 8 }),
        )
        .unwrap();
        assert!(matches!(
            ModelDir::open(dir.path()),
            Err(ConfigurationError::HiddenSize),
        ));
    }

    #[test]
    fn test_onnx() {
        let dir = model_dir("bert", 512, None).unwrap();
        let model = ModelDir::open(dir.path()).unwrap();
        assert!(matches!(
            model.onnx(),
            Err(ConfigurationError::MissingFile(_)),
        ));

        create_dir(dir.path().join("onnx")).unwrap();
        File::create(dir.path().join("onnx").join("model.onnx")).unwrap();
        assert_eq!(
            model.onnx().unwrap(),
            dir.path().join("onnx").join("model.onnx"),
        );

        File::create(dir.path().join("model.onnx")).unwrap();
        assert_eq!(model.onnx().unwrap(), dir.path().join("model.onnx"));
    }

    #[test]
    fn test_token_size() {
        let dir = model_dir("bert", 256, None).unwrap();
        let model = ModelDir::open(dir.path()).unwrap();
        assert_eq!(model.token_size(None, None), 256);
        assert_eq!(model.token_size(None, Some(128)), 128);
        assert_eq!(model.token_size(Some(64), Some(128)), 64);
        assert_eq!(model.token_size(Some(1024), None), 256);

        write_json(
            dir.path().join("sentence_bert_config.json"),
            &serde_json::json!({ "max_seq_length": 100, "do_lower_case": false }),
        )
        .unwrap();
        let model = ModelDir::open(dir.path()).unwrap();
        assert_eq!(model.token_size(None, Some(128)), 100);
        assert_eq!(model.token_size(Some(64), Some(128)), 64);
        assert_eq!(
            model.tokenizer().unwrap().build().unwrap().tokenize("Hello"),
            ["[UNK]"],
        );
    }

    #[test]
    fn test_pooler() {
        let dir = model_dir("bert", 512, None).unwrap();
        create_dir(dir.path().join("1_Pooling")).unwrap();
        write_json(
            dir.path().join("1_Pooling").join("config.json"),
            &serde_json::json!({
                "pooling_mode_cls_token": true,
                "pooling_mode_mean_tokens": false,
            }),
        )
        .unwrap();
        assert_eq!(ModelDir::open(dir.path()).unwrap().pooler(), Some(Pooler::First));

        write_json(
            dir.path().join("1_Pooling").join("config.json"),
            &serde_json::json!({ "pooling_mode_mean_tokens": true }),
        )
        .unwrap();
        assert_eq!(ModelDir::open(dir.path()).unwrap().pooler(), Some(Pooler::Average));

        write_json(
            dir.path().join("1_Pooling").join("config.json"),
            &serde_json::json!({ "pooling_mode_max_tokens": true }),
        )
        .unwrap();
        assert_eq!(ModelDir::open(dir.path()).unwrap().pooler(), Some(Pooler::Average));
    }
}

//! Model directory fixtures.
//!
//! The fixtures only contain the json descriptions of a model, an onnx graph can be added with
//! [`write_masked_ids_model`].
//!
//! [`write_masked_ids_model`]: crate::onnx::write_masked_ids_model

use std::{fs::File, io::Result, path::Path};

use serde_json::{json, to_writer, Value};
use tempfile::TempDir;

/// A small Bert vocabulary, where the line index is the token id.
pub const BERT_VOCAB: &[&str] = &[
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "hello", "world", "the", "##re", "a", "b", "c", ",", "!",
    "query", "doc", "##s",
];

/// A small MPNet vocabulary, where the line index is the token id.
pub const MPNET_VOCAB: &[&str] = &[
    "<s>", "<pad>", "</s>", "<unk>", "hello", "world", "the", "##re", "a", "b", "c", ",", "!",
    "query", "doc", "##s",
];

/// Creates a `tokenizer.json` description for the vocabulary.
pub fn tokenizer_json(vocab: &[&str], max_length: Option<usize>) -> Value {
    let unk = vocab
        .iter()
        .find(|token| **token == "[UNK]" || **token == "<unk>")
        .copied();
    let vocab = vocab
        .iter()
        .enumerate()
        .map(|(id, token)| (token.to_string(), json!(id)))
        .collect::<serde_json::Map<_, _>>();

    json!({
        "version": "1.0",
        "truncation": max_length.map(|max_length| json!({ "max_length": max_length })),
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true,
        },
        "model": {
            "type": "WordPiece",
            "unk_token": unk,
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": vocab,
        },
    })
}

/// Creates a `config.json` model configuration.
pub fn config_json(model_type: &str, hidden_size: usize, max_position_embeddings: usize) -> Value {
    json!({
        "model_type": model_type,
        "hidden_size": hidden_size,
        "max_position_embeddings": max_position_embeddings,
    })
}

/// Writes the json value to the path.
pub fn write_json(path: impl AsRef<Path>, value: &Value) -> Result<()> {
    to_writer(File::create(path)?, value).map_err(Into::into)
}

/// Creates a temporary model directory with a `config.json` and a `tokenizer.json`.
///
/// The vocabulary is chosen by the model type, the hidden size is `4`.
pub fn model_dir(
    model_type: &str,
    max_position_embeddings: usize,
    max_length: Option<usize>,
) -> Result<TempDir> {
    let vocab = if model_type == "mpnet" {
        MPNET_VOCAB
    } else {
        BERT_VOCAB
    };
    let dir = tempfile::tempdir()?;
    write_json(
        dir.path().join("config.json"),
        &config_json(model_type, 4, max_position_embeddings),
    )?;
    write_json(
        dir.path().join("tokenizer.json"),
        &tokenizer_json(vocab, max_length),
    )?;

    Ok(dir)
}

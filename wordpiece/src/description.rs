use std::{collections::HashMap, io::Read};

use serde::Deserialize;

/// The parsed parts of a `tokenizer.json` description which are relevant for a word piece model.
///
/// Unrelated sections of the description are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct Description {
    pub(crate) model: ModelSection,
    #[serde(default)]
    pub(crate) normalizer: Option<NormalizerSection>,
    #[serde(default)]
    pub(crate) truncation: Option<TruncationSection>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ModelSection {
    pub(crate) vocab: HashMap<String, u64>,
    #[serde(default)]
    pub(crate) unk_token: Option<String>,
    #[serde(default)]
    pub(crate) continuing_subword_prefix: Option<String>,
    #[serde(default)]
    pub(crate) max_input_chars_per_word: Option<usize>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct NormalizerSection {
    #[serde(default = "enabled")]
    pub(crate) clean_text: bool,
    #[serde(default = "enabled")]
    pub(crate) handle_chinese_chars: bool,
    // `null` follows the lowercasing
    #[serde(default)]
    pub(crate) strip_accents: Option<bool>,
    #[serde(default = "enabled")]
    pub(crate) lowercase: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct TruncationSection {
    pub(crate) max_length: usize,
}

fn enabled() -> bool {
    true
}

impl Description {
    /// Parses the description from its json representation.
    pub fn from_reader(reader: impl Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// Gets the maximum sequence length of the truncation section, if any.
    pub fn max_length(&self) -> Option<usize> {
        self.truncation.as_ref().map(|truncation| truncation.max_length)
    }
}

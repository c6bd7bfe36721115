use std::{
    fs::File,
    io::{BufRead, BufReader, Error as IoError, Read},
    path::Path,
};

use displaydoc::Display;
use num_traits::{FromPrimitive, Num};
use thiserror::Error;

use crate::{
    description::Description,
    model::Model,
    normalizer::Normalizer,
    padding::{Padding, PaddingError},
    post_tokenizer::PostTokenizer,
    pre_tokenizer::PreTokenizer,
    tokenizer::Tokenizer,
    truncation::{Truncation, TruncationError},
    vocab::{convert_vocab, parse_vocab, Family, SpecialTokens, Vocab, VocabError},
};

/// A builder to create a [`Tokenizer`].
pub struct Builder<N> {
    vocab: Vocab<N>,
    family: Family,
    unk: Option<String>,
    prefix: String,
    max_chars: usize,
    normalizer: Normalizer,
    type_ids: bool,
    max_len: Option<usize>,
    truncation: Truncation,
    padding: Padding,
}

/// The potential errors of the builder.
#[derive(Debug, Display, Error)]
pub enum BuilderError {
    /// Failed to load a data file: {0}
    DataFile(#[from] IoError),
    /// Failed to parse the tokenizer description: {0}
    Description(#[from] serde_json::Error),
    /// Invalid vocabulary: {0}
    Vocab(#[from] VocabError),
    /// Invalid truncation strategy: {0}
    Truncation(#[from] TruncationError),
    /// Invalid padding strategy: {0}
    Padding(#[from] PaddingError),
}

impl<N> Builder<N>
where
    N: Num + FromPrimitive + Copy,
{
    /// Creates a [`Tokenizer`] builder from a `tokenizer.json` description file.
    pub fn from_file(description: impl AsRef<Path>) -> Result<Self, BuilderError> {
        Self::from_reader(BufReader::new(File::open(description)?))
    }

    /// Creates a [`Tokenizer`] builder from an in-memory `tokenizer.json` description.
    pub fn from_reader(description: impl Read) -> Result<Self, BuilderError> {
        Self::from_description(Description::from_reader(description)?)
    }

    /// Creates a [`Tokenizer`] builder from a parsed description.
    ///
    /// The word piece settings, the normalizer settings and the maximum length are taken from the
    /// description where present.
    pub fn from_description(description: Description) -> Result<Self, BuilderError> {
        let max_len = description.max_length();
        let Description {
            model, normalizer, ..
        } = description;

        let mut builder = Self::new(convert_vocab(model.vocab)?);
        builder.unk = model.unk_token;
        if let Some(prefix) = model.continuing_subword_prefix {
            builder.prefix = prefix;
        }
        if let Some(max_chars) = model.max_input_chars_per_word {
            builder.max_chars = max_chars;
        }
        if let Some(normalizer) = normalizer {
            builder.normalizer = Normalizer::new(
                normalizer.clean_text,
                normalizer.handle_chinese_chars,
                normalizer.strip_accents.unwrap_or(normalizer.lowercase),
                normalizer.lowercase,
            );
        }
        builder.max_len = max_len;

        Ok(builder)
    }

    /// Creates a [`Tokenizer`] builder from a `vocab.txt` file with one token per line.
    pub fn from_vocab_file(vocab: impl AsRef<Path>) -> Result<Self, BuilderError> {
        Self::from_vocab_reader(BufReader::new(File::open(vocab)?))
    }

    /// Creates a [`Tokenizer`] builder from an in-memory vocabulary with one token per line.
    pub fn from_vocab_reader(vocab: impl BufRead) -> Result<Self, BuilderError> {
        Ok(Self::new(parse_vocab(vocab)?))
    }
}

impl<N> Builder<N> {
    /// Creates a [`Tokenizer`] builder from a vocabulary.
    ///
    /// The default settings are:
    /// - The [`Family::Bert`] special tokens.
    /// - A word piece model with the family's unknown token, `"##"` continuing subword prefix and
    /// `100` maximum characters per word.
    /// - A normalizer which cleans the text, separates chinese characters, strips accents and
    /// lowercases.
    /// - No type ids, no truncation and no padding.
    pub fn new(vocab: Vocab<N>) -> Self {
        Self {
            vocab,
            family: Family::default(),
            unk: None,
            prefix: "##".into(),
            max_chars: 100,
            normalizer: Normalizer::default(),
            type_ids: false,
            max_len: None,
            truncation: Truncation::default(),
            padding: Padding::default(),
        }
    }

    /// Sets the model family, which determines the special tokens.
    ///
    /// Defaults to [`Family::Bert`].
    pub fn with_family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    /// Configures the normalizer.
    pub fn with_normalizer(
        mut self,
        clean_text: bool,
        handle_chinese_chars: bool,
        strip_accents: bool,
        lowercase: bool,
    ) -> Self {
        self.normalizer =
            Normalizer::new(clean_text, handle_chinese_chars, strip_accents, lowercase);
        self
    }

    /// Toggles lowercasing and accent stripping of the normalizer.
    pub fn with_lowercase(mut self, toggle: bool) -> Self {
        self.normalizer = self.normalizer.with_lowercase(toggle);
        self
    }

    /// Configures the word piece model.
    pub fn with_model(
        mut self,
        unk: impl Into<String>,
        prefix: impl Into<String>,
        max_chars: usize,
    ) -> Self {
        self.unk = Some(unk.into());
        self.prefix = prefix.into();
        self.max_chars = max_chars;
        self
    }

    /// Toggles the type ids of the encodings.
    ///
    /// Defaults to `false`.
    pub fn with_type_ids(mut self, toggle: bool) -> Self {
        self.type_ids = toggle;
        self
    }

    /// Configures the truncation strategy.
    pub fn with_truncation(mut self, truncation: Truncation) -> Self {
        self.truncation = truncation;
        self
    }

    /// Configures the padding strategy.
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    /// Gets the maximum sequence length of the description, if any.
    pub fn max_length(&self) -> Option<usize> {
        self.max_len
    }

    /// Builds the tokenizer.
    ///
    /// # Errors
    /// Fails on invalid special tokens, truncation or padding settings.
    pub fn build(self) -> Result<Tokenizer<N>, BuilderError>
    where
        N: FromPrimitive + Copy,
    {
        let special = SpecialTokens::resolve(&self.vocab, self.family, self.unk.as_deref())?;
        let truncation = self.truncation.validate(self.family)?;
        let padding = self.padding.validate()?;
        let model = Model {
            vocab: self.vocab,
            unk: special.unk.clone(),
            prefix: self.prefix,
            max_chars: self.max_chars,
        };

        Ok(Tokenizer {
            normalizer: self.normalizer,
            pre_tokenizer: PreTokenizer,
            model,
            post_tokenizer: PostTokenizer {
                family: self.family,
                special,
                type_ids: self.type_ids,
            },
            truncation,
            padding,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use test_utils::fixture::{tokenizer_json, BERT_VOCAB, MPNET_VOCAB};

    use super::*;

    #[test]
    fn test_from_reader() {
        let description = tokenizer_json(BERT_VOCAB, Some(16));
        let builder = Builder::<i64>::from_reader(description.to_string().as_bytes()).unwrap();
        assert_eq!(builder.max_length(), Some(16));

        let tokenizer = builder.build().unwrap();
        assert_eq!(tokenizer.vocab_size(), BERT_VOCAB.len());
        assert_eq!(tokenizer.special_tokens().begin().token(), "[CLS]");
        assert_eq!(tokenizer.token_size(), None);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(tokenizer_json(MPNET_VOCAB, None).to_string().as_bytes())
            .unwrap();

        let tokenizer = Builder::<i64>::from_file(file.path())
            .unwrap()
            .with_family(Family::MpNet)
            .with_truncation(Truncation::fixed(8))
            .with_padding(Padding::fixed(8))
            .build()
            .unwrap();
        let encoding = tokenizer.encode("hello world");
        assert_eq!(encoding.tokens()[0], "<s>");
        assert_eq!(encoding.tokens()[3], "</s>");
        assert_eq!(encoding.tokens()[4], "<pad>");
        assert!(encoding.type_ids().is_none());
    }

    #[test]
    fn test_from_vocab_reader() {
        let vocab = "[PAD]\n[UNK]\n[CLS]\n[SEP]\nhi\n";
        let tokenizer = Builder::<u32>::from_vocab_reader(vocab.as_bytes())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(tokenizer.encode("hi").ids(), [2, 4, 3]);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Builder::<i64>::from_file("does/not/exist.json"),
            Err(BuilderError::DataFile(_)),
        ));
    }

    #[test]
    fn test_malformed_description() {
        assert!(matches!(
            Builder::<i64>::from_reader(r#"{ "model": {} }"#.as_bytes()),
            Err(BuilderError::Description(_)),
        ));
        assert!(matches!(
            Builder::<i64>::from_reader(r#"{ "model": { "vocab": {} } }"#.as_bytes()),
            Err(BuilderError::Vocab(VocabError::Empty)),
        ));
    }

    fn bert() -> Builder<i64> {
        Builder::from_reader(tokenizer_json(BERT_VOCAB, None).to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_invalid_strategies() {
        assert!(matches!(
            bert().with_truncation(Truncation::fixed(2)).build(),
            Err(BuilderError::Truncation(_)),
        ));
        assert!(matches!(
            bert().with_padding(Padding::fixed(0)).build(),
            Err(BuilderError::Padding(_)),
        ));
    }

    #[test]
    fn test_normalizer_from_description() {
        let mut description = tokenizer_json(BERT_VOCAB, None);
        description["normalizer"]["lowercase"] = false.into();
        let tokenizer = Builder::<i64>::from_reader(description.to_string().as_bytes())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(tokenizer.tokenize("Hello hello"), ["[UNK]", "hello"]);
    }

    #[test]
    fn test_lowercase_override() {
        let tokenizer = bert()
            .with_lowercase(false)
            .build()
            .unwrap();
        assert_eq!(tokenizer.tokenize("Hello hello"), ["[UNK]", "hello"]);
    }

    #[test]
    fn test_model_settings() {
        let tokenizer = bert()
            .with_model("[UNK]", "##", 3)
            .build()
            .unwrap();
        assert_eq!(tokenizer.tokenize("hello"), ["[UNK]"]);
    }
}

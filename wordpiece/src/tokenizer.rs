use std::str::{from_utf8, Utf8Error};

use displaydoc::Display;
use num_traits::{FromPrimitive, Num};
use thiserror::Error;

use crate::{
    encoding::Encoding,
    model::{Model, Token},
    normalizer::Normalizer,
    padding::Padding,
    post_tokenizer::PostTokenizer,
    pre_tokenizer::PreTokenizer,
    truncation::Truncation,
    vocab::{Family, SpecialTokens},
};

/// A word piece tokenizer.
///
/// Can be created via the [`Builder`] and consists of a Bert normalizer, a Bert pre-tokenizer, a
/// word piece model and a post-tokenizer including truncation and padding strategies.
///
/// [`Builder`]: crate::Builder
#[derive(Debug)]
pub struct Tokenizer<N> {
    pub(crate) normalizer: Normalizer,
    pub(crate) pre_tokenizer: PreTokenizer,
    pub(crate) model: Model<N>,
    pub(crate) post_tokenizer: PostTokenizer<N>,
    pub(crate) truncation: Truncation,
    pub(crate) padding: Padding,
}

/// The potential errors of the tokenizer.
#[derive(Debug, Display, Error)]
pub enum TokenizerError {
    /// The sequence is not valid utf-8: {0}
    Utf8(#[from] Utf8Error),
}

impl<N> Tokenizer<N>
where
    N: Num + FromPrimitive + Copy,
{
    /// Splits the sequence into its subwords without any special tokens.
    fn subwords(&self, sequence: impl AsRef<str>) -> Vec<Token<N>> {
        let sequence = self.normalizer.normalize(sequence);
        let words = self.pre_tokenizer.pre_tokenize(&sequence);
        self.model.tokenize(words)
    }

    /// Tokenizes the sequence into subwords without any special tokens.
    pub fn tokenize(&self, sequence: impl AsRef<str>) -> Vec<String> {
        self.subwords(sequence)
            .into_iter()
            .map(|token| token.value)
            .collect()
    }

    /// Encodes the sequence.
    pub fn encode(&self, sequence: impl AsRef<str>) -> Encoding<N> {
        let sequence = self.subwords(sequence);
        let sequence = self
            .truncation
            .truncate(sequence, self.post_tokenizer.added_tokens(false));
        let encoding = self.post_tokenizer.post_tokenize(sequence);
        self.padding.pad(encoding, &self.post_tokenizer.special.pad)
    }

    /// Encodes the raw sequence.
    ///
    /// # Errors
    /// Fails if the sequence is not valid utf-8.
    pub fn encode_bytes(&self, sequence: &[u8]) -> Result<Encoding<N>, TokenizerError> {
        from_utf8(sequence)
            .map(|sequence| self.encode(sequence))
            .map_err(Into::into)
    }

    /// Encodes the pair of sequences.
    pub fn encode_pair(&self, first: impl AsRef<str>, second: impl AsRef<str>) -> Encoding<N> {
        let (first, second) = self.truncation.truncate_pair(
            self.subwords(first),
            self.subwords(second),
            self.post_tokenizer.added_tokens(true),
        );
        let encoding = self.post_tokenizer.post_tokenize_pair(first, second);
        self.padding.pad(encoding, &self.post_tokenizer.special.pad)
    }

    /// Encodes the batch of sequences.
    pub fn encode_batch(&self, sequences: &[impl AsRef<str>]) -> Vec<Encoding<N>> {
        sequences
            .iter()
            .map(|sequence| self.encode(sequence))
            .collect()
    }

    /// Encodes the batch of pairs, where each pair consists of the same first sequence and one of
    /// the second sequences.
    pub fn encode_pair_batch(
        &self,
        first: impl AsRef<str>,
        seconds: &[impl AsRef<str>],
    ) -> Vec<Encoding<N>> {
        seconds
            .iter()
            .map(|second| self.encode_pair(first.as_ref(), second))
            .collect()
    }

    /// Decodes the encoding with optional cleanup.
    pub fn decode(&self, encoding: &Encoding<N>, cleanup: bool) -> String {
        let special = &self.post_tokenizer.special;
        encoding.decode(
            |token| special.is_control(token),
            special.unk.token(),
            self.model.prefix.as_str(),
            cleanup,
        )
    }
}

impl<N> Tokenizer<N> {
    /// Gets the model family.
    pub fn family(&self) -> Family {
        self.post_tokenizer.family
    }

    /// Gets the special tokens.
    pub fn special_tokens(&self) -> &SpecialTokens<N> {
        &self.post_tokenizer.special
    }

    /// Gets the number of tokens in the vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.model.vocab.len()
    }

    /// Checks whether the encodings carry type ids.
    pub fn has_type_ids(&self) -> bool {
        self.post_tokenizer.type_ids
    }

    /// Gets the fixed length of the encodings, if any.
    pub fn token_size(&self) -> Option<usize> {
        self.padding.fixed_len()
    }
}

use std::{collections::HashMap, io::BufRead};

use displaydoc::Display;
use log::warn;
use num_traits::FromPrimitive;
use thiserror::Error;

use crate::SmallString;

/// A word piece vocabulary, mapping subwords to their ids.
pub type Vocab<N> = HashMap<String, N>;

/// The potential errors of the vocabulary.
#[derive(Debug, Display, Error)]
pub enum VocabError {
    /// Failed to read the vocabulary: {0}
    Read(#[from] std::io::Error),
    /// The vocabulary is empty
    Empty,
    /// The id {0} of the token is not representable
    Id(u64),
}

/// Parses a vocabulary with one token per line, where the line index is the token id.
pub(crate) fn parse_vocab<N>(vocab: impl BufRead) -> Result<Vocab<N>, VocabError>
where
    N: FromPrimitive,
{
    let vocab = vocab
        .lines()
        .enumerate()
        .map(|(idx, word)| -> Result<(String, N), VocabError> {
            let id = N::from_usize(idx).ok_or(VocabError::Id(idx as u64))?;
            Ok((word?.trim().to_string(), id))
        })
        .collect::<Result<Vocab<N>, VocabError>>()?;

    if vocab.is_empty() {
        Err(VocabError::Empty)
    } else {
        Ok(vocab)
    }
}

/// Converts the raw ids of a vocabulary into the id type.
pub(crate) fn convert_vocab<N>(vocab: HashMap<String, u64>) -> Result<Vocab<N>, VocabError>
where
    N: FromPrimitive,
{
    if vocab.is_empty() {
        return Err(VocabError::Empty);
    }

    vocab
        .into_iter()
        .map(|(word, id)| {
            N::from_u64(id)
                .map(|id| (word, id))
                .ok_or(VocabError::Id(id))
        })
        .collect()
}

/// The family of a model, which determines its special tokens and pair layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    /// Bert-like models with `[CLS]`, `[SEP]`, `[PAD]` and `[UNK]` tokens.
    Bert,
    /// MPNet-like models with `<s>`, `</s>`, `<pad>` and `<unk>` tokens.
    MpNet,
}

impl Default for Family {
    fn default() -> Self {
        Self::Bert
    }
}

impl Family {
    /// Resolves the family from the `model_type` of a model configuration.
    pub fn from_model_type(model_type: &str) -> Self {
        if model_type.eq_ignore_ascii_case("mpnet") {
            Self::MpNet
        } else {
            Self::Bert
        }
    }

    /// The begin, end, padding and unknown tokens and their fallback ids.
    fn defaults(self) -> [(&'static str, u32); 4] {
        match self {
            Self::Bert => [("[CLS]", 101), ("[SEP]", 102), ("[PAD]", 0), ("[UNK]", 100)],
            Self::MpNet => [("<s>", 0), ("</s>", 2), ("<pad>", 1), ("<unk>", 3)],
        }
    }

    /// The number of end tokens separating the two sequences of a pair.
    pub(crate) fn pair_separators(self) -> usize {
        match self {
            Self::Bert => 1,
            Self::MpNet => 2,
        }
    }

    /// The number of special tokens added to a single sequence or to a pair of sequences.
    pub fn added_tokens(self, pair: bool) -> usize {
        if pair {
            2 + self.pair_separators()
        } else {
            2
        }
    }
}

/// A special token and its id.
#[derive(Clone, Debug, PartialEq)]
pub struct SpecialToken<N> {
    pub(crate) id: N,
    pub(crate) token: SmallString,
}

impl<N> SpecialToken<N> {
    /// Gets the id.
    pub fn id(&self) -> N
    where
        N: Copy,
    {
        self.id
    }

    /// Gets the token.
    pub fn token(&self) -> &str {
        self.token.as_str()
    }

    fn resolve(
        vocab: &Vocab<N>,
        token: &str,
        fallback: u32,
        family: Family,
    ) -> Result<Self, VocabError>
    where
        N: FromPrimitive + Copy,
    {
        let id = if let Some(id) = vocab.get(token) {
            *id
        } else {
            warn!(
                "special token {} is missing from the vocabulary, using the {:?} default id {}",
                token, family, fallback,
            );
            N::from_u32(fallback).ok_or(VocabError::Id(fallback.into()))?
        };

        Ok(Self {
            id,
            token: token.into(),
        })
    }
}

/// The begin, end, padding and unknown special tokens.
#[derive(Clone, Debug, PartialEq)]
pub struct SpecialTokens<N> {
    pub(crate) begin: SpecialToken<N>,
    pub(crate) end: SpecialToken<N>,
    pub(crate) pad: SpecialToken<N>,
    pub(crate) unk: SpecialToken<N>,
}

impl<N> SpecialTokens<N> {
    /// Resolves the special tokens of the family from the vocabulary.
    ///
    /// The unknown token can be overridden, eg. by the tokenizer description.
    pub(crate) fn resolve(
        vocab: &Vocab<N>,
        family: Family,
        unk: Option<&str>,
    ) -> Result<Self, VocabError>
    where
        N: FromPrimitive + Copy,
    {
        let [begin, end, pad, default_unk] = family.defaults();
        let unk = unk.map_or(default_unk, |unk| (unk, default_unk.1));

        Ok(Self {
            begin: SpecialToken::resolve(vocab, begin.0, begin.1, family)?,
            end: SpecialToken::resolve(vocab, end.0, end.1, family)?,
            pad: SpecialToken::resolve(vocab, pad.0, pad.1, family)?,
            unk: SpecialToken::resolve(vocab, unk.0, unk.1, family)?,
        })
    }

    /// Gets the begin token.
    pub fn begin(&self) -> &SpecialToken<N> {
        &self.begin
    }

    /// Gets the end token.
    pub fn end(&self) -> &SpecialToken<N> {
        &self.end
    }

    /// Gets the padding token.
    pub fn pad(&self) -> &SpecialToken<N> {
        &self.pad
    }

    /// Gets the unknown token.
    pub fn unk(&self) -> &SpecialToken<N> {
        &self.unk
    }

    /// Checks whether the token is one of the begin, end or padding tokens.
    pub(crate) fn is_control(&self, token: &str) -> bool {
        token == self.begin.token() || token == self.end.token() || token == self.pad.token()
    }
}

use std::iter;

use num_traits::Num;

use crate::vocab::SpecialToken;

/// An encoded sequence or pair of sequences.
///
/// The ids, the tokens, the attention mask and the type ids (if any) are always of equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoding<N> {
    /// The ids of the tokens.
    pub(crate) ids: Vec<N>,
    /// The types of the ids, only present for models which distinguish between the sequences of a
    /// pair.
    pub(crate) type_ids: Option<Vec<N>>,
    /// The tokenized sequence.
    pub(crate) tokens: Vec<String>,
    /// The mask identifying padding tokens.
    pub(crate) attention_mask: Vec<N>,
}

impl<N> Encoding<N> {
    /// Gets the total length.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Checks whether this is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Gets the ids.
    pub fn ids(&self) -> &[N] {
        self.ids.as_slice()
    }

    /// Gets the type ids, if any.
    pub fn type_ids(&self) -> Option<&[N]> {
        self.type_ids.as_deref()
    }

    /// Gets the tokens.
    pub fn tokens(&self) -> &[String] {
        self.tokens.as_slice()
    }

    /// Gets the attention mask.
    pub fn attention_mask(&self) -> &[N] {
        self.attention_mask.as_slice()
    }

    /// Counts the non-padding tokens.
    pub fn active_len(&self) -> usize
    where
        N: Num + Copy,
    {
        self.attention_mask
            .iter()
            .filter(|mask| !mask.is_zero())
            .count()
    }

    /// Pads to a minimum length.
    pub(crate) fn pad(mut self, len: usize, pad: &SpecialToken<N>) -> Self
    where
        N: Num + Copy,
    {
        if self.len() >= len {
            return self;
        }
        let pad_len = len - self.len();

        self.ids.extend(iter::repeat(pad.id).take(pad_len));
        if let Some(type_ids) = self.type_ids.as_mut() {
            type_ids.extend(iter::repeat(N::zero()).take(pad_len));
        }
        self.tokens
            .extend(iter::repeat(pad.token().to_string()).take(pad_len));
        self.attention_mask
            .extend(iter::repeat(N::zero()).take(pad_len));

        self
    }

    /// Decodes the tokens with optional cleanup of the unknown tokens and the spacing around
    /// punctuation.
    pub(crate) fn decode(
        &self,
        is_control: impl Fn(&str) -> bool,
        unk: &str,
        prefix: &str,
        cleanup: bool,
    ) -> String {
        let mut string = String::new();
        for token in &self.tokens {
            if is_control(token) || (cleanup && token == unk) {
                continue;
            }
            if let Some(subword) = token.strip_prefix(prefix) {
                string.push_str(subword);
            } else {
                if !string.is_empty() {
                    string.push(' ');
                }
                string.push_str(token);
            }
        }

        if cleanup {
            string = string
                .replace(" .", ".")
                .replace(" ?", "?")
                .replace(" !", "!")
                .replace(" ,", ",")
                .replace(" ' ", "'")
                .replace(" n't", "n't")
                .replace(" 'm", "'m")
                .replace(" do not", " don't")
                .replace(" 's", "'s")
                .replace(" 've", "'ve")
                .replace(" 're", "'re");
        }

        string
    }
}

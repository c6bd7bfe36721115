use std::borrow::Cow;

use crate::vocab::{SpecialToken, Vocab};

/// A word piece model.
#[derive(Debug)]
pub struct Model<N> {
    pub(crate) vocab: Vocab<N>,
    pub(crate) unk: SpecialToken<N>,
    pub(crate) prefix: String,
    pub(crate) max_chars: usize,
}

/// A subword and its id.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token<N> {
    pub(crate) id: N,
    pub(crate) value: String,
}

impl<N> Model<N>
where
    N: Copy,
{
    fn unk(&self) -> Token<N> {
        Token {
            id: self.unk.id,
            value: self.unk.token().to_string(),
        }
    }

    /// Tokenizes the word into subwords by greedy longest-match-first search.
    ///
    /// Every match after the first one is looked up with the continuing subword prefix. If the
    /// word can't be fully covered by subwords, then it is replaced by a single unknown token.
    pub(crate) fn tokenize_word(&self, word: &str) -> Vec<Token<N>> {
        if word.chars().count() > self.max_chars {
            return vec![self.unk()];
        }

        let mut tokens = Vec::new();
        let mut start = 0;
        while start < word.len() {
            let mut end = word.len();
            let token = loop {
                if start >= end {
                    break None;
                }

                let piece = &word[start..end];
                let subword = if start > 0 {
                    Cow::Owned(format!("{}{}", self.prefix, piece))
                } else {
                    Cow::Borrowed(piece)
                };
                if let Some(id) = self.vocab.get(subword.as_ref()) {
                    break Some(Token {
                        id: *id,
                        value: subword.into_owned(),
                    });
                }
                end -= piece.chars().next_back().map_or(1, char::len_utf8);
            };

            if let Some(token) = token {
                tokens.push(token);
                start = end;
            } else {
                return vec![self.unk()];
            }
        }

        tokens
    }

    /// Tokenizes the words into subwords.
    pub(crate) fn tokenize<'w>(&self, words: impl IntoIterator<Item = &'w str>) -> Vec<Token<N>> {
        words
            .into_iter()
            .flat_map(|word| self.tokenize_word(word))
            .collect()
    }
}

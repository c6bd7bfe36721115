use std::iter;

use num_traits::Num;

use crate::{
    encoding::Encoding,
    model::Token,
    vocab::{Family, SpecialToken, SpecialTokens},
};

/// A post-tokenizer which adds the special tokens of the model family.
#[derive(Debug)]
pub struct PostTokenizer<N> {
    pub(crate) family: Family,
    pub(crate) special: SpecialTokens<N>,
    pub(crate) type_ids: bool,
}

fn special<N>(token: &SpecialToken<N>) -> Token<N>
where
    N: Copy,
{
    Token {
        id: token.id,
        value: token.token().to_string(),
    }
}

impl<N> PostTokenizer<N>
where
    N: Num + Copy,
{
    /// Gets the number of special tokens added to a single sequence or to a pair of sequences.
    pub(crate) fn added_tokens(&self, pair: bool) -> usize {
        self.family.added_tokens(pair)
    }

    fn collect(&self, tokens: Vec<Token<N>>, type_ids: Option<Vec<N>>) -> Encoding<N> {
        let attention_mask = vec![N::one(); tokens.len()];
        let (ids, tokens) = tokens
            .into_iter()
            .map(|token| (token.id, token.value))
            .unzip();

        Encoding {
            ids,
            type_ids,
            tokens,
            attention_mask,
        }
    }

    /// Wraps the sequence as `begin sequence end`.
    pub(crate) fn post_tokenize(&self, sequence: Vec<Token<N>>) -> Encoding<N> {
        let tokens = iter::once(special(&self.special.begin))
            .chain(sequence)
            .chain(iter::once(special(&self.special.end)))
            .collect::<Vec<_>>();
        let type_ids = self.type_ids.then(|| vec![N::zero(); tokens.len()]);

        self.collect(tokens, type_ids)
    }

    /// Wraps the pair as `begin first end second end` for Bert models and as
    /// `begin first end end second end` for MPNet models.
    ///
    /// The type ids are zero up to and including the separators after the first sequence and one
    /// afterwards.
    pub(crate) fn post_tokenize_pair(
        &self,
        first: Vec<Token<N>>,
        second: Vec<Token<N>>,
    ) -> Encoding<N> {
        let separators = self.family.pair_separators();
        let first = iter::once(special(&self.special.begin))
            .chain(first)
            .chain(iter::repeat_with(|| special(&self.special.end)).take(separators))
            .collect::<Vec<_>>();
        let second = second
            .into_iter()
            .chain(iter::once(special(&self.special.end)))
            .collect::<Vec<_>>();
        let type_ids = self.type_ids.then(|| {
            iter::repeat(N::zero())
                .take(first.len())
                .chain(iter::repeat(N::one()).take(second.len()))
                .collect()
        });

        self.collect(first.into_iter().chain(second).collect(), type_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Vocab;

    fn post_tokenizer(family: Family, type_ids: bool) -> PostTokenizer<u32> {
        let vocab = [
            ("[CLS]", 1),
            ("[SEP]", 2),
            ("[PAD]", 0),
            ("[UNK]", 3),
            ("<s>", 1),
            ("</s>", 2),
            ("<pad>", 0),
            ("<unk>", 3),
        ]
        .iter()
        .map(|(word, id)| (word.to_string(), *id))
        .collect::<Vocab<u32>>();

        PostTokenizer {
            family,
            special: SpecialTokens::resolve(&vocab, family, None).unwrap(),
            type_ids,
        }
    }

    fn tokens(ids: &[u32]) -> Vec<Token<u32>> {
        ids.iter()
            .map(|id| Token {
                id: *id,
                value: id.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_single() {
        let encoding = post_tokenizer(Family::Bert, true).post_tokenize(tokens(&[5, 6, 7]));
        assert_eq!(encoding.ids(), [1, 5, 6, 7, 2]);
        assert_eq!(encoding.attention_mask(), [1, 1, 1, 1, 1]);
        assert_eq!(encoding.type_ids().unwrap(), [0, 0, 0, 0, 0]);
        assert_eq!(encoding.tokens()[0], "[CLS]");
        assert_eq!(encoding.tokens()[4], "[SEP]");
    }

    #[test]
    fn test_single_without_type_ids() {
        let encoding = post_tokenizer(Family::MpNet, false).post_tokenize(tokens(&[5]));
        assert_eq!(encoding.ids(), [1, 5, 2]);
        assert!(encoding.type_ids().is_none());
        assert_eq!(encoding.tokens(), ["<s>", "5", "</s>"]);
    }

    #[test]
    fn test_pair_bert() {
        let encoding =
            post_tokenizer(Family::Bert, true).post_tokenize_pair(tokens(&[5, 6]), tokens(&[7]));
        assert_eq!(encoding.ids(), [1, 5, 6, 2, 7, 2]);
        assert_eq!(encoding.type_ids().unwrap(), [0, 0, 0, 0, 1, 1]);
        assert_eq!(encoding.attention_mask(), [1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_pair_mpnet() {
        let encoding =
            post_tokenizer(Family::MpNet, false).post_tokenize_pair(tokens(&[5]), tokens(&[7, 8]));
        assert_eq!(encoding.ids(), [1, 5, 2, 2, 7, 8, 2]);
        assert!(encoding.type_ids().is_none());
        assert_eq!(encoding.len(), 3 + post_tokenizer(Family::MpNet, false).added_tokens(true));
    }
}

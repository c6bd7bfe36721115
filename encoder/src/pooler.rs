use derive_more::{Deref, From};
use float_cmp::{ApproxEq, F32Margin};
use ndarray::{
    s,
    Array,
    Array1,
    ArrayBase,
    ArrayView2,
    ArrayView3,
    Axis,
    Data,
    Dimension,
    Ix1,
    Ix2,
    Zip,
};
use serde::{Deserialize, Serialize};

/// A d-dimensional sequence embedding.
#[derive(Clone, Debug, Deref, From, Serialize, Deserialize)]
pub struct Embedding<D>(Array<f32, D>)
where
    D: Dimension;

/// A 1-dimensional sequence embedding.
pub type Embedding1 = Embedding<Ix1>;

/// A 2-dimensional sequence embedding.
pub type Embedding2 = Embedding<Ix2>;

impl<D> Embedding<D>
where
    D: Dimension,
{
    /// Unwraps the embedding into its array.
    pub fn into_inner(self) -> Array<f32, D> {
        self.0
    }
}

impl<S, D> PartialEq<ArrayBase<S, D>> for Embedding<D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    fn eq(&self, other: &ArrayBase<S, D>) -> bool {
        if self.shape() != other.shape() {
            return false;
        }

        let margin = F32Margin::default();
        Zip::from(&self.0)
            .and(other)
            .all(|this, other| (*this).approx_eq(*other, margin))
    }
}

impl<S, D> PartialEq<Embedding<D>> for ArrayBase<S, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    fn eq(&self, other: &Embedding<D>) -> bool {
        other.eq(self)
    }
}

impl<D> PartialEq for Embedding<D>
where
    D: Dimension,
{
    fn eq(&self, other: &Self) -> bool {
        self.eq(&other.0)
    }
}

/// The available pooling strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pooler {
    /// Pools over the first token (`[CLS]` or `<s>`).
    First,
    /// Pools over the average of the active tokens.
    Average,
}

impl Default for Pooler {
    fn default() -> Self {
        Self::Average
    }
}

impl Pooler {
    /// Pools the hidden states of shape `(batch_size, token_size, hidden_size)` into one embedding
    /// per sequence.
    pub fn pool(
        self,
        hidden: ArrayView3<f32>,
        attention_mask: Option<ArrayView2<i64>>,
    ) -> Vec<Array1<f32>> {
        match self {
            Self::First => FirstPooler.pool(hidden),
            Self::Average => AveragePooler.pool(hidden, attention_mask),
        }
    }
}

/// A first token pooling strategy.
///
/// The prediction is pooled over its first tokens (`[CLS]`).
pub struct FirstPooler;

impl FirstPooler {
    /// Pools the hidden states over their first token.
    pub fn pool(&self, hidden: ArrayView3<f32>) -> Vec<Array1<f32>> {
        hidden
            .outer_iter()
            .map(|sequence| sequence.slice(s![0, ..]).to_owned())
            .collect()
    }
}

/// An average token pooling strategy.
///
/// The prediction is pooled over its averaged tokens.
pub struct AveragePooler;

impl AveragePooler {
    /// Pools the hidden states over their averaged, active tokens.
    ///
    /// Without an attention mask all tokens are averaged, including padding. A sequence without
    /// active tokens is pooled to zeros.
    pub fn pool(
        &self,
        hidden: ArrayView3<f32>,
        attention_mask: Option<ArrayView2<i64>>,
    ) -> Vec<Array1<f32>> {
        let hidden_size = hidden.len_of(Axis(2));
        hidden
            .outer_iter()
            .enumerate()
            .map(|(idx, sequence)| {
                let average = match attention_mask {
                    Some(attention_mask) => {
                        let mask = attention_mask.row(idx).mapv(|mask| mask as f32);
                        let count = mask.sum();
                        (count > 0.).then(|| mask.dot(&sequence) / count)
                    }
                    None => sequence.mean_axis(Axis(0)),
                };
                average.unwrap_or_else(|| Array1::zeros(hidden_size))
            })
            .collect()
    }
}

/// Normalizes the embedding to unit length, unless it is zero.
pub(crate) fn normalize(embedding: Array1<f32>) -> Array1<f32> {
    let norm = embedding.dot(&embedding).sqrt();
    if norm > 0. {
        embedding / norm
    } else {
        embedding
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2, arr3};
    use test_utils::assert_approx_eq;

    use super::*;

    #[test]
    fn test_first() {
        let hidden = arr3(&[[[1., 2., 3.], [4., 5., 6.]], [[7., 8., 9.], [0., 0., 0.]]]);
        let embeddings = Pooler::First.pool(hidden.view(), None);
        assert_approx_eq!(f32, embeddings, [[1., 2., 3.], [7., 8., 9.]]);
    }

    #[test]
    fn test_average() {
        let hidden = arr3(&[[[1., 2., 3.], [4., 5., 6.]]]);

        let mask = arr2(&[[0, 0]]);
        let embeddings = AveragePooler.pool(hidden.view(), Some(mask.view()));
        assert_approx_eq!(f32, embeddings, [[0., 0., 0.]]);

        let mask = arr2(&[[0, 1]]);
        let embeddings = AveragePooler.pool(hidden.view(), Some(mask.view()));
        assert_approx_eq!(f32, embeddings, [[4., 5., 6.]]);

        let mask = arr2(&[[1, 0]]);
        let embeddings = AveragePooler.pool(hidden.view(), Some(mask.view()));
        assert_approx_eq!(f32, embeddings, [[1., 2., 3.]]);

        let mask = arr2(&[[1, 1]]);
        let embeddings = AveragePooler.pool(hidden.view(), Some(mask.view()));
        assert_approx_eq!(f32, embeddings, [[2.5, 3.5, 4.5]]);
    }

    #[test]
    fn test_average_ignores_padding() {
        let hidden = arr3(&[[[1., 2.], [3., 4.], [100., 100.]]]);
        let mask = arr2(&[[1, 1, 0]]);
        let embeddings = Pooler::Average.pool(hidden.view(), Some(mask.view()));
        assert_approx_eq!(f32, embeddings[0], [2., 3.]);
    }

    #[test]
    fn test_average_per_sequence() {
        let hidden = arr3(&[
            [[1., 1.], [3., 3.], [5., 5.]],
            [[2., 0.], [0., 2.], [9., 9.]],
        ]);
        let mask = arr2(&[[1, 1, 1], [1, 1, 0]]);
        let embeddings = Pooler::Average.pool(hidden.view(), Some(mask.view()));
        assert_approx_eq!(f32, embeddings[0], [3., 3.]);
        assert_approx_eq!(f32, embeddings[1], [1., 1.]);
    }

    #[test]
    fn test_average_without_mask() {
        let hidden = arr3(&[[[1., 2.], [3., 4.], [5., 6.]]]);
        let embeddings = AveragePooler.pool(hidden.view(), None);
        assert_approx_eq!(f32, embeddings[0], [3., 4.]);
    }

    #[test]
    fn test_normalize() {
        assert_approx_eq!(f32, normalize(arr1(&[3., 4.])), [0.6, 0.8]);
        assert_approx_eq!(f32, normalize(arr1(&[0., 0.])), [0., 0.]);

        let embedding = normalize(arr1(&[1., -2., 0.5, 7.]));
        assert_approx_eq!(f32, embedding.dot(&embedding), 1., epsilon = 1e-6);
    }

    #[test]
    fn test_embedding_eq() {
        let embedding = Embedding1::from(arr1(&[1., 2.]));
        assert_eq!(embedding, arr1(&[1., 2.]));
        assert_eq!(embedding, Embedding1::from(arr1(&[1., 2.])));
        assert_ne!(embedding, arr1(&[1., 2., 3.]));
    }
}

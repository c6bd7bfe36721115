use ndarray::ArrayD;

use crate::session::InferenceError;

/// Maps the logit to a relevance score in `[0, 1]`.
pub(crate) fn sigmoid(logit: f32) -> f32 {
    1. / (1. + (-logit).exp())
}

/// Extracts the relevance scores from logits of shape `(batch_size, 1)` or `(batch_size,)`.
pub(crate) fn scores(logits: ArrayD<f32>, batch_size: usize) -> Result<Vec<f32>, InferenceError> {
    match logits.shape() {
        [len] | [len, 1] if *len == batch_size => Ok(logits.iter().copied().map(sigmoid).collect()),
        shape => Err(InferenceError::Output(format!("{:?}", shape))),
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2, arr3};
    use test_utils::assert_approx_eq;

    use super::*;

    #[test]
    fn test_sigmoid() {
        assert_approx_eq!(f32, sigmoid(0.), 0.5);
        assert_approx_eq!(f32, sigmoid(2.), 0.880797, epsilon = 1e-6);
        assert_approx_eq!(f32, sigmoid(-2.), 0.119203, epsilon = 1e-6);
        assert!(sigmoid(100.) <= 1.);
        assert!(sigmoid(-100.) >= 0.);
    }

    #[test]
    fn test_scores() {
        let relevance = scores(arr2(&[[0.], [2.]]).into_dyn(), 2).unwrap();
        assert_approx_eq!(f32, relevance, [0.5, 0.880797], epsilon = 1e-6);

        let relevance = scores(arr1(&[0., -2.]).into_dyn(), 2).unwrap();
        assert_approx_eq!(f32, relevance, [0.5, 0.119203], epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_shape() {
        assert!(matches!(
            scores(arr2(&[[0., 1.]]).into_dyn(), 1),
            Err(InferenceError::Output(_)),
        ));
        assert!(matches!(
            scores(arr1(&[0., 1.]).into_dyn(), 3),
            Err(InferenceError::Output(_)),
        ));
        assert!(matches!(
            scores(arr3(&[[[0.]]]).into_dyn(), 1),
            Err(InferenceError::Output(shape)) if shape == "[1, 1, 1]",
        ));
    }
}

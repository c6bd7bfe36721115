use float_cmp::{ApproxEq, F32Margin};
use ndarray::{ArrayBase, Data, Dimension, IntoDimension};

/// Compares two "things" with approximate equality.
///
/// # Examples
///
/// This can be used to compare two floating point numbers:
///
/// ```
/// use test_utils::assert_approx_eq;
/// assert_approx_eq!(f32, 0.15039155, 0.1503916, ulps = 3);
/// ```
///
/// Or nested containers and ndarray arrays of such:
///
/// ```
/// use ndarray::arr2;
/// use test_utils::assert_approx_eq;
/// assert_approx_eq!(f32, &[[1.0, 2.], [3., 4.]], arr2(&[[1.0, 2.], [3., 4.]]));
/// ```
///
/// The number of `ulps` defaults to `2` and the `epsilon` defaults to `0`. Two NaN values are
/// considered equal.
#[macro_export]
macro_rules! assert_approx_eq {
    (f32, $left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!(f32, $left, $right, epsilon = 0., ulps = 2)
    };
    (f32, $left:expr, $right:expr, ulps = $ulps:expr $(,)?) => {
        $crate::assert_approx_eq!(f32, $left, $right, epsilon = 0., ulps = $ulps)
    };
    (f32, $left:expr, $right:expr, epsilon = $epsilon:expr $(,)?) => {
        $crate::assert_approx_eq!(f32, $left, $right, epsilon = $epsilon, ulps = 2)
    };
    (f32, $left:expr, $right:expr, epsilon = $epsilon:expr, ulps = $ulps:expr $(,)?) => {
        $crate::assert_leaves_approx_eq(&$left, &$right, $epsilon, $ulps)
    };
}

/// Flattens a "thing" into its indexed `f32` leaves in logical order.
///
/// Only meant for the [`assert_approx_eq!`] macro.
pub trait Leaves {
    /// Pushes all leaves, where each index is prefixed by the `prefix`.
    fn leaves(&self, prefix: Vec<usize>, leaves: &mut Vec<(Vec<usize>, f32)>);
}

impl Leaves for f32 {
    fn leaves(&self, prefix: Vec<usize>, leaves: &mut Vec<(Vec<usize>, f32)>) {
        leaves.push((prefix, *self));
    }
}

impl<T> Leaves for &T
where
    T: Leaves + ?Sized,
{
    fn leaves(&self, prefix: Vec<usize>, leaves: &mut Vec<(Vec<usize>, f32)>) {
        (**self).leaves(prefix, leaves);
    }
}

impl<T> Leaves for [T]
where
    T: Leaves,
{
    fn leaves(&self, prefix: Vec<usize>, leaves: &mut Vec<(Vec<usize>, f32)>) {
        for (idx, element) in self.iter().enumerate() {
            let mut prefix = prefix.clone();
            prefix.push(idx);
            element.leaves(prefix, leaves);
        }
    }
}

impl<T, const N: usize> Leaves for [T; N]
where
    T: Leaves,
{
    fn leaves(&self, prefix: Vec<usize>, leaves: &mut Vec<(Vec<usize>, f32)>) {
        self[..].leaves(prefix, leaves);
    }
}

impl<T> Leaves for Vec<T>
where
    T: Leaves,
{
    fn leaves(&self, prefix: Vec<usize>, leaves: &mut Vec<(Vec<usize>, f32)>) {
        self.as_slice().leaves(prefix, leaves);
    }
}

impl<S, D> Leaves for ArrayBase<S, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    fn leaves(&self, prefix: Vec<usize>, leaves: &mut Vec<(Vec<usize>, f32)>) {
        for (idx, element) in self.indexed_iter() {
            let mut prefix = prefix.clone();
            prefix.extend(idx.into_dimension().as_array_view().iter());
            leaves.push((prefix, *element));
        }
    }
}

/// Asserts the approximate equality of all leaves.
///
/// Only meant for the [`assert_approx_eq!`] macro.
#[track_caller]
pub fn assert_leaves_approx_eq(left: &impl Leaves, right: &impl Leaves, epsilon: f32, ulps: i32) {
    let mut lefts = Vec::new();
    left.leaves(Vec::new(), &mut lefts);
    let mut rights = Vec::new();
    right.leaves(Vec::new(), &mut rights);

    for ((lidx, lv), (ridx, rv)) in lefts.iter().zip(rights.iter()) {
        assert_eq!(
            lidx, ridx,
            "dimensionality mismatch in logical order: {:?} != {:?}",
            lidx, ridx,
        );
        if !(lv.is_nan() && rv.is_nan()) {
            assert!(
                lv.approx_eq(*rv, F32Margin { epsilon, ulps }),
                "approximated equal assertion failed (ulps={:?}, epsilon={:?}) at index {:?}: {:?} == {:?}",
                ulps,
                epsilon,
                lidx,
                lv,
                rv,
            );
        }
    }
    if let Some((idx, _)) = lefts.get(rights.len()) {
        panic!("left input is longer starting from index {:?}", idx);
    }
    if let Some((idx, _)) = rights.get(lefts.len()) {
        panic!("right input is longer starting from index {:?}", idx);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::catch_unwind;

    use ndarray::{arr1, arr2, arr3};

    #[test]
    fn test_float() {
        assert_approx_eq!(f32, 0.15039155, 0.1503916, ulps = 3);
        catch_unwind(|| assert_approx_eq!(f32, 0.15039155, 0.1503916, ulps = 2)).unwrap_err();
    }

    #[test]
    fn test_nested() {
        assert_approx_eq!(f32, &[0.25, 1.25], arr1(&[0.25, 1.25]));
        assert_approx_eq!(
            f32,
            vec![[0.25, 1.25], [0.0, 0.125]],
            arr2(&[[0.25, 1.25], [0.0, 0.125]]),
        );
    }

    #[test]
    #[should_panic(expected = "at index [0, 1, 2]")]
    fn test_mismatch_multi_dimensional() {
        assert_approx_eq!(
            f32,
            &[[[0.25, 1.25, 0.], [0.0, 0.125, 0.]]],
            arr3(&[[[0.25, 1.25, 0.], [0.0, 0.125, 1.]]]),
        );
    }

    #[test]
    fn test_nan() {
        assert_approx_eq!(f32, [3.1, f32::NAN, 1.0], [3.1, f32::NAN, 1.0]);
    }

    #[test]
    #[should_panic(expected = "[0, 2]")]
    fn test_different_length() {
        assert_approx_eq!(f32, &[[1., 2., 3.]], &[[1., 2.]]);
    }

    #[test]
    fn test_epsilon() {
        assert_approx_eq!(f32, 0.125, 0.625, epsilon = 0.5);
        catch_unwind(|| assert_approx_eq!(f32, 0.125, 0.625, epsilon = 0.49)).unwrap_err();
    }
}

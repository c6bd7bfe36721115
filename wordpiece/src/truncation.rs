use displaydoc::Display;
use thiserror::Error;

use crate::vocab::Family;

/// A truncation strategy.
#[derive(Clone, Debug)]
pub struct Truncation(Truncations);

/// The potential errors of the truncation strategy.
#[derive(Debug, Display, Error)]
pub enum TruncationError {
    /// The length {0} must be at least the number of special tokens of a pair {1}
    Len(usize, usize),
}

/// The available truncation strategies.
#[derive(Clone, Debug)]
enum Truncations {
    /// No truncation.
    None,
    /// Truncation to a fixed length including the special tokens.
    Fixed { len: usize },
}

impl Default for Truncation {
    fn default() -> Self {
        Self::none()
    }
}

impl Truncation {
    /// Creates an inert truncation strategy.
    pub fn none() -> Self {
        Self(Truncations::None)
    }

    /// Creates a fixed-length truncation strategy.
    ///
    /// The length includes the special tokens.
    pub fn fixed(len: usize) -> Self {
        Self(Truncations::Fixed { len })
    }

    /// Gets the fixed length, if any.
    pub fn fixed_len(&self) -> Option<usize> {
        match self.0 {
            Truncations::None => None,
            Truncations::Fixed { len } => Some(len),
        }
    }

    /// Validates this strategy.
    pub(crate) fn validate(self, family: Family) -> Result<Self, TruncationError> {
        match self.0 {
            Truncations::Fixed { len } if len < family.added_tokens(true) => {
                Err(TruncationError::Len(len, family.added_tokens(true)))
            }
            _ => Ok(self),
        }
    }

    /// Truncates the content tokens of a single sequence.
    pub(crate) fn truncate<T>(&self, mut tokens: Vec<T>, added_tokens: usize) -> Vec<T> {
        if let Truncations::Fixed { len } = self.0 {
            tokens.truncate(len.saturating_sub(added_tokens));
        }
        tokens
    }

    /// Truncates the content tokens of a pair of sequences by the longest first policy.
    pub(crate) fn truncate_pair<T>(
        &self,
        mut first: Vec<T>,
        mut second: Vec<T>,
        added_tokens: usize,
    ) -> (Vec<T>, Vec<T>) {
        if let Truncations::Fixed { len } = self.0 {
            let (first_len, second_len) =
                longest_first(first.len(), second.len(), len.saturating_sub(added_tokens));
            first.truncate(first_len);
            second.truncate(second_len);
        }
        (first, second)
    }
}

/// Computes the lengths of a pair within the budget.
///
/// Equivalent to removing tokens one by one from the longer sequence, where ties remove from the
/// second sequence.
fn longest_first(first: usize, second: usize, budget: usize) -> (usize, usize) {
    if first + second <= budget {
        (first, second)
    } else if first <= budget / 2 {
        (first, budget - first)
    } else if second <= budget / 2 {
        (budget - second, second)
    } else {
        (budget - budget / 2, budget / 2)
    }
}

use displaydoc::Display;
use num_traits::Num;
use thiserror::Error;

use crate::{encoding::Encoding, vocab::SpecialToken};

/// A padding strategy.
#[derive(Clone, Debug)]
pub struct Padding(Paddings);

/// The potential errors of the padding strategy.
#[derive(Debug, Display, Error)]
pub enum PaddingError {
    /// The padding length must be greater than zero
    Len,
}

/// The available padding strategies.
#[derive(Clone, Debug)]
enum Paddings {
    /// No padding.
    None,
    /// Padding to a fixed length.
    Fixed { len: usize },
}

impl Default for Padding {
    fn default() -> Self {
        Self::none()
    }
}

impl Padding {
    /// Creates an inert padding strategy.
    pub fn none() -> Self {
        Self(Paddings::None)
    }

    /// Creates a fixed-length padding strategy.
    pub fn fixed(len: usize) -> Self {
        Self(Paddings::Fixed { len })
    }

    /// Gets the fixed length, if any.
    pub fn fixed_len(&self) -> Option<usize> {
        match self.0 {
            Paddings::None => None,
            Paddings::Fixed { len } => Some(len),
        }
    }

    /// Validates this strategy.
    pub(crate) fn validate(self) -> Result<Self, PaddingError> {
        match self.0 {
            Paddings::Fixed { len: 0 } => Err(PaddingError::Len),
            _ => Ok(self),
        }
    }

    /// Pads the encoding with the padding token.
    pub(crate) fn pad<N>(&self, encoding: Encoding<N>, pad: &SpecialToken<N>) -> Encoding<N>
    where
        N: Num + Copy,
    {
        match self.0 {
            Paddings::None => encoding,
            Paddings::Fixed { len } => encoding.pad(len, pad),
        }
    }
}

//! Shared helpers for the tests of the workspace.

mod approx_eq;
pub mod fixture;
pub mod onnx;

#[doc(hidden)]
pub use crate::approx_eq::{assert_leaves_approx_eq, Leaves};

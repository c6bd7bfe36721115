use std::{io::Read, ops::Range};

use displaydoc::Display;
use log::debug;
#[cfg(test)]
use mockall::automock;
use ndarray::{concatenate, s, Array2, ArrayD, ArrayView2, Axis, ShapeError, Slice};
use thiserror::Error;
use tract_onnx::prelude::{
    Datum,
    Framework,
    InferenceFact,
    InferenceModelExt,
    TVec,
    Tensor,
    TractError,
    TypedModel,
    TypedSimplePlan,
};

/// The potential errors of running a model.
#[derive(Debug, Display, Error)]
pub enum InferenceError {
    /// Failed to run a tract operation: {0}
    Tract(#[from] TractError),
    /// The model expects {0} inputs, but {1} were supplied
    Inputs(usize, usize),
    /// The model inputs have the invalid shape {0}
    Shape(String),
    /// The model output has the invalid shape {0}
    Output(String),
    /// The model output has the hidden size {1}, but the configuration declares {0}
    HiddenSize(usize, usize),
}

/// The potential errors of acquiring the resources of a model run.
#[derive(Debug, Display, Error)]
pub enum ResourceError {
    /// Failed to allocate a tensor: {0}
    Tensor(#[from] ShapeError),
}

/// The potential errors of a [`Session`].
#[derive(Debug, Display, Error)]
pub enum SessionError {
    /// {0}
    Inference(#[from] InferenceError),
    /// {0}
    Resource(#[from] ResourceError),
}

impl From<TractError> for SessionError {
    fn from(error: TractError) -> Self {
        InferenceError::Tract(error).into()
    }
}

/// A loaded neural network.
///
/// The inputs are token ids, attention masks and token type ids of shape `(batch_size,
/// token_size)`, the first output is either the hidden states of shape `(batch_size, token_size,
/// hidden_size)` or the logits of shape `(batch_size, 1)`.
#[cfg_attr(test, automock)]
pub trait Session {
    /// Gets the names of the declared inputs in declaration order.
    fn input_names(&self) -> Vec<String>;

    /// Runs the network on the inputs, which are given positionally in declaration order.
    fn run(&self, inputs: Vec<Array2<i64>>) -> Result<ArrayD<f32>, SessionError>;
}

/// A tract onnx session.
///
/// The execution plan has concrete input shapes of `(batch_size, token_size)`. Larger inputs are
/// run in chunks of the batch size and the last chunk is padded with zero rows, whose outputs are
/// discarded.
pub struct TractSession {
    plan: TypedSimplePlan<TypedModel>,
    inputs: Vec<String>,
    batch_size: usize,
    token_size: usize,
}

impl TractSession {
    /// Creates a session from an onnx model.
    ///
    /// Requires the batch and token size of the model inputs. A batch size of zero is treated as
    /// one.
    pub fn new(
        mut model: impl Read,
        batch_size: usize,
        token_size: usize,
    ) -> Result<Self, InferenceError> {
        let batch_size = batch_size.max(1);
        let model = tract_onnx::onnx().model_for_read(&mut model)?;
        let inputs = model
            .input_outlets()?
            .iter()
            .map(|outlet| model.node(outlet.node).name.clone())
            .collect::<Vec<_>>();

        debug!(
            "compiling the execution plan for batch size {} and token size {}",
            batch_size, token_size,
        );
        let input_fact = InferenceFact::dt_shape(i64::datum_type(), &[batch_size, token_size]);
        let plan = (0..inputs.len())
            .try_fold(model, |model, input| model.with_input_fact(input, input_fact.clone()))?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self {
            plan,
            inputs,
            batch_size,
            token_size,
        })
    }

    /// Gets the batch size of the execution plan.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Gets the token size of the execution plan.
    pub fn token_size(&self) -> usize {
        self.token_size
    }

    /// Pads the rows of a chunk with zeros up to the batch size.
    fn pad(&self, chunk: ArrayView2<i64>) -> Tensor {
        let mut padded = Array2::<i64>::zeros((self.batch_size, self.token_size));
        padded.slice_mut(s![..chunk.nrows(), ..]).assign(&chunk);
        padded.into()
    }

    /// Runs the plan on a chunk of at most the batch size rows.
    fn run_chunk(
        &self,
        inputs: &[Array2<i64>],
        rows: Range<usize>,
    ) -> Result<ArrayD<f32>, SessionError> {
        let len = rows.len();
        let inputs = inputs
            .iter()
            .map(|input| self.pad(input.slice(s![rows.clone(), ..])))
            .collect::<TVec<_>>();
        let outputs = self.plan.run(inputs)?;
        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::Output("[]".into()))?
            .to_array_view::<f32>()?;
        if output.ndim() == 0 || output.len_of(Axis(0)) != self.batch_size {
            return Err(InferenceError::Output(format!("{:?}", output.shape())).into());
        }

        Ok(output.slice_axis(Axis(0), Slice::from(..len)).to_owned())
    }
}

impl Session for TractSession {
    fn input_names(&self) -> Vec<String> {
        self.inputs.clone()
    }

    fn run(&self, inputs: Vec<Array2<i64>>) -> Result<ArrayD<f32>, SessionError> {
        if inputs.len() != self.inputs.len() {
            return Err(InferenceError::Inputs(self.inputs.len(), inputs.len()).into());
        }
        let rows = inputs.first().map_or(0, Array2::nrows);
        if let Some(input) = inputs.iter().find(|input| input.dim() != (rows, self.token_size)) {
            return Err(InferenceError::Shape(format!("{:?}", input.shape())).into());
        }

        let outputs = (0..rows)
            .step_by(self.batch_size)
            .map(|start| self.run_chunk(&inputs, start..rows.min(start + self.batch_size)))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = outputs.iter().map(ArrayD::view).collect::<Vec<_>>();

        concatenate(Axis(0), &outputs)
            .map_err(ResourceError::from)
            .map_err(Into::into)
    }
}

use ndarray::{Array2, ArrayD};
use wordpiece::Encoding;

use crate::{
    config::ConfigurationError,
    session::{ResourceError, Session, SessionError},
};

/// The input architecture of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Architecture {
    /// The model distinguishes the spans of a pair by token type ids.
    DualSpan,
    /// The model has no token type ids.
    SingleSpan,
}

/// An input slot of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Ids,
    Mask,
    TypeIds,
}

impl Slot {
    fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        if name.contains("input_ids") {
            Ok(Self::Ids)
        } else if name.contains("attention_mask") {
            Ok(Self::Mask)
        } else if name.contains("token_type") {
            Ok(Self::TypeIds)
        } else {
            Err(ConfigurationError::Input(name.into()))
        }
    }

    /// Collects the slot of the encodings into a `(batch_size, token_size)` tensor.
    fn tensor(self, encodings: &[Encoding<i64>]) -> Result<Array2<i64>, ResourceError> {
        let token_size = encodings.first().map_or(0, Encoding::len);
        let values = encodings
            .iter()
            .flat_map(|encoding| match self {
                Self::Ids => encoding.ids().to_vec(),
                Self::Mask => encoding.attention_mask().to_vec(),
                Self::TypeIds => encoding
                    .type_ids()
                    .map_or_else(|| vec![0; encoding.len()], <[i64]>::to_vec),
            })
            .collect();

        Array2::from_shape_vec((encodings.len(), token_size), values).map_err(Into::into)
    }
}

/// Collects the attention masks of the encodings into a `(batch_size, token_size)` tensor.
pub(crate) fn attention_mask(encodings: &[Encoding<i64>]) -> Result<Array2<i64>, ResourceError> {
    Slot::Mask.tensor(encodings)
}

/// Feeds encodings to a session according to the inputs it declares.
pub(crate) struct Adapter {
    session: Box<dyn Session + Send + Sync>,
    slots: Vec<Slot>,
    architecture: Architecture,
}

impl Adapter {
    /// Maps the declared inputs of the session to their slots.
    ///
    /// # Errors
    /// Fails if an input is unsupported or if the token ids are not declared.
    pub(crate) fn new(session: Box<dyn Session + Send + Sync>) -> Result<Self, ConfigurationError> {
        let slots = session
            .input_names()
            .iter()
            .map(|name| Slot::from_name(name))
            .collect::<Result<Vec<_>, _>>()?;
        if !slots.contains(&Slot::Ids) {
            return Err(ConfigurationError::MissingIds);
        }
        let architecture = if slots.contains(&Slot::TypeIds) {
            Architecture::DualSpan
        } else {
            Architecture::SingleSpan
        };

        Ok(Self {
            session,
            slots,
            architecture,
        })
    }

    pub(crate) fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Runs the session on the encodings, which must be of equal length.
    pub(crate) fn run(&self, encodings: &[Encoding<i64>]) -> Result<ArrayD<f32>, SessionError> {
        let inputs = self
            .slots
            .iter()
            .map(|slot| slot.tensor(encodings))
            .collect::<Result<Vec<_>, _>>()?;
        self.session.run(inputs)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;
    use ndarray::{arr2, ArrayD, IxDyn};
    use wordpiece::{Builder, Padding, Truncation};

    use super::*;
    use crate::{
        session::{InferenceError, MockSession},
        tests::FakeSession,
    };

    fn encodings(type_ids: bool) -> Vec<Encoding<i64>> {
        let tokenizer = Builder::new(
            ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "a", "b"]
                .iter()
                .enumerate()
                .map(|(id, token)| (token.to_string(), id as i64))
                .collect(),
        )
        .with_type_ids(type_ids)
        .with_truncation(Truncation::fixed(5))
        .with_padding(Padding::fixed(5))
        .build()
        .unwrap();
        vec![tokenizer.encode("a b"), tokenizer.encode_pair("a", "b")]
    }

    #[test]
    fn test_architecture() {
        let adapter = Adapter::new(Box::new(FakeSession::embedder(&[
            "input_ids",
            "attention_mask",
            "token_type_ids",
        ])))
        .unwrap();
        assert_eq!(adapter.architecture(), Architecture::DualSpan);

        let session = FakeSession::embedder(&["input_ids", "attention_mask"]);
        let adapter = Adapter::new(Box::new(session)).unwrap();
        assert_eq!(adapter.architecture(), Architecture::SingleSpan);
    }

    #[test]
    fn test_unsupported_inputs() {
        assert!(matches!(
            Adapter::new(Box::new(FakeSession::embedder(&["input_ids", "position_ids"]))),
            Err(ConfigurationError::Input(name)) if name == "position_ids",
        ));
        assert!(matches!(
            Adapter::new(Box::new(FakeSession::embedder(&["attention_mask"]))),
            Err(ConfigurationError::MissingIds),
        ));
    }

    #[test]
    fn test_declared_order() {
        let session = FakeSession::embedder(&["attention_mask", "input_ids"]);
        let received = session.received();
        let adapter = Adapter::new(Box::new(session)).unwrap();
        adapter.run(&encodings(false)).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].len(), 2);
        assert_eq!(received[0][0], arr2(&[[1, 1, 1, 1, 0], [1, 1, 1, 1, 1]]));
        assert_eq!(received[0][1], arr2(&[[2, 4, 5, 3, 0], [2, 4, 3, 5, 3]]));
    }

    #[test]
    fn test_single_span_gets_no_type_ids() {
        let session = FakeSession::embedder(&["input_ids", "attention_mask"]);
        let received = session.received();
        let adapter = Adapter::new(Box::new(session)).unwrap();
        adapter.run(&encodings(true)).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received[0].len(), 2);
    }

    #[test]
    fn test_dual_span_type_ids() {
        let session = FakeSession::embedder(&["input_ids", "token_type_ids", "attention_mask"]);
        let received = session.received();
        let adapter = Adapter::new(Box::new(session)).unwrap();

        adapter.run(&encodings(true)).unwrap();
        adapter.run(&encodings(false)).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received[0][1], arr2(&[[0, 0, 0, 0, 0], [0, 0, 0, 1, 1]]));
        // synthesized if the encodings carry none
        assert_eq!(received[1][1], arr2(&[[0, 0, 0, 0, 0], [0, 0, 0, 0, 0]]));
    }

    #[test]
    fn test_session_error() {
        let mut session = MockSession::new();
        session
            .expect_input_names()
            .return_const(vec!["input_ids".to_string()]);
        session
            .expect_run()
            .with(always())
            .times(1)
            .returning(|inputs| Err(InferenceError::Inputs(2, inputs.len()).into()));
        let adapter = Adapter::new(Box::new(session)).unwrap();

        assert!(matches!(
            adapter.run(&encodings(false)),
            Err(SessionError::Inference(InferenceError::Inputs(2, 1))),
        ));
    }

    #[test]
    fn test_ragged_encodings() {
        let mut session = MockSession::new();
        session
            .expect_input_names()
            .return_const(vec!["input_ids".to_string()]);
        session
            .expect_run()
            .never()
            .returning(|_| Ok(ArrayD::zeros(IxDyn(&[0]))));
        let adapter = Adapter::new(Box::new(session)).unwrap();

        let mut encodings = encodings(false);
        let short = Builder::new(
            ["[PAD]", "[UNK]", "[CLS]", "[SEP]"]
                .iter()
                .enumerate()
                .map(|(id, token)| (token.to_string(), id as i64))
                .collect(),
        )
        .build()
        .unwrap()
        .encode("");
        encodings.push(short);

        assert!(matches!(
            adapter.run(&encodings),
            Err(SessionError::Resource(ResourceError::Tensor(_))),
        ));
    }
}

//! A minimal onnx graph to exercise the tract session without real model assets.

use std::{io::Result, path::Path};

use prost::Message;
use tract_onnx::pb::{
    attribute_proto::AttributeType,
    tensor_proto::DataType,
    tensor_shape_proto::{dimension::Value as DimensionValue, Dimension},
    type_proto::{Tensor, Value as TypeValue},
    AttributeProto,
    GraphProto,
    ModelProto,
    NodeProto,
    OperatorSetIdProto,
    TensorShapeProto,
    TypeProto,
    ValueInfoProto,
};

use crate::fixture::{config_json, write_json};

/// Declares a tensor with symbolic dimensions.
fn value_info(name: &str, data_type: DataType, rank: usize) -> ValueInfoProto {
    let dim = (0..rank)
        .map(|axis| Dimension {
            value: Some(DimensionValue::DimParam(format!("d{}", axis))),
            ..Dimension::default()
        })
        .collect();

    ValueInfoProto {
        name: name.into(),
        r#type: Some(TypeProto {
            value: Some(TypeValue::TensorType(Tensor {
                elem_type: data_type as i32,
                shape: Some(TensorShapeProto { dim }),
            })),
            ..TypeProto::default()
        }),
        ..ValueInfoProto::default()
    }
}

fn node(op_type: &str, inputs: &[&str], output: &str, attribute: Vec<AttributeProto>) -> NodeProto {
    NodeProto {
        input: inputs.iter().map(ToString::to_string).collect(),
        output: vec![output.into()],
        name: output.into(),
        op_type: op_type.into(),
        attribute,
        ..NodeProto::default()
    }
}

/// Encodes an onnx model with the inputs `input_ids` and `attention_mask` of shape
/// `(batch_size, token_size)`.
///
/// The output of shape `(batch_size, token_size, 1)` is the product of the ids and the mask cast to
/// `f32`, i.e. a hidden size of one.
pub fn masked_ids_model() -> Vec<u8> {
    let cast = AttributeProto {
        name: "to".into(),
        r#type: AttributeType::Int as i32,
        i: DataType::Float as i64,
        ..AttributeProto::default()
    };
    let axes = AttributeProto {
        name: "axes".into(),
        r#type: AttributeType::Ints as i32,
        ints: vec![2],
        ..AttributeProto::default()
    };
    let graph = GraphProto {
        node: vec![
            node("Mul", &["input_ids", "attention_mask"], "masked_ids", vec![]),
            node("Cast", &["masked_ids"], "hidden", vec![cast]),
            node("Unsqueeze", &["hidden"], "last_hidden_state", vec![axes]),
        ],
        name: "masked_ids".into(),
        input: vec![
            value_info("input_ids", DataType::Int64, 2),
            value_info("attention_mask", DataType::Int64, 2),
        ],
        output: vec![value_info("last_hidden_state", DataType::Float, 3)],
        ..GraphProto::default()
    };

    ModelProto {
        ir_version: 7,
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 11,
        }],
        graph: Some(graph),
        ..ModelProto::default()
    }
    .encode_to_vec()
}

/// Writes the masked ids model as `model.onnx` into a model directory and overwrites the
/// `config.json` with a Bert configuration of hidden size one.
pub fn write_masked_ids_model(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    write_json(dir.join("config.json"), &config_json("bert", 1, 512))?;
    std::fs::write(dir.join("model.onnx"), masked_ids_model())
}

//! protobuf Struct <-> JSON bridging
//!
//! The function runner protocol carries resources as `google.protobuf.Struct`
//! documents. Everything above the wire works on `serde_json::Value`, so this
//! module converts losslessly between the two representations. Protobuf has a
//! single number kind (f64); whole numbers are restored to JSON integers on
//! the way back so documents survive a round trip unchanged.

use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Value};
use serde_json::Value as JsonValue;

use crate::Error;

/// Convert a JSON document into a protobuf Struct
///
/// The document must be a JSON object; anything else is a serialization
/// error, since the protocol only carries object-shaped resources.
pub fn to_struct(value: &JsonValue) -> Result<Struct, Error> {
    match value {
        JsonValue::Object(map) => Ok(Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), to_proto_value(v)))
                .collect(),
        }),
        other => Err(Error::serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Convert a protobuf Struct into a JSON object
pub fn from_struct(s: &Struct) -> JsonValue {
    JsonValue::Object(
        s.fields
            .iter()
            .map(|(k, v)| (k.clone(), from_proto_value(v)))
            .collect(),
    )
}

fn to_proto_value(value: &JsonValue) -> Value {
    let kind = match value {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(b) => Kind::BoolValue(*b),
        JsonValue::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or_default()),
        JsonValue::String(s) => Kind::StringValue(s.clone()),
        JsonValue::Array(items) => Kind::ListValue(ListValue {
            values: items.iter().map(to_proto_value).collect(),
        }),
        JsonValue::Object(map) => Kind::StructValue(Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), to_proto_value(v)))
                .collect(),
        }),
    };
    Value { kind: Some(kind) }
}

fn from_proto_value(value: &Value) -> JsonValue {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => JsonValue::Null,
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::NumberValue(n)) => {
            // Whole numbers in i64 range come back as JSON integers
            if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                JsonValue::from(*n as i64)
            } else {
                serde_json::Number::from_f64(*n)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
        }
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.iter().map(from_proto_value).collect())
        }
        Some(Kind::StructValue(s)) => from_struct(s),
    }
}

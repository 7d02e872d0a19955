//! Projection of EDN values onto JSON.
//!
//! The projection is lossy by nature (JSON has no keywords, sets or tags):
//! - keywords become `":ns/name"` strings, symbols their printed name
//! - lists, vectors and sets become arrays
//! - map keys become strings: string keys verbatim, any other key printed as EDN
//! - big integers and decimals become strings to keep their precision
//! - `#inst` / `#uuid` collapse to their string; other tags become
//!   `{"tag": ..., "value": ...}`

use serde_json::{Map, Number, Value as Json};

use crate::value::Value;

pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Nil => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::BigInt(digits) | Value::Decimal(digits) => Json::String(digits.clone()),
        Value::Float(x) => Number::from_f64(*x).map(Json::Number).unwrap_or(Json::Null),
        Value::Char(c) => Json::String(c.to_string()),
        Value::String(s) => Json::String(s.clone()),
        Value::Keyword(k) => Json::String(k.to_string()),
        Value::Symbol(s) => Json::String(s.to_string()),
        Value::List(items) | Value::Vector(items) | Value::Set(items) => {
            Json::Array(items.iter().map(to_json).collect())
        }
        Value::Map(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (k, v) in entries {
                object.insert(json_key(k), to_json(v));
            }
            Json::Object(object)
        }
        Value::Tagged(tag, inner) => match (tag.namespace.as_deref(), tag.name.as_str()) {
            (None, "inst" | "uuid") => to_json(inner),
            _ => serde_json::json!({
                "tag": tag.to_string(),
                "value": to_json(inner),
            }),
        },
    }
}

fn json_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

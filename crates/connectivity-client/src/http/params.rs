//! Flattening of structured query/form parameters into key/value pairs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extra form fields sent with a token request. `Value::Null` entries are
/// dropped before sending.
pub type FormFields = BTreeMap<String, Value>;

/// How array-valued parameters are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArraySerialization {
    /// `ids[0]=a&ids[1]=b`
    Indexed,
    /// `ids[]=a&ids[]=b`
    UnIndexed,
    /// `ids=a&ids=b`
    #[default]
    Plain,
    /// `ids=a,b`
    Csv,
    /// `ids=a\tb`
    Tsv,
    /// `ids=a|b`
    Psv,
}

impl ArraySerialization {
    fn separator(self) -> Option<&'static str> {
        match self {
            ArraySerialization::Csv => Some(","),
            ArraySerialization::Tsv => Some("\t"),
            ArraySerialization::Psv => Some("|"),
            _ => None,
        }
    }
}

/// Flatten named values into wire pairs, preserving order. Nulls vanish;
/// objects become `name[key]`; arrays follow `format`.
pub fn flatten_pairs(params: &[(String, Value)], format: ArraySerialization) -> Vec<(String, String)> {
    let mut out = Vec::with_capacity(params.len());
    for (name, value) in params {
        flatten_into(name, value, format, &mut out);
    }
    out
}

fn flatten_into(name: &str, value: &Value, format: ArraySerialization, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(&format!("{name}[{key}]"), nested, format, out);
            }
        }
        Value::Array(items) => flatten_array(name, items, format, out),
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                out.push((name.to_owned(), text));
            }
        }
    }
}

fn flatten_array(name: &str, items: &[Value], format: ArraySerialization, out: &mut Vec<(String, String)>) {
    let all_scalar = items.iter().all(|v| !v.is_array() && !v.is_object());
    if let (Some(sep), true) = (format.separator(), all_scalar) {
        let joined: Vec<String> = items.iter().filter_map(scalar_text).collect();
        if !joined.is_empty() {
            out.push((name.to_owned(), joined.join(sep)));
        }
        return;
    }

    for (index, item) in items.iter().enumerate() {
        let key = match format {
            ArraySerialization::UnIndexed => format!("{name}[]"),
            ArraySerialization::Plain => name.to_owned(),
            // delimited formats fall back to indexed keys for nested values
            _ => format!("{name}[{index}]"),
        };
        flatten_into(&key, item, format, out);
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

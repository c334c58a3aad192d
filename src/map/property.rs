use std::collections::HashMap;

use roxmltree::Node;

use crate::error::{Error, Result};
use crate::map::xml;

/// Typed value of a `<property>`.
///
/// `color`, `file` and `class` values have no dedicated variant and are kept
/// as strings; `object` references are ints.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl PropertyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Ints widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(v) => Some(v),
            _ => None,
        }
    }
}

pub type Properties = HashMap<String, PropertyValue>;

/// Read the `<properties>` child of `node`, if any.
pub(crate) fn parse_properties(node: Node<'_, '_>) -> Result<Properties> {
    let mut out = Properties::new();
    let Some(list) = xml::child(node, "properties") else {
        return Ok(out);
    };

    for prop in xml::children(list, "property") {
        let name: String = xml::required(prop, "property", "name")?;
        // Multi-line strings live in the element text instead of `value`.
        let raw = prop.attribute("value").or_else(|| prop.text()).unwrap_or("");
        let kind = prop.attribute("type").unwrap_or("string");
        out.insert(name, parse_value(kind, raw)?);
    }
    Ok(out)
}

fn parse_value(kind: &str, raw: &str) -> Result<PropertyValue> {
    let invalid = || Error::InvalidAttribute { element: "property", attribute: "value", value: raw.to_string() };

    Ok(match kind {
        "int" | "object" => PropertyValue::Int(raw.trim().parse().map_err(|_| invalid())?),
        "float" => PropertyValue::Float(raw.trim().parse().map_err(|_| invalid())?),
        "bool" => PropertyValue::Bool(match raw.trim() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => return Err(invalid()),
        }),
        "string" | "color" | "file" | "class" => PropertyValue::String(raw.to_string()),
        other => {
            return Err(Error::InvalidAttribute {
                element: "property",
                attribute: "type",
                value: other.to_string(),
            })
        }
    })
}

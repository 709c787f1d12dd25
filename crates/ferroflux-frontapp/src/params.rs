//! Parameter resolution for input items.
//!
//! The host hands every item over as a bag of named values. Route builders
//! never touch that bag directly; they go through [`Params`], which applies
//! defaults and turns absent or unreadable values into typed errors.

use crate::error::{DispatchError, DispatchResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Lookup capability over the resolved parameters of one item.
pub trait ParameterSource: Sync {
    fn parameter(&self, name: &str) -> Option<&Value>;
}

/// One unit of input: the named parameter values for a single dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputItem(Map<String, Value>);

impl InputItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for hosts and tests assembling items by hand.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Wraps a JSON value. Non-object values yield an empty item.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for InputItem {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl ParameterSource for InputItem {
    fn parameter(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

impl ParameterSource for HashMap<String, Value> {
    fn parameter(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Splits a comma-separated identifier list, trimming each entry and
/// dropping the empty ones.
pub fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Typed accessors over a [`ParameterSource`].
#[derive(Clone, Copy)]
pub struct Params<'a> {
    source: &'a dyn ParameterSource,
}

impl<'a> Params<'a> {
    pub fn new(source: &'a dyn ParameterSource) -> Self {
        Self { source }
    }

    fn lookup(&self, name: &str) -> Option<&'a Value> {
        self.source.parameter(name).filter(|v| !v.is_null())
    }

    /// A non-empty string. Absent, null and blank values are all "missing".
    pub fn required_str(&self, name: &str) -> DispatchResult<String> {
        match self.lookup(name) {
            None => Err(DispatchError::missing(name)),
            Some(Value::String(s)) if s.trim().is_empty() => Err(DispatchError::missing(name)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(DispatchError::malformed(
                name,
                format!("expected a string, got {}", type_name(other)),
            )),
        }
    }

    pub fn str_or(&self, name: &str, default: &str) -> DispatchResult<String> {
        match self.lookup(name) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(DispatchError::malformed(
                name,
                format!("expected a string, got {}", type_name(other)),
            )),
        }
    }

    /// Booleans also accept the strings `"true"` / `"false"`, which is how
    /// most form-driven hosts hand them over.
    pub fn bool_or(&self, name: &str, default: bool) -> DispatchResult<bool> {
        match self.lookup(name) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                "" => Ok(default),
                other => Err(DispatchError::malformed(
                    name,
                    format!("expected a boolean, got \"{}\"", other),
                )),
            },
            Some(other) => Err(DispatchError::malformed(
                name,
                format!("expected a boolean, got {}", type_name(other)),
            )),
        }
    }

    /// A JSON-bearing field. Strings are parsed; already-structured values
    /// pass through. Absent fields fall back to `default`.
    pub fn json_or(&self, name: &str, default: Value) -> DispatchResult<Value> {
        match self.lookup(name) {
            None => Ok(default),
            Some(Value::String(raw)) => parse_json(name, raw),
            Some(structured) => Ok(structured.clone()),
        }
    }

    /// Like [`Params::json_or`], but absent or blank input means "nothing".
    pub fn optional_json(&self, name: &str) -> DispatchResult<Option<Value>> {
        match self.lookup(name) {
            None => Ok(None),
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
            Some(Value::String(raw)) => parse_json(name, raw).map(Some),
            Some(structured) => Ok(Some(structured.clone())),
        }
    }

    /// A required comma-separated identifier list. A JSON array of strings
    /// is accepted as well.
    pub fn id_list(&self, name: &str) -> DispatchResult<Vec<String>> {
        let ids = match self.lookup(name) {
            None => return Err(DispatchError::missing(name)),
            Some(Value::String(raw)) => split_ids(raw),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(|s| s.trim().to_string()).ok_or_else(|| {
                        DispatchError::malformed(name, "expected an array of strings")
                    })
                })
                .filter(|id| id.as_ref().map_or(true, |s| !s.is_empty()))
                .collect::<DispatchResult<Vec<_>>>()?,
            Some(other) => {
                return Err(DispatchError::malformed(
                    name,
                    format!("expected a comma-separated list, got {}", type_name(other)),
                ));
            }
        };

        if ids.is_empty() {
            return Err(DispatchError::missing(name));
        }
        Ok(ids)
    }
}

fn parse_json(name: &str, raw: &str) -> DispatchResult<Value> {
    serde_json::from_str(raw).map_err(|e| DispatchError::malformed(name, e))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

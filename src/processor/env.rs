// src/processor/env.rs

//! Processor variable environment

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// String-keyed variables shared between pipeline steps
///
/// Values are JSON so that hosts can pass strings, numbers, lists and nested
/// tables without a schema. The typed accessors are lenient where a host is
/// likely to hand over strings: lists may be comma-separated, integers and
/// booleans may be spelled out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessorEnv {
    vars: BTreeMap<String, Value>,
}

/// Null, empty strings, empty lists and empty tables carry no value
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

impl ProcessorEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    /// Whether the variable holds a non-empty value
    pub fn is_present(&self, name: &str) -> bool {
        self.vars.get(name).is_some_and(|v| !is_empty_value(v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Non-empty string value; numbers are converted
    pub fn string(&self, name: &str) -> Result<Option<String>> {
        match self.vars.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(Error::invalid_input(name, "a string")),
        }
    }

    pub fn required_string(&self, name: &str) -> Result<String> {
        self.string(name)?
            .ok_or_else(|| Error::validation(format!("missing required input variable: {}", name)))
    }

    pub fn bool(&self, name: &str) -> Result<Option<bool>> {
        match self.vars.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Some(false)),
                Some(1) => Ok(Some(true)),
                _ => Err(Error::invalid_input(name, "a boolean")),
            },
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(None),
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" => Ok(Some(false)),
                _ => Err(Error::invalid_input(name, "a boolean")),
            },
            Some(_) => Err(Error::invalid_input(name, "a boolean")),
        }
    }

    /// List of strings; a plain string is split on commas
    pub fn string_list(&self, name: &str) -> Result<Vec<String>> {
        let expected = "a list of strings";
        match self.vars.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(split_list(s)),
            Some(Value::Array(items)) => items
                .iter()
                .filter(|v| !is_empty_value(v))
                .map(|v| match v {
                    Value::String(s) => Ok(s.trim().to_string()),
                    Value::Number(n) => Ok(n.to_string()),
                    _ => Err(Error::invalid_input(name, expected)),
                })
                .collect(),
            Some(_) => Err(Error::invalid_input(name, expected)),
        }
    }

    /// List of integers; a single integer or a comma-separated string also works
    pub fn int_list(&self, name: &str) -> Result<Vec<i64>> {
        let expected = "a list of integers";
        let parse = |s: &str| {
            s.parse::<i64>()
                .map_err(|_| Error::invalid_input(name, expected))
        };
        match self.vars.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(|n| vec![n])
                .ok_or_else(|| Error::invalid_input(name, expected)),
            Some(Value::String(s)) => split_list(s).iter().map(|s| parse(s)).collect(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::Number(n) => n
                        .as_i64()
                        .ok_or_else(|| Error::invalid_input(name, expected)),
                    Value::String(s) => parse(s.trim()),
                    _ => Err(Error::invalid_input(name, expected)),
                })
                .collect(),
            Some(_) => Err(Error::invalid_input(name, expected)),
        }
    }

    /// Table values of a list variable, used for structured entries
    pub fn table_list(&self, name: &str) -> Result<Vec<Map<String, Value>>> {
        match self.vars.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::Object(map) => Ok(map.clone()),
                    _ => Err(Error::invalid_input(name, "a list of tables")),
                })
                .collect(),
            Some(_) => Err(Error::invalid_input(name, "a list of tables")),
        }
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl FromIterator<(String, Value)> for ProcessorEnv {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

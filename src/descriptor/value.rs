// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Stage configuration values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form stage configuration, ordered by key
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A single configuration value
///
/// Closed: anything a descriptor can carry in `config` is one of these
/// variants. Maps are ordered so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Explicitly unset
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for ConfigValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(m: ConfigMap) -> Self {
        Self::Map(m)
    }
}

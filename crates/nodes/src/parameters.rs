//! Node parameters as seen by a node at execution time.
//!
//! The host resolves expressions before a node runs, so parameters arrive as
//! plain JSON. Some parameters differ per input item; [`ParameterSource`]
//! hides that distinction behind an item index.

use serde_json::{Map, Value};

use crate::NodeError;

/// Read-only access to a node's resolved parameters.
pub trait ParameterSource: Send + Sync {
    /// Value of `name` for the item at `item_index`, or `None` when unset.
    fn get(&self, name: &str, item_index: usize) -> Option<Value>;
}

/// A single JSON object shared by every item.
impl ParameterSource for Value {
    fn get(&self, name: &str, _item_index: usize) -> Option<Value> {
        self.as_object().and_then(|m| m.get(name)).cloned()
    }
}

/// Per-item parameter objects layered over a shared base.
///
/// Lookups check the item's own object first and fall back to `shared`.
#[derive(Debug, Clone, Default)]
pub struct PerItemParameters {
    pub shared: Map<String, Value>,
    pub items: Vec<Map<String, Value>>,
}

impl PerItemParameters {
    pub fn new(shared: Map<String, Value>, items: Vec<Map<String, Value>>) -> Self {
        Self { shared, items }
    }
}

impl ParameterSource for PerItemParameters {
    fn get(&self, name: &str, item_index: usize) -> Option<Value> {
        self.items
            .get(item_index)
            .and_then(|item| item.get(name))
            .or_else(|| self.shared.get(name))
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Typed accessors
// ---------------------------------------------------------------------------

/// Typed views over a [`ParameterSource`].
///
/// `null` is treated the same as an unset parameter.
pub struct Parameters<'a> {
    source: &'a dyn ParameterSource,
}

impl<'a> Parameters<'a> {
    pub fn new(source: &'a dyn ParameterSource) -> Self {
        Self { source }
    }

    fn value(&self, name: &str, item_index: usize) -> Option<Value> {
        self.source
            .get(name, item_index)
            .filter(|v| !v.is_null())
    }

    /// Required string parameter.
    pub fn string(&self, name: &str, item_index: usize) -> Result<String, NodeError> {
        self.optional_string(name, item_index)?
            .ok_or_else(|| NodeError::MissingParameter(name.to_owned()))
    }

    /// Optional string parameter.
    pub fn optional_string(&self, name: &str, item_index: usize) -> Result<Option<String>, NodeError> {
        match self.value(name, item_index) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(invalid(name, "a string", &other)),
        }
    }

    /// String parameter with a default, used for optional dropdowns.
    pub fn string_or(&self, name: &str, item_index: usize, default: &str) -> Result<String, NodeError> {
        Ok(self
            .optional_string(name, item_index)?
            .unwrap_or_else(|| default.to_owned()))
    }

    /// List of strings. A bare string is accepted as a single-element list.
    pub fn string_list(&self, name: &str, item_index: usize) -> Result<Option<Vec<String>>, NodeError> {
        match self.value(name, item_index) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(vec![s])),
            Some(Value::Array(values)) => values
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    other => Err(invalid(name, "a list of strings", &other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(invalid(name, "a list of strings", &other)),
        }
    }

    pub fn bool_or(&self, name: &str, item_index: usize, default: bool) -> Result<bool, NodeError> {
        match self.value(name, item_index) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(b),
            Some(other) => Err(invalid(name, "a boolean", &other)),
        }
    }

    pub fn u64_or(&self, name: &str, item_index: usize, default: u64) -> Result<u64, NodeError> {
        match self.value(name, item_index) {
            None => Ok(default),
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| invalid(name, "a non-negative integer", &Value::Number(n.clone()))),
            Some(other) => Err(invalid(name, "a non-negative integer", &other)),
        }
    }
}

fn invalid(name: &str, expected: &str, got: &Value) -> NodeError {
    NodeError::InvalidParameter {
        name: name.to_owned(),
        message: format!("expected {expected}, got {got}"),
    }
}

//! Immutable application state snapshots
//!
//! A [`Model`] is a mapping from string keys to JSON values. It is frozen
//! from the moment it is built: there is no mutable accessor, cloning shares
//! the same allocation, and every "change" goes through a helper that
//! returns a brand-new snapshot.
//!
//! # Example
//!
//! ```
//! use libfrumpy::Model;
//! use serde_json::json;
//!
//! let model = Model::from_value(json!({ "clicks": 0 })).unwrap();
//! let next = model.with("clicks", json!(1));
//!
//! assert_eq!(model.get("clicks"), Some(&json!(0)));
//! assert_eq!(next.get("clicks"), Some(&json!(1)));
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::equality::objects_equal;
use crate::error::{FrumpyError, Result};
use crate::util::{copy_merge, Object};

/// Frozen state snapshot
#[derive(Clone)]
pub struct Model(Arc<Object>);

impl Model {
    pub fn empty() -> Self {
        Self::from_map(Object::new())
    }

    pub fn from_map(map: Object) -> Self {
        Model(Arc::new(map))
    }

    /// Build a model from a JSON value.
    ///
    /// `null` is treated as an absent model; any other non-object is
    /// rejected with the JSON type it carried.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::Null => Err(FrumpyError::MissingModel),
            other => Err(FrumpyError::InvalidModel(json_type(&other).to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read-only view of the underlying fields.
    pub fn as_map(&self) -> &Object {
        &self.0
    }

    /// Deep copy as a plain JSON value. Mutating the copy never reaches
    /// this model.
    pub fn to_value(&self) -> Value {
        Value::Object((*self.0).clone())
    }

    /// New snapshot with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: Value) -> Model {
        let mut delta = Object::new();
        delta.insert(key.into(), value);
        self.merge(&delta)
    }

    /// New snapshot with every key of `delta` copied over this one.
    pub fn merge(&self, delta: &Object) -> Model {
        Model::from_map(copy_merge(&self.0, [delta]))
    }

    /// New snapshot without `key`.
    pub fn without(&self, key: &str) -> Model {
        let mut map = (*self.0).clone();
        map.remove(key);
        Model::from_map(map)
    }

    /// True when both handles share the same snapshot.
    pub fn ptr_eq(a: &Model, b: &Model) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        Model::ptr_eq(self, other) || objects_equal(&self.0, &other.0)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Model").field(&*self.0).finish()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&*self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl TryFrom<Value> for Model {
    type Error = FrumpyError;

    fn try_from(value: Value) -> Result<Self> {
        Model::from_value(value)
    }
}

impl From<Object> for Model {
    fn from(map: Object) -> Self {
        Model::from_map(map)
    }
}

impl From<Model> for Value {
    fn from(model: Model) -> Self {
        model.to_value()
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Object::deserialize(deserializer).map(Model::from_map)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

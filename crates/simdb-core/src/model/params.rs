//! `ParameterSet`: mapeo de nombres a valores JSON arbitrarios.
//!
//! El core no interpreta el contenido. Dos sets son iguales si su forma
//! canónica coincide; el orden de inserción de claves no participa ni en la
//! igualdad ni en el digest.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::hashing::{hash_str, to_canonical_json};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(Map<String, Value>);

impl ParameterSet {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Convierte un `Value`; sólo objetos JSON son válidos.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parsea texto JSON (el formato de los archivos de parámetros).
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Serialización determinista (claves ordenadas, sin espacios).
    pub fn canonical_json(&self) -> String {
        to_canonical_json(&self.to_value())
    }

    /// Digest blake3 de la forma canónica; identifica el contenido.
    pub fn digest(&self) -> String {
        hash_str(&self.canonical_json())
    }
}

impl From<Map<String, Value>> for ParameterSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ParameterSet {
    type Error = crate::errors::SimDbError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

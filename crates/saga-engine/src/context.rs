use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ContextError;

/// Identifier of one saga run. Assigned once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SagaId(String);

impl SagaId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SagaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SagaId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SagaId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Default)]
struct ContextData {
    values: IndexMap<String, Value>,
    steps_completed: Vec<String>,
}

/// Scratch space shared by every step of one saga run.
///
/// Forward actions record identifiers here (a reservation id, a batch id)
/// so that their own compensation, or a later step, can pick them up.
/// Clones share the same underlying data; a context is never shared between
/// two saga runs. Use [`SagaContext::detached`] for an independent copy.
#[derive(Debug, Clone)]
pub struct SagaContext {
    saga_id: SagaId,
    inner: Arc<RwLock<ContextData>>,
}

impl SagaContext {
    #[must_use]
    pub fn new(saga_id: SagaId) -> Self {
        Self::with_data(saga_id, IndexMap::new())
    }

    #[must_use]
    pub fn with_data(saga_id: SagaId, values: IndexMap<String, Value>) -> Self {
        Self {
            saga_id,
            inner: Arc::new(RwLock::new(ContextData {
                values,
                steps_completed: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn saga_id(&self) -> &SagaId {
        &self.saga_id
    }

    /// Store a value, replacing any previous value under the same key.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.write().values.insert(key.into(), value.into());
    }

    /// Look up a value, falling back to `default` when the key is absent.
    #[must_use]
    pub fn get(&self, key: &str, default: Value) -> Value {
        self.value(key).unwrap_or(default)
    }

    /// Look up a value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<Value> {
        self.inner.read().values.get(key).cloned()
    }

    /// Look up a string value. Non-string values yield `None`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Store any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::Encode` if the value cannot be represented as JSON.
    pub fn set_as<T: Serialize>(&self, key: impl Into<String>, value: &T) -> Result<(), ContextError> {
        let key = key.into();
        let encoded = serde_json::to_value(value).map_err(|source| ContextError::Encode {
            key: key.clone(),
            source,
        })?;
        self.inner.write().values.insert(key, encoded);
        Ok(())
    }

    /// Read a value back into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::Decode` if the stored value does not match `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ContextError> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| ContextError::Decode {
                key: key.to_string(),
                source,
            })
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().values.contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.write().values.shift_remove(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().values.keys().cloned().collect()
    }

    /// Independent copy of the current data under the same saga id.
    ///
    /// Writes to the copy are not seen by the original and vice versa.
    #[must_use]
    pub fn detached(&self) -> Self {
        let data = self.inner.read();
        Self {
            saga_id: self.saga_id.clone(),
            inner: Arc::new(RwLock::new(ContextData {
                values: data.values.clone(),
                steps_completed: data.steps_completed.clone(),
            })),
        }
    }

    /// Names of the steps that reached `completed`, in completion order.
    #[must_use]
    pub fn steps_completed(&self) -> Vec<String> {
        self.inner.read().steps_completed.clone()
    }

    pub(crate) fn mark_completed(&self, step: &str) {
        self.inner.write().steps_completed.push(step.to_string());
    }
}

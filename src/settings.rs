use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Explicit settings object replacing the application-wide settings store:
/// a JSON-object-backed key-value bag passed into components by reference.
/// All mutation goes through [`Settings::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    entries: Map<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shallow merge at the top level: each patch key replaces the
    /// existing value wholesale (array-valued fields included); a null
    /// patch value removes the key.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            if value.is_null() {
                self.entries.remove(&key);
            } else {
                self.entries.insert(key, value);
            }
        }
    }
}

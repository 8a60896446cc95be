//! Simple node parameter store
//!
//! Provides a straightforward key-value store for per-node configuration

use crate::error::{UrosError, UrosResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Simple runtime parameter store
#[derive(Debug, Clone, Default)]
pub struct RuntimeParams {
    /// Parameter storage - BTreeMap maintains sorted order
    params: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl RuntimeParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter with a default value.
    ///
    /// An existing value is kept and returned; otherwise `default` is stored.
    pub fn declare<T>(&self, key: &str, default: T) -> UrosResult<T>
    where
        T: Serialize + for<'de> Deserialize<'de>,
    {
        if key.is_empty() {
            return Err(UrosError::invalid_argument("parameter name is empty"));
        }

        let mut params = self.params.write();
        match params.get(key) {
            Some(existing) => Ok(serde_json::from_value(existing.clone())?),
            None => {
                params.insert(key.to_string(), serde_json::to_value(&default)?);
                Ok(default)
            }
        }
    }

    /// Get a parameter value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let params = self.params.read();
        let value = params.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Get parameter with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set a parameter value
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> UrosResult<()> {
        let json_value = serde_json::to_value(value)?;
        self.params.write().insert(key.to_string(), json_value);
        Ok(())
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.params.write().remove(key)
    }

    /// Get all parameters
    pub fn get_all(&self) -> BTreeMap<String, Value> {
        self.params.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_keeps_existing_value() {
        let params = RuntimeParams::new();
        assert_eq!(params.declare("timer_period_ms", 3000u64).unwrap(), 3000);

        params.set("timer_period_ms", 500u64).unwrap();
        assert_eq!(params.declare("timer_period_ms", 3000u64).unwrap(), 500);
    }

    #[test]
    fn declare_with_wrong_type_fails() {
        let params = RuntimeParams::new();
        params.set("topic", "chatter").unwrap();
        assert!(params.declare("topic", 1i32).is_err());
    }

    #[test]
    fn get_set_remove() {
        let params = RuntimeParams::new();
        assert_eq!(params.get_or("missing", 7i32), 7);

        params.set("enabled", true).unwrap();
        assert!(params.has("enabled"));
        assert_eq!(params.get::<bool>("enabled"), Some(true));
        assert_eq!(params.get_all().len(), 1);

        assert!(params.remove("enabled").is_some());
        assert!(!params.has("enabled"));
    }

    #[test]
    fn clones_share_storage() {
        let params = RuntimeParams::new();
        let other = params.clone();
        other.set("x", 1).unwrap();
        assert_eq!(params.get::<i32>("x"), Some(1));
    }
}

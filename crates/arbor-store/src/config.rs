use std::path::Path;

use arbor_types::Value;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`Store`](crate::Store).
///
/// Every field has a default, so a TOML file only needs the keys it wants
/// to change:
///
/// ```toml
/// slice = "cache"
/// notify_unchanged = false
///
/// [initial_state]
/// ROOT_QUERY = {}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Capacity of each subscriber's event channel.
    pub channel_capacity: usize,
    /// Whether subscribers hear about commands that left the state as it was.
    pub notify_unchanged: bool,
    /// State installed at creation and on `Reset`. Must be an object.
    pub initial_state: serde_json::Value,
    /// When set, commands act on this entry of a map-shaped root instead of
    /// on the root itself.
    pub slice: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            notify_unchanged: true,
            initial_state: serde_json::Value::Object(serde_json::Map::new()),
            slice: None,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.channel_capacity == 0 {
            return Err(StoreError::Config(
                "channel_capacity must be greater than zero".into(),
            ));
        }
        if !self.initial_state.is_object() {
            return Err(StoreError::Config(
                "initial_state must be an object".into(),
            ));
        }
        if self.slice.as_deref() == Some("") {
            return Err(StoreError::Config("slice name must not be empty".into()));
        }
        Ok(())
    }

    /// The initial state as a value tree.
    pub fn initial_value(&self) -> Value {
        Value::from(self.initial_state.clone())
    }
}

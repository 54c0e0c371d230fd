use std::sync::Arc;

use arbor_merge::{assoc, dissoc};
use arbor_store::{Command, Store, StoreError, StoreEvent};
use arbor_types::{Key, Value};
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::traits::NormalizedCache;

/// [`NormalizedCache`] over a shared [`Store`].
///
/// The cache reads and writes the store's slice when one is configured, and
/// the root otherwise. Several caches (and other writers) may share one
/// store; `set` and `delete` compute their update under the store's writer
/// lock and never lose a concurrent write.
#[derive(Clone, Debug)]
pub struct StoreCache {
    store: Arc<Store>,
}

impl StoreCache {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Create a cache and install `contents` as its top-level mapping.
    pub fn with_contents(store: Arc<Store>, contents: Value) -> CacheResult<Self> {
        let cache = Self::new(store);
        cache.replace(Some(contents))?;
        Ok(cache)
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    fn update<F>(&self, op: &'static str, id: &str, build: F) -> CacheResult<StoreEvent>
    where
        F: FnOnce(&Value) -> Result<Value, arbor_merge::MergeError>,
    {
        let event = self
            .store
            .dispatch_with(|current| {
                let base = current.cloned().unwrap_or_else(Value::empty_map);
                Ok(Command::Overwrite(build(&base)?))
            })
            .map_err(lift)?;
        debug!(op, id, changed = event.changed, revision = event.revision, "cache updated");
        Ok(event)
    }
}

/// Surface merge failures raised inside the store as cache merge errors.
fn lift(err: StoreError) -> CacheError {
    match err {
        StoreError::Merge(e) => CacheError::Merge(e),
        other => CacheError::Store(other),
    }
}

impl NormalizedCache for StoreCache {
    fn get(&self, id: &str) -> Option<Value> {
        self.store
            .slice_state()
            .and_then(|top| top.get(&Key::from(id)).cloned())
    }

    fn set(&self, id: &str, value: Value) -> CacheResult<()> {
        let key = Key::from(id);
        self.update("set", id, |top| assoc(top, &key, value))?;
        Ok(())
    }

    fn delete(&self, id: &str) -> CacheResult<()> {
        let key = Key::from(id);
        self.update("delete", id, |top| dissoc(top, &key))?;
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        self.store.dispatch(Command::Reset)?;
        Ok(())
    }

    fn to_object(&self) -> Value {
        self.store.slice_state().unwrap_or_else(Value::empty_map)
    }

    fn replace(&self, contents: Option<Value>) -> CacheResult<()> {
        let command = match contents {
            Some(value) => Command::Overwrite(value),
            None => Command::Reset,
        };
        self.store.dispatch(command)?;
        Ok(())
    }

    fn write(&self, payload: Value) -> CacheResult<()> {
        let event = self.store.dispatch(Command::Write(payload))?;
        debug!(changed = event.changed, revision = event.revision, "cache payload merged");
        Ok(())
    }
}

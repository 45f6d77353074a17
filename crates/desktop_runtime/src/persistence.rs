//! Typed JSON persistence over the host key/value store.
//!
//! Reads distinguish "nothing stored" from "stored but unreadable" so callers can fall back to
//! defaults and still record what went wrong.

use platform_host::{save_json_with, KeyValueStore};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::PersistenceError;

/// Loads the JSON value stored under `key`.
///
/// # Errors
///
/// Returns [`PersistenceError::Read`] when the store is unavailable and
/// [`PersistenceError::Corrupt`] when the stored text does not decode as `T`.
pub fn load_persisted<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    let raw = store.get(key).map_err(|reason| PersistenceError::Read {
        key: key.to_string(),
        reason,
    })?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| PersistenceError::Corrupt {
            key: key.to_string(),
            reason: err.to_string(),
        })
}

/// Writes `value` as JSON under `key`.
///
/// # Errors
///
/// Returns [`PersistenceError::Write`] when encoding or the host write fails.
pub fn persist<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    save_json_with(store, key, value).map_err(|reason| PersistenceError::Write {
        key: key.to_string(),
        reason,
    })
}

/// Writes `value` and logs a failure instead of returning it.
///
/// Returns the failure so owning stores can keep it for inspection.
pub fn persist_or_warn<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    what: &str,
) -> Option<PersistenceError> {
    match persist(store, key, value) {
        Ok(()) => None,
        Err(err) => {
            leptos::logging::warn!("{what} persist failed: {err}");
            Some(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use platform_host::MemoryKeyValueStore;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_key_is_none_and_garbage_is_corrupt() {
        let store = MemoryKeyValueStore::with_entries([("bad", "{not json")]);

        assert_eq!(load_persisted::<Vec<u32>>(&store, "missing"), Ok(None));
        let err = load_persisted::<Vec<u32>>(&store, "bad").expect_err("corrupt");
        assert!(matches!(err, PersistenceError::Corrupt { ref key, .. } if key == "bad"));
    }

    #[test]
    fn persisted_values_load_back() {
        let store = MemoryKeyValueStore::default();
        assert_eq!(persist_or_warn(&store, "k", &vec![1_u32, 2], "test"), None);
        assert_eq!(load_persisted::<Vec<u32>>(&store, "k"), Ok(Some(vec![1, 2])));
    }
}

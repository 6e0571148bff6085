//! In-memory settings backend.
//!
//! Deterministic reference implementation of [`SettingsBackend`] used by
//! tests and examples. Entries replay in lexicographic key order; handlers
//! must not rely on that, it is an artifact of the `BTreeMap` backing.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::warn;

use crate::traits::{SettingsBackend, SettingsHandler, SettingsValue};
use crate::{SettingsError, SettingsResult};

/// In-memory settings backend over a `BTreeMap`.
#[derive(Default)]
pub struct MemorySettings {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry directly, bypassing `save_one`. Intended for seeding
    /// stored state before a `load` in tests.
    pub fn seed(&self, path: &str, value: &[u8]) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(path.to_string(), value.to_vec());
        }
    }

    /// Current stored value for `path`, if any.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.entries.read().ok().and_then(|g| g.get(path).cloned())
    }
}

struct MemoryValue<'a> {
    data: &'a [u8],
}

impl SettingsValue for MemoryValue<'_> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> SettingsResult<usize> {
        let n = self.data.len().min(buf.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        Ok(n)
    }
}

#[async_trait]
impl SettingsBackend for MemorySettings {
    async fn init(&self) -> SettingsResult<()> {
        Ok(())
    }

    async fn load(
        &self,
        namespace: &str,
        handler: &mut (dyn SettingsHandler + Send),
    ) -> SettingsResult<()> {
        let prefix = format!("{namespace}/");
        let entries: Vec<(String, Vec<u8>)> = {
            let guard = self
                .entries
                .read()
                .map_err(|_| SettingsError::Backend("entries lock poisoned".to_string()))?;
            guard
                .iter()
                .filter(|(k, _)| *k == namespace || k.starts_with(&prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };

        for (path, data) in &entries {
            let key = path.strip_prefix(&prefix);
            let mut value = MemoryValue {
                data: data.as_slice(),
            };
            if let Err(err) = handler.set(key, &mut value).await {
                // One bad entry must not shadow the rest of the namespace.
                warn!(%path, %err, "settings handler rejected entry");
            }
        }

        handler.commit().await
    }

    async fn save_one(&self, path: &str, value: &[u8]) -> SettingsResult<()> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| SettingsError::Backend("entries lock poisoned".to_string()))?;
        guard.insert(path.to_string(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        seen: Vec<(Option<String>, Vec<u8>)>,
        committed: bool,
        reject: Option<String>,
    }

    #[async_trait]
    impl SettingsHandler for Recording {
        async fn set(
            &mut self,
            key: Option<&str>,
            value: &mut (dyn SettingsValue + Send),
        ) -> SettingsResult<()> {
            if self.reject.is_some() && self.reject.as_deref() == key {
                return Err(SettingsError::UnknownKey(key.unwrap_or("").to_string()));
            }
            let mut buf = vec![0u8; value.len()];
            let n = value.read(&mut buf)?;
            buf.truncate(n);
            self.seen.push((key.map(str::to_string), buf));
            Ok(())
        }

        async fn commit(&mut self) -> SettingsResult<()> {
            self.committed = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn replay_visits_namespace_entries_once_and_commits() {
        let store = MemorySettings::new();
        store.seed("bt/id", &[1, 2, 3]);
        store.seed("bt/name", b"node");
        store.seed("other/id", &[9]);

        let mut handler = Recording::default();
        store.load("bt", &mut handler).await.unwrap();

        assert!(handler.committed);
        assert_eq!(handler.seen.len(), 2);
        assert!(handler
            .seen
            .iter()
            .all(|(k, _)| matches!(k.as_deref(), Some("id") | Some("name"))));
    }

    #[tokio::test]
    async fn bare_namespace_key_is_delivered_without_a_key() {
        let store = MemorySettings::new();
        store.seed("bt", &[7]);

        let mut handler = Recording::default();
        store.load("bt", &mut handler).await.unwrap();

        assert_eq!(handler.seen.len(), 1);
        assert_eq!(handler.seen[0].0, None);
    }

    #[tokio::test]
    async fn rejected_entry_does_not_abort_the_replay() {
        let store = MemorySettings::new();
        store.seed("bt/bogus", &[0]);
        store.seed("bt/name", b"node");

        let mut handler = Recording {
            reject: Some("bogus".to_string()),
            ..Default::default()
        };
        store.load("bt", &mut handler).await.unwrap();

        assert!(handler.committed);
        assert_eq!(handler.seen.len(), 1);
        assert_eq!(handler.seen[0].0.as_deref(), Some("name"));
    }

    #[tokio::test]
    async fn save_one_overwrites_previous_value() {
        let store = MemorySettings::new();
        store.save_one("bt/id", &[1]).await.unwrap();
        store.save_one("bt/id", &[2, 3]).await.unwrap();
        assert_eq!(store.get("bt/id"), Some(vec![2, 3]));
    }

    #[tokio::test]
    async fn value_read_is_bounded_by_the_caller_buffer() {
        let mut value = MemoryValue {
            data: &[1, 2, 3, 4],
        };
        let mut buf = [0u8; 2];
        assert_eq!(value.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(value.len(), 4);
    }
}

use crate::SettingsResult;
use async_trait::async_trait;

/// Read handle for one stored value delivered during a replay.
pub trait SettingsValue {
    /// Total stored length of the value in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `buf.len()` bytes of the value into `buf`, starting from
    /// the beginning of the stored payload. Returns the number of bytes
    /// actually copied.
    fn read(&mut self, buf: &mut [u8]) -> SettingsResult<usize>;
}

/// Receiver for one boot-time replay of a settings namespace.
#[async_trait]
pub trait SettingsHandler: Send {
    /// Called once per stored entry. `key` is the entry path relative to
    /// the namespace root, or `None` for the bare namespace key itself.
    async fn set(
        &mut self,
        key: Option<&str>,
        value: &mut (dyn SettingsValue + Send),
    ) -> SettingsResult<()>;

    /// Called once after the last entry of the load pass, even when some
    /// entries failed.
    async fn commit(&mut self) -> SettingsResult<()>;
}

/// Persistent key/value settings store.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// One-time subsystem initialization. Errors surface verbatim to the
    /// caller that drives process startup.
    async fn init(&self) -> SettingsResult<()>;

    /// Replay every stored entry under `namespace` through `handler`, then
    /// drive `handler.commit()`. Per-entry handler errors do not abort the
    /// replay; a commit error does surface from this call.
    async fn load(
        &self,
        namespace: &str,
        handler: &mut (dyn SettingsHandler + Send),
    ) -> SettingsResult<()>;

    /// Write one value under its full path.
    async fn save_one(&self, path: &str, value: &[u8]) -> SettingsResult<()>;
}

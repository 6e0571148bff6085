//! Settings ingestion and the post-load commit pass.

use std::sync::Arc;

use async_trait::async_trait;
use bthost_settings::{
    SettingsBackend, SettingsError, SettingsHandler, SettingsResult, SettingsValue,
};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::addr::{IdentityAddr, ResolvingKey, RECORD_LEN};
use crate::config::IdentityConfig;
use crate::keys;
use crate::provider::IdentityProvider;
use crate::records::IdentityRecords;
use crate::saver::SaveScheduler;
use crate::{IdentityError, IdentityResult};

const APPEARANCE_LEN: usize = std::mem::size_of::<u16>();

/// One host instance's identity state and its collaborators.
///
/// Owns the identity record store and wires it to the settings backend
/// (load replay, deferred write-back) and the controller-side identity
/// provider (commit pass). No global state; every instance is isolated.
pub struct IdentityHost {
    config: IdentityConfig,
    records: Arc<Mutex<IdentityRecords>>,
    provider: Arc<dyn IdentityProvider>,
    backend: Arc<dyn SettingsBackend>,
    saver: SaveScheduler,
}

impl IdentityHost {
    /// Build a host. Spawns the deferred-save worker, so this must run
    /// inside a tokio runtime.
    pub fn new(
        config: IdentityConfig,
        backend: Arc<dyn SettingsBackend>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let records = Arc::new(Mutex::new(IdentityRecords::default()));
        let saver =
            SaveScheduler::spawn(config.clone(), Arc::clone(&records), Arc::clone(&backend));
        Self {
            config,
            records,
            provider,
            backend,
            saver,
        }
    }

    /// One-time settings subsystem initialization. The backend's error is
    /// surfaced verbatim.
    pub async fn init(&self) -> IdentityResult<()> {
        self.backend.init().await?;
        Ok(())
    }

    /// Mark the controller link usable (or not). Load passes that arrive
    /// while disabled are deferred, and the enable path is expected to
    /// re-drive [`IdentityHost::load`] afterwards.
    pub async fn set_enabled(&self, enabled: bool) {
        self.records.lock().await.enabled = enabled;
    }

    /// Install an application-supplied identity ahead of the load. Preset
    /// identities supersede whatever the store holds and are persisted at
    /// commit.
    pub async fn preset_identity(
        &self,
        addr: IdentityAddr,
        irk: Option<ResolvingKey>,
    ) -> IdentityResult<()> {
        let mut records = self.records.lock().await;
        if records.id_count() >= self.config.max_identities {
            return Err(IdentityError::Generation(format!(
                "all {} identity slots in use",
                self.config.max_identities
            )));
        }
        records.push_identity(addr, irk, self.config.privacy);
        records.preset_id = true;
        records.store_pending = true;
        Ok(())
    }

    /// Drive one load pass: replay the `bt` namespace through this host,
    /// then run the commit pass. Generation failures during commit abort
    /// the whole pass.
    pub async fn load(&self) -> IdentityResult<()> {
        let mut pass = LoadPass {
            host: self,
            commit_err: None,
        };
        let result = self.backend.load(keys::NAMESPACE, &mut pass).await;
        if let Some(err) = pass.commit_err {
            return Err(err);
        }
        result?;
        Ok(())
    }

    /// Schedule a deferred write-back of the identity state. Coalesced:
    /// repeated calls before the job runs collapse into one execution.
    pub fn save_identity(&self) {
        self.saver.request();
    }

    /// Clone of the current record state.
    pub async fn snapshot(&self) -> IdentityRecords {
        self.records.lock().await.clone()
    }

    async fn ingest(
        &self,
        key: Option<&str>,
        value: &mut (dyn SettingsValue + Send),
    ) -> SettingsResult<()> {
        let mut records = self.records.lock().await;

        if !records.enabled {
            // Identity setup needs a usable controller link; the enable
            // path re-drives the whole load pass later.
            return Ok(());
        }

        let Some(key) = key else {
            error!("settings entry carries no key");
            return Err(SettingsError::MissingKey);
        };
        let head = key.split('/').next().unwrap_or(key);

        match head {
            "id" => self.ingest_identities(&mut records, value),
            "name" if self.config.dynamic_name => self.ingest_name(&mut records, value),
            "appearance" if self.config.dynamic_appearance => {
                self.ingest_appearance(&mut records, value)
            }
            "irk" if self.config.privacy => self.ingest_resolving_keys(&mut records, value),
            other => Err(SettingsError::UnknownKey(other.to_string())),
        }
    }

    fn ingest_identities(
        &self,
        records: &mut IdentityRecords,
        value: &mut (dyn SettingsValue + Send),
    ) -> SettingsResult<()> {
        let mut buf = vec![0u8; self.config.max_identities * RECORD_LEN];

        if records.preset_id {
            warn!("ignoring identities stored in flash, application preset is in place");
            let _ = value.read(&mut buf);
            return Ok(());
        }

        let len = match value.read(&mut buf) {
            Ok(len) => len,
            Err(err) => {
                error!(%err, "failed to read identity list from storage");
                records.reset_identities();
                return Ok(());
            }
        };
        if len < RECORD_LEN {
            error!(len, "invalid length identity list in storage");
            records.reset_identities();
            return Ok(());
        }

        // Integer division: a partial trailing record is silently dropped.
        let count = len / RECORD_LEN;
        let mut loaded = Vec::with_capacity(count);
        for chunk in buf[..count * RECORD_LEN].chunks_exact(RECORD_LEN) {
            match IdentityAddr::from_record(chunk) {
                Ok(addr) => loaded.push(addr),
                Err(err) => {
                    error!(%err, "corrupt identity record in storage");
                    records.reset_identities();
                    return Ok(());
                }
            }
        }
        for (i, addr) in loaded.iter().enumerate() {
            debug!(index = i, %addr, "loaded identity");
        }
        records.identities = loaded;
        Ok(())
    }

    fn ingest_name(
        &self,
        records: &mut IdentityRecords,
        value: &mut (dyn SettingsValue + Send),
    ) -> SettingsResult<()> {
        let mut buf = vec![0u8; self.config.max_name_len];
        match value.read(&mut buf) {
            Ok(len) => {
                let name = String::from_utf8_lossy(&buf[..len]).into_owned();
                debug!(%name, "device name loaded");
                records.name = Some(name);
                Ok(())
            }
            Err(err) => {
                error!(%err, "failed to read device name from storage");
                Ok(())
            }
        }
    }

    fn ingest_appearance(
        &self,
        records: &mut IdentityRecords,
        value: &mut (dyn SettingsValue + Send),
    ) -> SettingsResult<()> {
        if value.len() != APPEARANCE_LEN {
            error!(len = value.len(), "ignoring appearance entry, wrong length");
            return Err(SettingsError::InvalidLength {
                key: "appearance".to_string(),
                expected: APPEARANCE_LEN,
                actual: value.len(),
            });
        }

        let mut buf = [0u8; APPEARANCE_LEN];
        value.read(&mut buf)?;
        records.appearance = Some(u16::from_le_bytes(buf));
        Ok(())
    }

    fn ingest_resolving_keys(
        &self,
        records: &mut IdentityRecords,
        value: &mut (dyn SettingsValue + Send),
    ) -> SettingsResult<()> {
        let mut buf = vec![0u8; self.config.max_identities * ResolvingKey::LEN];

        let len = match value.read(&mut buf) {
            Ok(len) => len,
            Err(err) => {
                error!(%err, "failed to read resolving keys from storage");
                records.resolving_keys.clear();
                return Ok(());
            }
        };
        if len < ResolvingKey::LEN {
            error!(len, "invalid length resolving-key list in storage");
            records.resolving_keys.clear();
            return Ok(());
        }

        let count = len / ResolvingKey::LEN;
        records.resolving_keys.clear();
        for chunk in buf[..count * ResolvingKey::LEN].chunks_exact(ResolvingKey::LEN) {
            let mut key = [0u8; ResolvingKey::LEN];
            key.copy_from_slice(chunk);
            records.resolving_keys.push(ResolvingKey(key));
        }
        debug!(count, "loaded resolving keys");

        // Identities and resolving keys are ingested independently; a
        // count mismatch is tolerated but worth surfacing.
        if records.resolving_keys.len() != records.id_count() {
            warn!(
                identities = records.id_count(),
                keys = records.resolving_keys.len(),
                "resolving-key count does not match identity count"
            );
        }
        Ok(())
    }

    async fn commit_records(&self) -> IdentityResult<()> {
        debug!("settings commit");
        let mut records = self.records.lock().await;

        if !records.enabled {
            return Ok(());
        }

        if self.config.dynamic_name && records.name.as_deref().map_or(true, str::is_empty) {
            if let Err(err) = self.provider.set_default_name(&self.config.default_name).await {
                warn!(%err, "failed to push default device name");
            }
            records.name = Some(self.config.default_name.clone());
        }

        if records.id_count() == 0 {
            match self.provider.public_identity().await {
                Ok(Some(addr)) => {
                    debug!(%addr, "using controller-resident public identity");
                    records.push_identity(addr, None, self.config.privacy);
                }
                Ok(None) => {}
                Err(err) => {
                    error!(%err, "unable to set up an identity address");
                    return Err(err);
                }
            }
        }

        if records.id_count() == 0 {
            match self.provider.random_identity().await {
                Ok(generated) => {
                    debug!(addr = %generated.addr, "generated static random identity");
                    records.push_identity(generated.addr, generated.irk, self.config.privacy);
                    records.store_pending = true;
                }
                Err(err) => {
                    error!(%err, "unable to set up an identity address");
                    return Err(err);
                }
            }
        }

        if !records.ready {
            self.provider.finalize_init().await;
            records.ready = true;
        }

        if records.store_pending {
            records.store_pending = false;
            debug!("storing generated identity information");
            self.saver.request();
        }

        Ok(())
    }
}

/// Adapter handing one replay pass to the host. Keeps the typed commit
/// error around because the settings boundary only speaks `SettingsError`.
struct LoadPass<'a> {
    host: &'a IdentityHost,
    commit_err: Option<IdentityError>,
}

#[async_trait]
impl SettingsHandler for LoadPass<'_> {
    async fn set(
        &mut self,
        key: Option<&str>,
        value: &mut (dyn SettingsValue + Send),
    ) -> SettingsResult<()> {
        self.host.ingest(key, value).await
    }

    async fn commit(&mut self) -> SettingsResult<()> {
        match self.host.commit_records().await {
            Ok(()) => Ok(()),
            Err(err) => {
                let msg = err.to_string();
                self.commit_err = Some(err);
                Err(SettingsError::Commit(msg))
            }
        }
    }
}

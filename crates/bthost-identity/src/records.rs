//! In-memory identity record store.

use crate::addr::{IdentityAddr, ResolvingKey, RECORD_LEN};

/// Identity state for one host instance.
///
/// Lives for the host's lifetime: populated by the settings replay,
/// possibly amended by the commit pass, serialized back by the deferred
/// save job. When privacy is active `resolving_keys` stays index-aligned
/// with `identities`.
#[derive(Debug, Clone, Default)]
pub struct IdentityRecords {
    pub identities: Vec<IdentityAddr>,
    pub resolving_keys: Vec<ResolvingKey>,
    pub name: Option<String>,
    pub appearance: Option<u16>,

    /// Controller link is usable; until then every load pass is deferred.
    pub enabled: bool,
    /// Stack initialization has been finalized.
    pub ready: bool,
    /// Identity was supplied by the application before the load; stored
    /// identities are ignored in its favor.
    pub preset_id: bool,
    /// Some identity field was generated rather than loaded and must be
    /// written back.
    pub store_pending: bool,
}

impl IdentityRecords {
    pub fn id_count(&self) -> usize {
        self.identities.len()
    }

    /// Append an identity slot. With privacy active the resolving-key list
    /// grows in lockstep; a missing key is zero-filled so the alignment
    /// invariant holds.
    pub fn push_identity(&mut self, addr: IdentityAddr, irk: Option<ResolvingKey>, privacy: bool) {
        self.identities.push(addr);
        if privacy {
            self.resolving_keys
                .push(irk.unwrap_or_else(ResolvingKey::zeroed));
        }
    }

    /// Drop all identity slots, as done when stored identity data turns
    /// out to be unreadable or corrupt.
    pub fn reset_identities(&mut self) {
        self.identities.clear();
        self.resolving_keys.clear();
    }

    /// Serialized identity list: `id_count` stored records back to back.
    pub fn encode_identities(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.identities.len() * RECORD_LEN);
        for addr in &self.identities {
            out.extend_from_slice(&addr.to_record());
        }
        out
    }

    /// Serialized resolving-key list, index-aligned with the identities.
    pub fn encode_resolving_keys(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.resolving_keys.len() * ResolvingKey::LEN);
        for key in &self.resolving_keys {
            out.extend_from_slice(&key.0);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_without_key_zero_fills_under_privacy() {
        let mut records = IdentityRecords::default();
        records.push_identity(IdentityAddr::random([1; 6]), None, true);
        records.push_identity(
            IdentityAddr::random([2; 6]),
            Some(ResolvingKey([7; 16])),
            true,
        );
        assert_eq!(records.id_count(), 2);
        assert_eq!(records.resolving_keys[0], ResolvingKey::zeroed());
        assert_eq!(records.resolving_keys[1], ResolvingKey([7; 16]));
    }

    #[test]
    fn push_without_privacy_leaves_keys_empty() {
        let mut records = IdentityRecords::default();
        records.push_identity(IdentityAddr::public([1; 6]), None, false);
        assert_eq!(records.id_count(), 1);
        assert!(records.resolving_keys.is_empty());
    }

    #[test]
    fn encoded_lists_are_fixed_stride() {
        let mut records = IdentityRecords::default();
        records.push_identity(IdentityAddr::public([1; 6]), None, true);
        records.push_identity(IdentityAddr::random([2; 6]), None, true);

        let ids = records.encode_identities();
        assert_eq!(ids.len(), 2 * RECORD_LEN);
        assert_eq!(ids[0], 0);
        assert_eq!(ids[RECORD_LEN], 1);

        assert_eq!(
            records.encode_resolving_keys().len(),
            2 * ResolvingKey::LEN
        );
    }

    #[test]
    fn reset_clears_both_lists() {
        let mut records = IdentityRecords::default();
        records.push_identity(IdentityAddr::public([1; 6]), None, true);
        records.reset_identities();
        assert_eq!(records.id_count(), 0);
        assert!(records.resolving_keys.is_empty());
    }
}

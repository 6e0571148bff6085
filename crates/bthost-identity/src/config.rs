/// Capability and sizing configuration for an identity host.
///
/// Capabilities are fixed at construction rather than at compile time so
/// multiple differently-shaped hosts can coexist in one process (and in
/// one test).
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Maximum number of identity slots.
    pub max_identities: usize,

    /// Device name is runtime-configurable and persisted.
    pub dynamic_name: bool,

    /// Appearance is runtime-configurable and persisted.
    pub dynamic_appearance: bool,

    /// Privacy support: resolving keys are kept alongside identities.
    pub privacy: bool,

    /// Name applied at commit when none was loaded.
    pub default_name: String,

    /// Upper bound on a loaded device name, in bytes.
    pub max_name_len: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            max_identities: 1,
            dynamic_name: true,
            dynamic_appearance: false,
            privacy: false,
            default_name: "bthost".to_string(),
            max_name_len: 248,
        }
    }
}

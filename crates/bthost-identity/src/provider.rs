//! Controller-side identity collaborator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::addr::{IdentityAddr, ResolvingKey};
use crate::{IdentityError, IdentityResult};

/// Identity material produced by the controller side.
#[derive(Debug, Clone)]
pub struct GeneratedIdentity {
    pub addr: IdentityAddr,
    /// Resolving key for the generated identity, when the controller side
    /// supports privacy.
    pub irk: Option<ResolvingKey>,
}

/// The controller collaborator consumed by the commit pass.
///
/// The host never generates addresses itself; it asks the controller for a
/// resident public identity first and falls back to a locally generated
/// static random one.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Controller-resident public identity address, `None` when the
    /// controller has none configured.
    async fn public_identity(&self) -> IdentityResult<Option<IdentityAddr>>;

    /// Generate a static random identity. Generated identities must be
    /// persisted by the caller.
    async fn random_identity(&self) -> IdentityResult<GeneratedIdentity>;

    /// Push the default device name down to the controller.
    async fn set_default_name(&self, name: &str) -> IdentityResult<()>;

    /// Final stage of stack initialization; after this the stack is ready
    /// for use.
    async fn finalize_init(&self);
}

/// Canned provider for tests and bring-up rigs.
///
/// Answers from fixed identity material and counts every call so tests can
/// assert on the commit pass ordering.
#[derive(Debug)]
pub struct StaticProvider {
    public: Option<IdentityAddr>,
    random: GeneratedIdentity,
    fail_public: bool,
    fail_random: bool,
    pub public_calls: AtomicUsize,
    pub random_calls: AtomicUsize,
    pub finalize_calls: AtomicUsize,
    pub last_name: Mutex<Option<String>>,
}

impl StaticProvider {
    pub fn new(public: Option<IdentityAddr>, random: GeneratedIdentity) -> Self {
        Self {
            public,
            random,
            fail_public: false,
            fail_random: false,
            public_calls: AtomicUsize::new(0),
            random_calls: AtomicUsize::new(0),
            finalize_calls: AtomicUsize::new(0),
            last_name: Mutex::new(None),
        }
    }

    /// Provider whose controller has no public address.
    pub fn random_only(random: GeneratedIdentity) -> Self {
        Self::new(None, random)
    }

    pub fn failing_public(mut self) -> Self {
        self.fail_public = true;
        self
    }

    pub fn failing_random(mut self) -> Self {
        self.fail_random = true;
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn public_identity(&self) -> IdentityResult<Option<IdentityAddr>> {
        self.public_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_public {
            return Err(IdentityError::Generation(
                "controller rejected public identity read".to_string(),
            ));
        }
        Ok(self.public)
    }

    async fn random_identity(&self) -> IdentityResult<GeneratedIdentity> {
        self.random_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_random {
            return Err(IdentityError::Generation(
                "controller rejected random identity generation".to_string(),
            ));
        }
        Ok(self.random.clone())
    }

    async fn set_default_name(&self, name: &str) -> IdentityResult<()> {
        if let Ok(mut guard) = self.last_name.lock() {
            *guard = Some(name.to_string());
        }
        Ok(())
    }

    async fn finalize_init(&self) {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
    }
}

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tessera_crypto::PublicKey;

use crate::did::public_key_from_did;

/// Finds the public key that should verify signatures made by a DID.
///
/// `None` means "no key material", which callers report as `unknown`,
/// never as `invalid`.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve_key(&self, did: &str) -> Option<PublicKey>;
}

#[async_trait]
impl<T: KeyResolver + ?Sized> KeyResolver for Arc<T> {
    async fn resolve_key(&self, did: &str) -> Option<PublicKey> {
        (**self).resolve_key(did).await
    }
}

/// Keys previously stored in user profiles (DID → base64 public key).
pub struct ProfileKeyResolver {
    keys: DashMap<String, String>,
}

impl ProfileKeyResolver {
    pub fn new() -> Self {
        Self {
            keys: DashMap::new(),
        }
    }

    pub fn insert(&self, did: impl Into<String>, public_key_b64: impl Into<String>) {
        self.keys.insert(did.into(), public_key_b64.into());
    }

    pub fn remove(&self, did: &str) -> Option<String> {
        self.keys.remove(did).map(|(_, key)| key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for ProfileKeyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyResolver for ProfileKeyResolver {
    async fn resolve_key(&self, did: &str) -> Option<PublicKey> {
        let encoded = self.keys.get(did)?.value().clone();
        match PublicKey::from_base64(&encoded) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::debug!(did = did, error = %e, "unusable profile key, skipping");
                None
            }
        }
    }
}

/// Reads the key straight out of a `did:key` identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidKeyResolver;

#[async_trait]
impl KeyResolver for DidKeyResolver {
    async fn resolve_key(&self, did: &str) -> Option<PublicKey> {
        public_key_from_did(did).ok()
    }
}

/// Tries multiple resolvers in order and returns the first key found.
pub struct CompositeKeyResolver {
    resolvers: Vec<Box<dyn KeyResolver>>,
}

impl CompositeKeyResolver {
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Profile data first, then the DID itself.
    pub fn standard(profiles: Arc<ProfileKeyResolver>) -> Self {
        let mut composite = Self::new();
        composite.add_resolver(Box::new(profiles));
        composite.add_resolver(Box::new(DidKeyResolver));
        composite
    }

    pub fn add_resolver(&mut self, resolver: Box<dyn KeyResolver>) {
        self.resolvers.push(resolver);
    }

    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

impl Default for CompositeKeyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyResolver for CompositeKeyResolver {
    async fn resolve_key(&self, did: &str) -> Option<PublicKey> {
        for (index, resolver) in self.resolvers.iter().enumerate() {
            if let Some(key) = resolver.resolve_key(did).await {
                return Some(key);
            }
            tracing::debug!(did = did, resolver = index, "resolver had no key, trying next");
        }
        None
    }
}

//! Fixtures shared by the integration tests.

use std::sync::Arc;

use tessera_core::{ManualClock, MemoryDocument};
use tessera_identity::{Identity, TrustBook, UserDocument};

/// 2023-11-14T22:13:20Z, a fixed starting point for every scenario.
pub const EPOCH_MS: i64 = 1_700_000_000_000;

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::from_millis(EPOCH_MS))
}

/// A named participant with a fresh did:key identity.
pub struct User {
    pub name: &'static str,
    pub identity: Identity,
}

impl User {
    pub fn new(name: &'static str) -> Self {
        let identity = match Identity::generate() {
            Ok(identity) => identity,
            Err(e) => panic!("key generation failed for {}: {}", name, e),
        };
        tracing::debug!(user = name, did = identity.did(), "test user created");
        Self { name, identity }
    }

    pub fn did(&self) -> &str {
        self.identity.did()
    }
}

pub type MemoryTrustBook = TrustBook<MemoryDocument<UserDocument>>;

/// A user together with their trust book, backed by an in-memory document.
pub fn trust_book(name: &'static str, clock: Arc<ManualClock>) -> MemoryTrustBook {
    let user = User::new(name);
    let doc = MemoryDocument::new(UserDocument::for_identity(&user.identity).with_display_name(name));
    TrustBook::new(doc, user.identity, clock)
}

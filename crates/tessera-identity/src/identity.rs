use serde::{Deserialize, Serialize};
use tessera_crypto::{KeyPair, PublicKey};

use crate::did::did_from_public_key;
use crate::error::IdentityError;

/// A device identity: an Ed25519 key pair and the DID derived from it.
#[derive(Debug)]
pub struct Identity {
    did: String,
    keypair: KeyPair,
}

impl Identity {
    pub fn generate() -> Result<Self, IdentityError> {
        let keypair = KeyPair::generate()?;
        Ok(Self::from_keypair(keypair))
    }

    pub fn from_keypair(keypair: KeyPair) -> Self {
        let did = did_from_public_key(&keypair.public_key());
        Self { did, keypair }
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// The form handed to the storage collaborator for persistence.
    pub fn export(&self) -> Result<ExportedKeyPair, IdentityError> {
        Ok(ExportedKeyPair {
            public_key: self.keypair.public_key().to_base64(),
            private_key: self.keypair.to_pkcs8_base64()?,
            did: self.did.clone(),
        })
    }
}

/// Persisted key material: base64 raw public key, base64 PKCS#8 private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedKeyPair {
    pub public_key: String,
    pub private_key: String,
    pub did: String,
}

impl ExportedKeyPair {
    /// Rebuild the identity, checking that all three fields agree.
    pub fn import(&self) -> Result<Identity, IdentityError> {
        let keypair = KeyPair::from_pkcs8_base64(&self.private_key)?;
        let stored_public = PublicKey::from_base64(&self.public_key)?;
        if keypair.public_key() != stored_public {
            return Err(IdentityError::KeyMismatch(
                "stored public key does not belong to the private key".into(),
            ));
        }
        let identity = Identity::from_keypair(keypair);
        if identity.did != self.did {
            return Err(IdentityError::KeyMismatch(format!(
                "stored DID {} does not match key-derived DID {}",
                self.did, identity.did
            )));
        }
        Ok(identity)
    }
}

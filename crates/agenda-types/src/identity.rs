use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Material used to derive an [`Identity`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityMaterial {
    /// Genesis from a raw 32-byte seed.
    GenesisHash([u8; 32]),
    /// Genesis from an ed25519 public key (32 bytes).
    PublicKey([u8; 32]),
    /// A human-readable handle such as `alice`.
    Handle(String),
}

/// The identity of a caller.
///
/// An `Identity` is derived deterministically from [`IdentityMaterial`]
/// using BLAKE3, so the same material always yields the same identity. It is
/// the sole authorization credential: owners are identities, invitees are
/// identities, and every operation runs on behalf of one.
///
/// Serializes as its 64-character hex form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    hash: [u8; 32],
}

impl Identity {
    /// Derive an `Identity` from identity material.
    pub fn derive(material: &IdentityMaterial) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"agenda-identity-v1:");
        match material {
            IdentityMaterial::GenesisHash(h) => {
                hasher.update(b"genesis:");
                hasher.update(h);
            }
            IdentityMaterial::PublicKey(pk) => {
                hasher.update(b"pubkey:");
                hasher.update(pk);
            }
            IdentityMaterial::Handle(handle) => {
                hasher.update(b"handle:");
                hasher.update(handle.as_bytes());
            }
        }
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// Derive the identity behind a handle.
    ///
    /// Handles are trimmed and must be non-empty without inner whitespace.
    pub fn from_handle(handle: &str) -> Result<Self, TypeError> {
        let handle = handle.trim();
        if handle.is_empty() || handle.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidHandle(handle.to_string()));
        }
        Ok(Self::derive(&IdentityMaterial::Handle(handle.to_string())))
    }

    /// Create an ephemeral (random) identity for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self::derive(&IdentityMaterial::GenesisHash(bytes))
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("id:{}", hex::encode(&self.hash[..4]))
    }

    /// Parse from a hex string (64 hex characters, optional `id:` prefix).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("id:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self { hash: arr })
    }

    /// Create from a raw 32-byte hash. Use `derive()` for production code.
    pub fn from_raw(hash: [u8; 32]) -> Self {
        Self { hash }
    }
}

/// Accepts either a full hex identity or a handle.
impl FromStr for Identity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_prefix("id:").unwrap_or(s);
        if bare.len() == 64 && bare.chars().all(|c| c.is_ascii_hexdigit()) {
            return Self::from_hex(bare);
        }
        if s.starts_with("id:") {
            return Err(TypeError::InvalidHex(s.to_string()));
        }
        Self::from_handle(s)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.short_id())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

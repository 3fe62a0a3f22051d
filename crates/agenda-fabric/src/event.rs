use serde::{Deserialize, Serialize};

use agenda_types::{Notification, NotificationKind};

/// A notification as delivered by the fabric.
///
/// Every delivered notification carries its position in the fabric's log
/// and a BLAKE3 integrity hash computed over the sequence number and the
/// notification's canonical JSON encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricEvent {
    /// Position in the fabric log, starting at 1.
    pub seq: u64,
    pub notification: Notification,
    #[serde(with = "hex_hash")]
    pub integrity_hash: [u8; 32],
}

impl FabricEvent {
    /// Build a new `FabricEvent`, computing its integrity hash.
    pub fn new(seq: u64, notification: Notification) -> Self {
        let integrity_hash = Self::compute_integrity(seq, &notification);
        Self {
            seq,
            notification,
            integrity_hash,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        self.notification.kind()
    }

    /// Verify the event's integrity hash matches its content.
    pub fn verify_integrity(&self) -> bool {
        self.integrity_hash == Self::compute_integrity(self.seq, &self.notification)
    }

    /// Short hex form of the integrity hash (first 8 hex chars).
    pub fn short_hash(&self) -> String {
        hex::encode(&self.integrity_hash[..4])
    }

    fn compute_integrity(seq: u64, notification: &Notification) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"agenda-fabric-event-v1:");
        hasher.update(&seq.to_le_bytes());
        if let Ok(body) = serde_json::to_vec(notification) {
            hasher.update(&body);
        }
        *hasher.finalize().as_bytes()
    }
}

impl std::fmt::Display for FabricEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.seq, self.notification)
    }
}

mod hex_hash {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("integrity hash must be 32 bytes"))
    }
}

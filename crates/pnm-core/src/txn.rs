//! Filename → transaction-id correlation.
//!
//! Every generated capture filename gets a transaction id at the moment of
//! generation, before any control message that could cause the device to
//! start writing it. The store is append-only: a cancelled run leaves its
//! registrations intact, and concurrent runs against different devices are
//! safe because filenames are globally unique.

use std::collections::HashMap;

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::capture::CaptureKind;
use crate::device::DeviceIdentity;
use crate::filename::CaptureFilename;

/// Opaque correlation key linking a filename to the request that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    fn new() -> Self {
        TransactionId(Uuid::new_v4())
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Long-lived, process-wide transaction registry.
pub trait TransactionStore: Send + Sync {
    /// Register a freshly generated filename; returns its new id.
    fn register(
        &self,
        device: &DeviceIdentity,
        kind: CaptureKind,
        filename: &CaptureFilename,
    ) -> Result<TransactionId>;

    /// Look up the id registered for a filename, if any.
    fn lookup(&self, filename: &CaptureFilename) -> Option<TransactionId>;
}

/// In-memory append-only store.
#[derive(Default)]
pub struct MemoryTransactionStore {
    entries: RwLock<HashMap<String, TransactionId>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn register(
        &self,
        device: &DeviceIdentity,
        kind: CaptureKind,
        filename: &CaptureFilename,
    ) -> Result<TransactionId> {
        let id = TransactionId::new();
        self.entries
            .write()
            .insert(filename.as_str().to_string(), id);
        debug!(mac = %device.mac_hex(), ?kind, %filename, %id, "registered capture transaction");
        Ok(id)
    }

    fn lookup(&self, filename: &CaptureFilename) -> Option<TransactionId> {
        self.entries.read().get(filename.as_str()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("aa:bb:cc:dd:ee:ff", "192.0.2.10")
    }

    #[test]
    fn test_register_then_lookup() {
        let store = MemoryTransactionStore::new();
        let name = CaptureFilename::from_raw("ds_rxmer_per_subcar_x.bin");
        let id = store
            .register(&identity(), CaptureKind::RxMer, &name)
            .unwrap();
        assert_eq!(store.lookup(&name), Some(id));
    }

    #[test]
    fn test_lookup_unknown_is_none() {
        let store = MemoryTransactionStore::new();
        assert_eq!(
            store.lookup(&CaptureFilename::from_raw("missing.bin")),
            None
        );
    }

    #[test]
    fn test_ids_are_unique_per_registration() {
        let store = MemoryTransactionStore::new();
        let a = store
            .register(
                &identity(),
                CaptureKind::Histogram,
                &CaptureFilename::from_raw("a.bin"),
            )
            .unwrap();
        let b = store
            .register(
                &identity(),
                CaptureKind::Histogram,
                &CaptureFilename::from_raw("b.bin"),
            )
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }
}

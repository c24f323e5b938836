//! Capture filename generation.
//!
//! Filenames must be globally unique: they key the transaction store and
//! independent orchestration runs against different devices may generate
//! them concurrently. Uniqueness comes from the device MAC, a UTC
//! timestamp, and a process-wide monotonic counter that disambiguates
//! generations within the same second.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::capture::CaptureKind;
use crate::device::DeviceIdentity;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A generated capture output filename. Created once, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureFilename(String);

impl CaptureFilename {
    /// Generate a fresh filename for one capture output.
    ///
    /// `suffix` is an optional caller-supplied marker; the UsPreEq "last"
    /// variant and operator-tagged runs use it.
    pub fn generate(kind: CaptureKind, identity: &DeviceIdentity, suffix: Option<&str>) -> Self {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let name = match suffix {
            Some(s) if !s.is_empty() => format!(
                "{}_{}_{}_{}_{:05}.bin",
                kind.file_tag(),
                identity.mac_hex(),
                s,
                timestamp,
                seq
            ),
            _ => format!(
                "{}_{}_{}_{:05}.bin",
                kind.file_tag(),
                identity.mac_hex(),
                timestamp,
                seq
            ),
        };
        CaptureFilename(name)
    }

    /// Wrap an existing filename (tests, replay tooling).
    pub fn from_raw(name: impl Into<String>) -> Self {
        CaptureFilename(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaptureFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CaptureFilename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("aa:bb:cc:dd:ee:ff", "192.0.2.10")
    }

    #[test]
    fn test_consecutive_generations_are_distinct() {
        let id = identity();
        let names: HashSet<_> = (0..1000)
            .map(|_| CaptureFilename::generate(CaptureKind::RxMer, &id, None))
            .collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_filename_embeds_tag_and_mac() {
        let name = CaptureFilename::generate(CaptureKind::ChannelEstimate, &identity(), None);
        assert!(name.as_str().starts_with("ds_chan_est_aabbccddeeff_"));
        assert!(name.as_str().ends_with(".bin"));
    }

    #[test]
    fn test_suffix_is_folded_in() {
        let name = CaptureFilename::generate(CaptureKind::UsPreEq, &identity(), Some("last"));
        assert!(name.as_str().contains("_last_"));
    }
}

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::document::UploadedDocument;

/// Identity of an upload batch.
///
/// SHA-256 over the sorted `(source_id, sha256(bytes))` pairs: the order in
/// which files arrive does not matter, a changed file under the same name does.
/// Only the first document per source id counts, matching what gets loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchFingerprint(String);

impl BatchFingerprint {
    pub fn of(batch: &[UploadedDocument]) -> Self {
        let mut seen = HashSet::new();
        let mut entries: Vec<(&str, String)> = batch
            .iter()
            .filter(|doc| seen.insert(doc.source_id.as_str()))
            .map(|doc| (doc.source_id.as_str(), content_hash(&doc.bytes)))
            .collect();
        entries.sort();

        let mut hasher = Sha256::new();
        for (source_id, hash) in entries {
            hasher.update(source_id.as_bytes());
            hasher.update([0u8]);
            hasher.update(hash.as_bytes());
            hasher.update(b"\n");
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for logs.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for BatchFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex SHA-256 of a document's bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

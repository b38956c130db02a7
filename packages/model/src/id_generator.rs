use crc32fast::Hasher;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a stable document ID from a document name using CRC32
pub fn get_document_id(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for blocks and items
///
/// IDs have the form `{seed}-{n}`. Any id registered through [`reserve`]
/// (typically everything already present in a loaded document) is never
/// handed out.
///
/// [`reserve`]: IDGenerator::reserve
#[derive(Debug, Clone)]
pub struct IDGenerator {
    seed: String,
    count: u64,
    reserved: HashSet<String>,
}

impl IDGenerator {
    /// Deterministic generator for a document name
    pub fn new(name: &str) -> Self {
        Self::from_seed(get_document_id(name))
    }

    /// Generator seeded from the document name and the current time, so
    /// two sessions on the same document produce different ids
    pub fn for_session(name: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self::from_seed(get_document_id(&format!("{}@{}", name, nanos)))
    }

    pub fn from_seed(seed: String) -> Self {
        Self {
            seed,
            count: 0,
            reserved: HashSet::new(),
        }
    }

    /// Generate the next unused ID
    pub fn new_id(&mut self) -> String {
        loop {
            self.count += 1;
            let id = format!("{}-{}", self.seed, self.count);
            if self.reserved.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Mark an externally created id as taken
    pub fn reserve(&mut self, id: impl Into<String>) {
        self.reserved.insert(id.into());
    }

    pub fn reserve_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.reserve(id);
        }
    }

    pub fn is_reserved(&self, id: &str) -> bool {
        self.reserved.contains(id)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

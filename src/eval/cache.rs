//! Test evaluation cache — content-addressed memoization of test outcomes
//!
//! Compiling and running a variant dominates search cost, and many
//! variants render to identical source. Outcomes are keyed by the digest
//! of the rendered content plus the test, so any variant with the same
//! content reuses an earlier verdict whatever edits produced it.
//!
//! On-disk layout: 8-byte magic, SHA-256 of the payload, bincode payload.
//! A missing, truncated, tampered or version-mismatched file restores as an
//! empty cache.

use super::TestCase;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default cache location, relative to the working directory
pub const DEFAULT_CACHE_PATH: &str = "repair.cache";

const CACHE_MAGIC: &[u8; 8] = b"RPRCACHE";
const CACHE_FORMAT_VERSION: u32 = 1;

/// SHA-256 fingerprint of a variant's rendered content
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of(content: impl AsRef<[u8]>) -> Self {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&Sha256::digest(content.as_ref()));
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Leading hex digits, enough to name scratch files
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.short())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("corrupt cache file: {0}")]
    Corrupt(String),

    #[error("cache format version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    digest: ContentDigest,
    test: TestCase,
    passed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    saved_at: DateTime<Utc>,
    records: Vec<CacheRecord>,
}

/// Process-wide (digest, test) → passed mapping plus session bookkeeping.
///
/// One process owns a cache file at a time; nothing here synchronizes
/// concurrent writers.
#[derive(Debug)]
pub struct TestCache {
    entries: HashMap<(ContentDigest, TestCase), bool>,
    /// Pairs actually run this session
    evaluated: HashSet<(ContentDigest, TestCase)>,
    path: PathBuf,
}

impl TestCache {
    /// Empty cache that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            entries: HashMap::new(),
            evaluated: HashSet::new(),
            path: path.into(),
        }
    }

    /// Load the cache at `path`, falling back to empty on any problem
    pub fn restore(path: impl Into<PathBuf>) -> Self {
        let mut cache = Self::new(path);
        if !cache.path.exists() {
            debug!("No test cache at {}, starting empty", cache.path.display());
            return cache;
        }
        match Self::read_file(&cache.path) {
            Ok(file) => {
                cache.entries = file
                    .records
                    .into_iter()
                    .map(|r| ((r.digest, r.test), r.passed))
                    .collect();
                info!(
                    "Restored {} cached test outcomes from {} (saved {})",
                    cache.entries.len(), cache.path.display(), file.saved_at
                );
            }
            Err(e) => warn!("Ignoring test cache {}: {}", cache.path.display(), e),
        }
        cache
    }

    fn read_file(path: &Path) -> Result<CacheFile, CacheError> {
        let data = std::fs::read(path)?;
        let header = CACHE_MAGIC.len() + 32;
        if data.len() < header || &data[..CACHE_MAGIC.len()] != CACHE_MAGIC {
            return Err(CacheError::Corrupt("missing header".into()));
        }
        let (checksum, payload) = data[CACHE_MAGIC.len()..].split_at(32);
        if Sha256::digest(payload).as_slice() != checksum {
            return Err(CacheError::Corrupt("checksum mismatch".into()));
        }
        let file: CacheFile = bincode::deserialize(payload)?;
        if file.version != CACHE_FORMAT_VERSION {
            return Err(CacheError::Version {
                found: file.version,
                expected: CACHE_FORMAT_VERSION,
            });
        }
        Ok(file)
    }

    /// Write every entry to the cache path, replacing any existing file
    pub fn persist(&self) -> Result<(), CacheError> {
        let mut records: Vec<CacheRecord> = self
            .entries
            .iter()
            .map(|(&(digest, test), &passed)| CacheRecord { digest, test, passed })
            .collect();
        records.sort_by(|a, b| (a.digest, a.test).cmp(&(b.digest, b.test)));

        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            saved_at: Utc::now(),
            records,
        };
        let payload = bincode::serialize(&file)?;
        let mut data = Vec::with_capacity(CACHE_MAGIC.len() + 32 + payload.len());
        data.extend_from_slice(CACHE_MAGIC);
        data.extend_from_slice(&Sha256::digest(&payload));
        data.extend_from_slice(&payload);

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, data)?;
        info!("Persisted {} test outcomes to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    /// Cached verdict, or `None` when this pair was never recorded
    pub fn query(&self, digest: &ContentDigest, test: TestCase) -> Option<bool> {
        self.entries.get(&(*digest, test)).copied()
    }

    pub fn add(&mut self, digest: ContentDigest, test: TestCase, passed: bool) {
        self.entries.insert((digest, test), passed);
    }

    /// Note that `(digest, test)` was run rather than served from cache
    pub fn record_evaluation(&mut self, digest: ContentDigest, test: TestCase) {
        self.evaluated.insert((digest, test));
    }

    /// Distinct pairs evaluated this session
    pub fn evaluated_count(&self) -> usize {
        self.evaluated.len()
    }

    pub fn reset_session(&mut self) {
        self.evaluated.clear();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.evaluated.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

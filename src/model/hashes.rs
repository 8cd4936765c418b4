use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use super::LinkHash;

/// Digest algorithms an index may publish, weakest first.
pub const HASH_ALGORITHMS: &[&str] = &["md5", "sha1", "sha224", "sha256", "sha384", "sha512"];

/// Allowed digests per algorithm. An empty set means hash checking is off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hashes(BTreeMap<String, BTreeSet<String>>);

impl Hashes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn insert(&mut self, algorithm: &str, hex: &str) -> Result<()> {
        let algorithm = algorithm.to_ascii_lowercase();
        if !HASH_ALGORITHMS.contains(&algorithm.as_str()) {
            bail!(
                "Unknown hash algorithm '{}'. Supported: {}",
                algorithm,
                HASH_ALGORITHMS.join(", ")
            );
        }
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Invalid {} digest '{}'", algorithm, hex);
        }
        self.0
            .entry(algorithm)
            .or_default()
            .insert(hex.to_ascii_lowercase());
        Ok(())
    }

    pub fn is_allowed(&self, digest: &LinkHash) -> bool {
        self.0
            .get(&digest.algorithm)
            .is_some_and(|allowed| allowed.contains(&digest.hex))
    }
}

impl FromStr for Hashes {
    type Err = anyhow::Error;

    /// Parse `<algorithm>:<hex>` entries separated by commas or whitespace.
    fn from_str(s: &str) -> Result<Self> {
        let mut hashes = Hashes::new();
        for entry in s.split(|c: char| c == ',' || c.is_whitespace()) {
            if entry.is_empty() {
                continue;
            }
            let Some((algorithm, hex)) = entry.split_once(':') else {
                bail!("Invalid hash '{}'. Expected '<algorithm>:<hex>'.", entry);
            };
            hashes.insert(algorithm, hex)?;
        }
        Ok(hashes)
    }
}

//! The address cache: a flat JSON mapping from contract name to deployed address.
//!
//! An entry's presence means the contract is already deployed. Entries are
//! written at most once and never removed, and the whole mapping is rewritten
//! to disk after every insertion.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;

use crate::errors::ScriptError;

/// The suffix appended to the cache path while a new version is being written
const TMP_SUFFIX: &str = "tmp";

/// A persisted mapping from logical contract names to deployed addresses
#[derive(Debug, Clone)]
pub struct AddressCache {
    /// The file backing the cache
    path: PathBuf,
    /// The cached addresses, keyed by contract name
    entries: BTreeMap<String, Address>,
}

impl AddressCache {
    /// Load the cache from the given file.
    ///
    /// A missing file yields an empty cache; the file is created on the first insertion.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ScriptError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
            });
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ReadCache(format!("{}: {}", path.display(), e)))?;
        let entries = if contents.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| ScriptError::ReadCache(format!("{}: {}", path.display(), e)))?
        };

        Ok(Self { path, entries })
    }

    /// The file backing the cache
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached address for `name`, if any
    pub fn get(&self, name: &str) -> Option<Address> {
        self.entries.get(name).copied()
    }

    /// Whether `name` has been deployed
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the cached `(name, address)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.entries
            .iter()
            .map(|(name, addr)| (name.as_str(), *addr))
    }

    /// Record `address` under `name` and flush the cache to disk.
    ///
    /// Fails if `name` is already cached. If the flush fails, the in-memory
    /// cache is left as it was before the call.
    pub fn insert(&mut self, name: &str, address: Address) -> Result<(), ScriptError> {
        if let Some(existing) = self.entries.get(name) {
            return Err(ScriptError::CacheConflict(format!(
                "`{}` is already cached at {:#x}",
                name, existing
            )));
        }

        self.entries.insert(name.to_string(), address);
        if let Err(e) = self.flush() {
            self.entries.remove(name);
            return Err(e);
        }

        Ok(())
    }

    /// Rewrite the whole cache file, via a temporary file in the same directory
    fn flush(&self) -> Result<(), ScriptError> {
        let contents = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ScriptError::WriteCache(e.to_string()))?;

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".");
        tmp_path.push(TMP_SUFFIX);
        let tmp_path = PathBuf::from(tmp_path);

        fs::write(&tmp_path, contents)
            .map_err(|e| ScriptError::WriteCache(format!("{}: {}", tmp_path.display(), e)))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| ScriptError::WriteCache(format!("{}: {}", self.path.display(), e)))
    }
}

// In-memory registry tree for exercising the scan logic in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};

use super::{Hive, RegistryKey, RegistryStore};

#[derive(Debug, Default)]
struct Tree {
    keys: BTreeMap<(Hive, String), BTreeMap<String, String>>,
    failing: BTreeSet<String>,
}

/// A fake registry holding keys and string values in memory.
///
/// Clones share the same tree, so a test can keep one handle for
/// assertions while the code under test mutates another.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    tree: Arc<Mutex<Tree>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a key and all of its ancestors.
    pub fn insert_key(&self, hive: Hive, path: &str) {
        let mut tree = self.tree.lock().unwrap();
        let mut current = String::new();
        for segment in path.split('\\') {
            if !current.is_empty() {
                current.push('\\');
            }
            current.push_str(segment);
            tree.keys.entry((hive, current.clone())).or_default();
        }
    }

    /// Create a key (with ancestors) holding one string value.
    pub fn insert_string(&self, hive: Hive, path: &str, name: &str, value: &str) {
        self.insert_key(hive, path);
        let mut tree = self.tree.lock().unwrap();
        tree.keys
            .get_mut(&(hive, path.to_string()))
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    /// Read a value back for assertions.
    pub fn read_string(&self, hive: Hive, path: &str, name: &str) -> Option<String> {
        let tree = self.tree.lock().unwrap();
        tree.keys.get(&(hive, path.to_string()))?.get(name).cloned()
    }

    /// Make every subsequent open of `path` fail.
    pub fn fail_path(&self, path: &str) {
        self.tree.lock().unwrap().failing.insert(path.to_string());
    }

    fn open_handle(&self, hive: Hive, path: &str, writable: bool) -> Result<Option<MemoryKey>> {
        let tree = self.tree.lock().unwrap();
        if tree.failing.contains(path) {
            bail!("access denied: {path}");
        }
        if !tree.keys.contains_key(&(hive, path.to_string())) {
            return Ok(None);
        }
        Ok(Some(MemoryKey {
            tree: Arc::clone(&self.tree),
            hive,
            path: path.to_string(),
            writable,
        }))
    }
}

impl RegistryStore for MemoryRegistry {
    type Key = MemoryKey;

    fn open(&self, hive: Hive, path: &str) -> Result<Option<MemoryKey>> {
        self.open_handle(hive, path, false)
    }

    fn open_writable(&self, hive: Hive, path: &str) -> Result<Option<MemoryKey>> {
        self.open_handle(hive, path, true)
    }
}

/// Handle onto one key of a [`MemoryRegistry`].
#[derive(Debug)]
pub struct MemoryKey {
    tree: Arc<Mutex<Tree>>,
    hive: Hive,
    path: String,
    writable: bool,
}

impl RegistryKey for MemoryKey {
    fn subkey_names(&self) -> Result<Vec<String>> {
        let tree = self.tree.lock().unwrap();
        let prefix = format!("{}\\", self.path);
        let names = tree
            .keys
            .keys()
            .filter(|(hive, path)| *hive == self.hive && path.starts_with(&prefix))
            .filter_map(|(_, path)| {
                let rest = &path[prefix.len()..];
                (!rest.contains('\\')).then(|| rest.to_string())
            })
            .collect();
        Ok(names)
    }

    fn get_string(&self, name: &str) -> Result<Option<String>> {
        let tree = self.tree.lock().unwrap();
        let Some(values) = tree.keys.get(&(self.hive, self.path.clone())) else {
            bail!("key deleted concurrently: {}", self.path);
        };
        Ok(values.get(name).cloned())
    }

    fn set_string(&self, name: &str, value: &str) -> Result<()> {
        if !self.writable {
            bail!("key opened read-only: {}", self.path);
        }
        let mut tree = self.tree.lock().unwrap();
        let Some(values) = tree.keys.get_mut(&(self.hive, self.path.clone())) else {
            bail!("key deleted concurrently: {}", self.path);
        };
        values.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_opens_as_none() {
        let store = MemoryRegistry::new();
        assert!(store.open(Hive::Users, r"S-1-5-21-1\Software").unwrap().is_none());
    }

    #[test]
    fn insert_creates_ancestors() {
        let store = MemoryRegistry::new();
        store.insert_key(Hive::Users, r"S-1-5-21-1\Software\Vendor\App");

        let key = store.open(Hive::Users, r"S-1-5-21-1\Software\Vendor").unwrap().unwrap();
        assert_eq!(key.subkey_names().unwrap(), vec!["App".to_string()]);
    }

    #[test]
    fn subkey_names_are_immediate_children_only() {
        let store = MemoryRegistry::new();
        store.insert_key(Hive::Users, r"root\a\deep");
        store.insert_key(Hive::Users, r"root\b");

        let key = store.open(Hive::Users, "root").unwrap().unwrap();
        assert_eq!(key.subkey_names().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn read_only_handle_rejects_writes() {
        let store = MemoryRegistry::new();
        store.insert_key(Hive::Users, "key");

        let key = store.open(Hive::Users, "key").unwrap().unwrap();
        assert!(key.set_string("name", "value").is_err());

        let key = store.open_writable(Hive::Users, "key").unwrap().unwrap();
        key.set_string("name", "value").unwrap();
        assert_eq!(key.get_string("name").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn failing_path_errors_on_open() {
        let store = MemoryRegistry::new();
        store.insert_key(Hive::Users, "key");
        store.fail_path("key");
        assert!(store.open(Hive::Users, "key").is_err());
        assert!(store.open_writable(Hive::Users, "key").is_err());
    }
}

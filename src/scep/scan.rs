use crate::registry::{Hive, RegistryKey, RegistryStore};

use super::{PROFILE_LIST_KEY, PatchResult, patch_entry, scan_root};

/// Counts for one scan cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Profiles enumerated.
    pub profiles: usize,
    /// Enrollment entries examined.
    pub entries: usize,
    /// Entries rewritten this cycle.
    pub patched: usize,
}

/// List the SIDs of every local user profile.
///
/// A missing or unreadable profile list yields an empty vector; the
/// scan simply has nothing to do this cycle. No ordering guarantee.
pub fn list_profiles<S: RegistryStore>(store: &S) -> Vec<String> {
    let key = match store.open(Hive::LocalMachine, PROFILE_LIST_KEY) {
        Ok(Some(key)) => key,
        Ok(None) => {
            tracing::debug!("Profile list key not found: {PROFILE_LIST_KEY}");
            return Vec::new();
        }
        Err(e) => {
            tracing::error!("Failed to open profile list: {e:#}");
            return Vec::new();
        }
    };

    match key.subkey_names() {
        Ok(names) => names,
        Err(e) => {
            tracing::error!("Failed to enumerate profiles: {e:#}");
            Vec::new()
        }
    }
}

/// List the enrollment entry names beneath one profile's MobileIron
/// subtree. An absent subtree means the profile has no SCEP config.
pub fn find_entries<S: RegistryStore>(store: &S, profile_id: &str) -> Vec<String> {
    let path = scan_root(profile_id);
    let key = match store.open(Hive::Users, &path) {
        Ok(Some(key)) => key,
        Ok(None) => {
            tracing::debug!("Registry key not found: {path}");
            return Vec::new();
        }
        Err(e) => {
            tracing::error!("Failed to open {path}: {e:#}");
            return Vec::new();
        }
    };
    tracing::debug!("Found registry key {path}");

    match key.subkey_names() {
        Ok(names) => names,
        Err(e) => {
            tracing::error!("Failed to enumerate entries under {path}: {e:#}");
            Vec::new()
        }
    }
}

/// Scan every profile once, patching whatever qualifies.
pub fn run_cycle<S: RegistryStore>(store: &S) -> CycleSummary {
    let mut summary = CycleSummary::default();

    // SCEP enrollment config lives under HKCU, so every profile on the
    // machine has to be walked through HKU.
    for profile_id in list_profiles(store) {
        tracing::debug!("Processing profile {profile_id}");
        summary.profiles += 1;

        for entry_name in find_entries(store, &profile_id) {
            summary.entries += 1;
            if patch_entry(store, &profile_id, &entry_name) == PatchResult::Patched {
                summary.patched += 1;
            }
        }
    }

    summary
}

use anyhow::Result;

use crate::registry::{Hive, RegistryKey, RegistryStore};

use super::{SAN_VALUE_NAME, install_key};

/// SAN type tag the MDM agent provisions: Other Name (NT Principal Name).
const OTHER_NAME_TAG: &str = ";1+";

/// SAN type tag the certificate installer expects: UPN.
const UPN_TAG: &str = ";11+";

/// Outcome of examining a single enrollment entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchResult {
    /// The SAN value is present and carries no tag to rewrite.
    Unchanged,
    /// The SAN value was rewritten in place.
    Patched,
    /// Nothing to do: no install node, no value, or the entry could
    /// not be accessed.
    Skipped,
}

/// Rewrite every Other Name SAN type tag to the UPN tag.
///
/// `None` when the value carries no tag, which also makes a second
/// application over an already-patched value a no-op: `;11+` does not
/// contain `;1+`, so one rewrite removes every match.
pub fn rewrite_san_types(value: &str) -> Option<String> {
    if value.contains(OTHER_NAME_TAG) {
        Some(value.replace(OTHER_NAME_TAG, UPN_TAG))
    } else {
        None
    }
}

/// Examine one enrollment entry and patch its SAN value if needed.
///
/// Store failures are confined to this entry: logged, reported as
/// `Skipped`, and the surrounding scan keeps going.
pub fn patch_entry<S: RegistryStore>(store: &S, profile_id: &str, entry_name: &str) -> PatchResult {
    match try_patch_entry(store, profile_id, entry_name) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(
                "Failed to patch entry {} for profile {}: {:#}",
                entry_name,
                profile_id,
                e
            );
            PatchResult::Skipped
        }
    }
}

fn try_patch_entry<S: RegistryStore>(
    store: &S,
    profile_id: &str,
    entry_name: &str,
) -> Result<PatchResult> {
    let path = install_key(profile_id, entry_name);

    let Some(key) = store.open_writable(Hive::Users, &path)? else {
        // The MDM agent has not written the install record yet.
        tracing::debug!("No install key at {path}");
        return Ok(PatchResult::Skipped);
    };
    tracing::debug!("Found install key at {path}");

    let Some(san) = key.get_string(SAN_VALUE_NAME)? else {
        return Ok(PatchResult::Skipped);
    };
    tracing::debug!("Current SAN value: {san}");

    match rewrite_san_types(&san) {
        Some(patched) => {
            key.set_string(SAN_VALUE_NAME, &patched)?;
            tracing::info!(r"SCEP SAN type patched at {path}\{SAN_VALUE_NAME}");
            Ok(PatchResult::Patched)
        }
        None => Ok(PatchResult::Unchanged),
    }
}

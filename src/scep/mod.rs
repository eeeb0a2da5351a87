// Detection and correction of MobileIron SCEP enrollment entries.
//
// The MDM agent provisions one entry per pending enrollment beneath a
// profile's SCEP\MobileIron subtree; the patcher rewrites the SAN type
// it selects before the certificate installer picks the entry up.

mod patch;
mod scan;

pub use patch::{PatchResult, patch_entry, rewrite_san_types};
pub use scan::{CycleSummary, find_entries, list_profiles, run_cycle};

/// Machine-hive key whose child names are the local profile SIDs.
pub const PROFILE_LIST_KEY: &str = r"Software\Microsoft\Windows NT\CurrentVersion\ProfileList";

/// Name of the string value holding the encoded SAN list.
pub const SAN_VALUE_NAME: &str = "SubjectAlternativeNames";

/// MobileIron SCEP subtree beneath one profile's hive.
pub fn scan_root(profile_id: &str) -> String {
    format!(r"{profile_id}\Software\Microsoft\SCEP\MobileIron")
}

/// Install node carrying the enrollment parameters for one entry.
pub fn install_key(profile_id: &str, entry_name: &str) -> String {
    format!(r"{profile_id}\Software\Microsoft\SCEP\MobileIron\{entry_name}\Install")
}

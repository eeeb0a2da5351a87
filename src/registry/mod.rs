// Minimal key-value-tree access used by the scanner and patcher.
//
// The live implementation wraps the Windows registry; tests use an
// in-memory tree so the scan logic runs on any platform.

use anyhow::Result;

#[cfg(test)]
pub mod memory;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "windows")]
pub use windows::WindowsRegistry;

/// Registry hive a path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Hive {
    /// HKEY_LOCAL_MACHINE
    LocalMachine,
    /// HKEY_USERS
    Users,
}

/// A key-value tree shaped like the Windows registry.
///
/// Opens distinguish "absent" (`Ok(None)`) from "failed" (`Err`):
/// callers treat the former as nothing-to-do and must confine the
/// latter to the entry or profile being processed.
pub trait RegistryStore {
    type Key: RegistryKey;

    /// Open a key read-only. `Ok(None)` when the path does not exist.
    fn open(&self, hive: Hive, path: &str) -> Result<Option<Self::Key>>;

    /// Open a key for reading and writing. `Ok(None)` when absent.
    fn open_writable(&self, hive: Hive, path: &str) -> Result<Option<Self::Key>>;
}

/// An open key handle.
pub trait RegistryKey {
    /// Names of the immediate child keys.
    fn subkey_names(&self) -> Result<Vec<String>>;

    /// Read a string value. `Ok(None)` when the value is absent.
    fn get_string(&self, name: &str) -> Result<Option<String>>;

    /// Write a string value in place.
    fn set_string(&self, name: &str, value: &str) -> Result<()>;
}

use anyhow::{Context, Result};
use std::io;

use winreg::RegKey;
use winreg::enums::{HKEY_LOCAL_MACHINE, HKEY_USERS, KEY_READ, KEY_WRITE};

use super::{Hive, RegistryKey, RegistryStore};

/// The live Windows registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsRegistry;

fn root(hive: Hive) -> RegKey {
    match hive {
        Hive::LocalMachine => RegKey::predef(HKEY_LOCAL_MACHINE),
        Hive::Users => RegKey::predef(HKEY_USERS),
    }
}

fn hive_name(hive: Hive) -> &'static str {
    match hive {
        Hive::LocalMachine => "HKLM",
        Hive::Users => "HKU",
    }
}

fn open_with_flags(hive: Hive, path: &str, flags: u32) -> Result<Option<RegKey>> {
    match root(hive).open_subkey_with_flags(path, flags) {
        Ok(key) => Ok(Some(key)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| {
            format!("Failed to open registry key: {}\\{}", hive_name(hive), path)
        }),
    }
}

impl RegistryStore for WindowsRegistry {
    type Key = RegKey;

    fn open(&self, hive: Hive, path: &str) -> Result<Option<RegKey>> {
        open_with_flags(hive, path, KEY_READ)
    }

    fn open_writable(&self, hive: Hive, path: &str) -> Result<Option<RegKey>> {
        open_with_flags(hive, path, KEY_READ | KEY_WRITE)
    }
}

impl RegistryKey for RegKey {
    fn subkey_names(&self) -> Result<Vec<String>> {
        self.enum_keys()
            .collect::<io::Result<Vec<_>>>()
            .context("Failed to enumerate subkeys")
    }

    fn get_string(&self, name: &str) -> Result<Option<String>> {
        match self.get_value::<String, _>(name) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read registry value: {}", name))
            }
        }
    }

    fn set_string(&self, name: &str, value: &str) -> Result<()> {
        self.set_value(name, &value)
            .with_context(|| format!("Failed to set registry value: {}", name))
    }
}

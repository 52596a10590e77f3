/// Secure storage for the dashboard credential
///
/// Uses OS-backed secure storage:
/// - macOS/iOS: Keychain
/// - Linux: Secret Service API (gnome-keyring, KWallet, etc.)
/// - Windows: Credential Manager
use keyring::Entry;
use std::fmt;

use crate::config::Credential;

const SERVICE_NAME: &str = "com.starry.console";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureKey {
    DashboardToken,
    SessionCookie,
}

impl SecureKey {
    fn key_name(&self) -> &'static str {
        match self {
            SecureKey::DashboardToken => "dashboard_token",
            SecureKey::SessionCookie => "session_cookie",
        }
    }
}

impl fmt::Display for SecureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SecureStorageError {
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(SecureKey),
}

pub struct SecureStorage;

impl SecureStorage {
    /// Store a secret value in secure storage
    pub fn set(key: SecureKey, value: &str) -> Result<(), SecureStorageError> {
        let entry = Entry::new(SERVICE_NAME, key.key_name())?;
        entry.set_password(value)?;
        Ok(())
    }

    /// Retrieve a secret value from secure storage
    pub fn get(key: SecureKey) -> Result<String, SecureStorageError> {
        let entry = Entry::new(SERVICE_NAME, key.key_name())?;
        match entry.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => Err(SecureStorageError::KeyNotFound(key)),
            Err(e) => Err(SecureStorageError::Keyring(e)),
        }
    }

    /// Delete a secret value from secure storage
    pub fn delete(key: SecureKey) -> Result<(), SecureStorageError> {
        let entry = Entry::new(SERVICE_NAME, key.key_name())?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted is success
            Err(e) => Err(SecureStorageError::Keyring(e)),
        }
    }

    /// Persist the operator credential, replacing whichever kind was stored before
    pub fn store_credential(credential: &Credential) -> Result<(), SecureStorageError> {
        match credential {
            Credential::Bearer(token) => {
                Self::set(SecureKey::DashboardToken, token)?;
                Self::delete(SecureKey::SessionCookie)
            }
            Credential::SessionCookie(cookie) => {
                Self::set(SecureKey::SessionCookie, cookie)?;
                Self::delete(SecureKey::DashboardToken)
            }
        }
    }

    /// Stored credential, token first. Keyring failures read as "none stored".
    pub fn load_credential() -> Option<Credential> {
        match Self::get(SecureKey::DashboardToken) {
            Ok(token) => return Some(Credential::Bearer(token)),
            Err(SecureStorageError::KeyNotFound(_)) => {}
            Err(e) => tracing::warn!("Failed to read dashboard token: {}", e),
        }
        match Self::get(SecureKey::SessionCookie) {
            Ok(cookie) => Some(Credential::SessionCookie(cookie)),
            Err(SecureStorageError::KeyNotFound(_)) => None,
            Err(e) => {
                tracing::warn!("Failed to read session cookie: {}", e);
                None
            }
        }
    }

    pub fn clear_credential() -> Result<(), SecureStorageError> {
        Self::delete(SecureKey::DashboardToken)?;
        Self::delete(SecureKey::SessionCookie)
    }
}

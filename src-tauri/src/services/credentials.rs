//! Credential storage service using the OS keychain.
//!
//! This module provides secure storage for AgroPec session tokens using
//! the system's native credential storage (Keychain on macOS, Credential
//! Manager on Windows, Secret Service on Linux). The web version of the
//! app keeps these in browser local storage; the companion app upgrades
//! them to the keychain.

use crate::error::AppError;
use keyring::Entry;

/// Service name used in the keychain.
const SERVICE_NAME: &str = "agropec-companion";

/// Which credential slot a token belongs to.
///
/// Presence of either slot counts as "authenticated" for routing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSlot {
    /// Regular attendee session token.
    Attendee,
    /// Administrator session token.
    Admin,
}

impl TokenSlot {
    /// Fixed account name for this slot.
    fn account(self) -> &'static str {
        match self {
            Self::Attendee => "attendee-token",
            Self::Admin => "admin-token",
        }
    }
}

/// Credential storage operations.
pub struct CredentialService;

impl CredentialService {
    /// Store a token in the given slot, overwriting any previous value.
    pub fn store_token(slot: TokenSlot, token: &str) -> Result<(), AppError> {
        let entry = Self::get_entry(slot)?;

        entry
            .set_password(token)
            .map_err(|e| AppError::credential_storage(format!("Failed to store token: {}", e)))
    }

    /// Retrieve the token in the given slot.
    ///
    /// # Returns
    /// The stored token, or a not-found error if the slot is empty.
    pub fn get_token(slot: TokenSlot) -> Result<String, AppError> {
        let entry = Self::get_entry(slot)?;

        entry.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => AppError::not_found_with_id("credential", slot.account()),
            _ => AppError::credential_storage(format!("Failed to retrieve token: {}", e)),
        })
    }

    /// Delete the token in the given slot.
    ///
    /// This operation is idempotent - deleting an empty slot is not an error.
    pub fn delete_token(slot: TokenSlot) -> Result<(), AppError> {
        let entry = Self::get_entry(slot)?;

        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Idempotent: already deleted
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to delete token: {}",
                e
            ))),
        }
    }

    /// Check whether a token exists in the given slot.
    pub fn has_token(slot: TokenSlot) -> Result<bool, AppError> {
        let entry = Self::get_entry(slot)?;

        match entry.get_password() {
            Ok(_) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to check token: {}",
                e
            ))),
        }
    }

    /// Whether any session token is present at all.
    pub fn has_any_token() -> Result<bool, AppError> {
        Ok(Self::has_token(TokenSlot::Attendee)? || Self::has_token(TokenSlot::Admin)?)
    }

    /// Create a keyring entry for the given slot.
    fn get_entry(slot: TokenSlot) -> Result<Entry, AppError> {
        Entry::new(SERVICE_NAME, slot.account()).map_err(|e| {
            AppError::credential_storage(format!("Failed to create keyring entry: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_accounts_are_distinct() {
        assert_eq!(TokenSlot::Attendee.account(), "attendee-token");
        assert_eq!(TokenSlot::Admin.account(), "admin-token");
        assert_ne!(TokenSlot::Attendee.account(), TokenSlot::Admin.account());
    }

    // Note: Integration tests for actual keychain operations would require
    // a test keychain or mocking. These are best done as manual tests or
    // in a CI environment with proper keychain access.
}

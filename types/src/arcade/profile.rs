use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{INITIAL_BALANCE, MAX_NAME_LENGTH};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileInvariantError {
    #[error("display name is empty")]
    EmptyName,
    #[error("display name too long (len={len}, max={max})")]
    NameTooLong { len: usize, max: usize },
}

/// Local player profile, persisted under [`super::PROFILE_KEY`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub balance: u64,
    pub setup_complete: bool,
}

impl Profile {
    /// Create an onboarded profile.
    pub fn new(name: String) -> Result<Self, ProfileInvariantError> {
        let profile = Self {
            name: name.trim().to_string(),
            balance: INITIAL_BALANCE,
            setup_complete: true,
        };
        profile.validate_invariants()?;
        Ok(profile)
    }

    pub fn validate_invariants(&self) -> Result<(), ProfileInvariantError> {
        if self.setup_complete && self.name.is_empty() {
            return Err(ProfileInvariantError::EmptyName);
        }
        let len = self.name.chars().count();
        if len > MAX_NAME_LENGTH {
            return Err(ProfileInvariantError::NameTooLong {
                len,
                max: MAX_NAME_LENGTH,
            });
        }
        Ok(())
    }

    /// Rename an existing profile, keeping the old name on error.
    pub fn rename(&mut self, name: &str) -> Result<(), ProfileInvariantError> {
        let previous = std::mem::replace(&mut self.name, name.trim().to_string());
        if let Err(err) = self.validate_invariants() {
            self.name = previous;
            return Err(err);
        }
        Ok(())
    }
}

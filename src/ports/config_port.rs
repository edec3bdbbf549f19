//! Configuration access port trait.

use crate::domain::error::CrossoverError;

/// Section/key lookups over a loaded configuration.
///
/// Only `get_string` is backend-specific; typed access is layered on top so
/// every source reports malformed values the same way.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// A non-blank value, or `ConfigMissing`.
    fn require_string(&self, section: &str, key: &str) -> Result<String, CrossoverError> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CrossoverError::ConfigMissing {
                section: section.into(),
                key: key.into(),
            })
    }

    /// `default` when the key is absent; a present non-integer is `ConfigInvalid`.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, CrossoverError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| CrossoverError::ConfigInvalid {
                    section: section.into(),
                    key: key.into(),
                    reason: format!("expected an integer, got '{raw}'"),
                }),
        }
    }
}

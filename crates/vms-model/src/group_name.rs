//! Validated group names.
//!
//! Group names identify vaccination types and the groups they belong to, and
//! are what patients store (as soft references) in their allergy and vaccine
//! sets. Comparison is case-sensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use vms_core::StoreError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    pub const MAX_LENGTH: usize = 30;

    /// Trim and validate `name`.
    pub fn new(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        let trimmed = name.trim();
        if !Self::is_valid(trimmed) {
            return Err(StoreError::invalid(format!(
                "group name {:?} must be 1-{} characters of letters, digits, spaces or -().'",
                name,
                Self::MAX_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn is_valid(name: &str) -> bool {
        !name.is_empty()
            && name.chars().count() <= Self::MAX_LENGTH
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || " -().'".contains(c))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GroupName {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for GroupName {
    type Error = StoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GroupName> for String {
    fn from(name: GroupName) -> Self {
        name.0
    }
}

impl AsRef<str> for GroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert_eq!(GroupName::new("  Flu ").unwrap().as_str(), "Flu");
        assert!(GroupName::new("Dose 1 (Pfizer)").is_ok());
        assert!(GroupName::new("Moderna-Bivalent").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(GroupName::new("").is_err());
        assert!(GroupName::new("   ").is_err());
        assert!(GroupName::new("flu/covid").is_err());
        assert!(GroupName::new("x".repeat(31)).is_err());
    }

    #[test]
    fn test_case_sensitive() {
        assert_ne!(GroupName::new("Flu").unwrap(), GroupName::new("flu").unwrap());
    }

    #[test]
    fn test_serde_validates() {
        let name: GroupName = serde_json::from_str("\"Flu\"").unwrap();
        assert_eq!(name.as_str(), "Flu");
        assert!(serde_json::from_str::<GroupName>("\"bad/name\"").is_err());
    }
}

//! Keywords: user-defined aliases for command words.

use crate::storage::StorageModel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use vms_core::{Id, IdData, StoreError, ValueChange};

/// Manager for keywords, keyed by allocated integer identity. Aliases are
/// unique across the manager.
pub type KeywordManager = StorageModel<Keyword>;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "KeywordRaw")]
pub struct Keyword {
    main: String,
    keyword: String,
}

#[derive(Deserialize)]
struct KeywordRaw {
    main: String,
    keyword: String,
}

impl TryFrom<KeywordRaw> for Keyword {
    type Error = StoreError;

    fn try_from(raw: KeywordRaw) -> Result<Self, Self::Error> {
        Keyword::new(raw.main, raw.keyword)
    }
}

impl Keyword {
    pub fn new(main: impl Into<String>, keyword: impl Into<String>) -> Result<Self, StoreError> {
        let main = main.into().trim().to_string();
        let keyword = keyword.into().trim().to_string();
        if main.is_empty() || keyword.is_empty() {
            return Err(StoreError::invalid("keyword and main word must not be empty"));
        }
        if keyword.contains(char::is_whitespace) {
            return Err(StoreError::invalid(format!(
                "keyword {:?} must be a single word",
                keyword
            )));
        }
        Ok(Self { main, keyword })
    }

    /// The command word the alias resolves to.
    pub fn main(&self) -> &str {
        &self.main
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.keyword, self.main)
    }
}

impl StorageModel<Keyword> {
    pub fn find_alias(&self, word: &str) -> Option<&IdData<Keyword>> {
        self.iter().find(|kw| kw.value().keyword == word)
    }

    /// The main word `word` is an alias for, or `word` itself.
    pub fn resolve<'a>(&'a self, word: &'a str) -> &'a str {
        self.find_alias(word)
            .map(|kw| kw.value().main())
            .unwrap_or(word)
    }

    fn check_alias_free(&self, keyword: &Keyword, except: Option<Id>) -> Result<(), StoreError> {
        match self.find_alias(&keyword.keyword) {
            Some(existing) if Some(existing.id()) != except => {
                Err(StoreError::duplicate(format!("keyword {}", keyword.keyword)))
            }
            _ => Ok(()),
        }
    }

    /// Fails with `DuplicateEntity` if two records share an alias. Bulk
    /// loads bypass [`add_keyword`](Self::add_keyword), so they check here.
    pub fn check_aliases(&self) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for kw in self.iter() {
            if !seen.insert(kw.value().keyword()) {
                return Err(StoreError::duplicate(format!("keyword {}", kw.value().keyword())));
            }
        }
        Ok(())
    }

    /// Add an alias; fails if the alias is already defined.
    pub fn add_keyword(
        &mut self,
        keyword: Keyword,
    ) -> Result<ValueChange<IdData<Keyword>>, StoreError> {
        self.check_alias_free(&keyword, None)?;
        Ok(self.add(keyword))
    }

    /// Replace the keyword stored under `id`; fails if the new alias belongs
    /// to another record.
    pub fn set_keyword(
        &mut self,
        id: Id,
        keyword: Keyword,
    ) -> Result<ValueChange<IdData<Keyword>>, StoreError> {
        if !self.contains(id) {
            return Err(StoreError::not_found(id));
        }
        self.check_alias_free(&keyword, Some(id))?;
        self.set(id, keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_validation() {
        assert!(Keyword::new("", "p").is_err());
        assert!(Keyword::new("patient", "").is_err());
        assert!(Keyword::new("patient", "p t").is_err());
        assert!(Keyword::new("patient", "pt").is_ok());
    }

    #[test]
    fn test_resolve() {
        let mut manager = KeywordManager::new();
        manager
            .add_keyword(Keyword::new("patient", "pt").unwrap())
            .unwrap();

        assert_eq!(manager.resolve("pt"), "patient");
        assert_eq!(manager.resolve("appointment"), "appointment");
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut manager = KeywordManager::new();
        manager
            .add_keyword(Keyword::new("patient", "p").unwrap())
            .unwrap();

        let result = manager.add_keyword(Keyword::new("vaccination", "p").unwrap());
        assert!(matches!(result, Err(StoreError::DuplicateEntity(_))));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_check_aliases_catches_bulk_duplicates() {
        let manager = KeywordManager::from_records([
            IdData::new(0, Keyword::new("patient", "p").unwrap()),
            IdData::new(1, Keyword::new("vaccination", "p").unwrap()),
        ])
        .unwrap();
        assert!(matches!(
            manager.check_aliases(),
            Err(StoreError::DuplicateEntity(_))
        ));

        let manager = KeywordManager::from_records([
            IdData::new(0, Keyword::new("patient", "p").unwrap()),
            IdData::new(1, Keyword::new("vaccination", "v").unwrap()),
        ])
        .unwrap();
        assert!(manager.check_aliases().is_ok());
    }

    #[test]
    fn test_set_keyword_allows_same_alias_on_same_record() {
        let mut manager = KeywordManager::new();
        let id = manager
            .add_keyword(Keyword::new("patient", "p").unwrap())
            .unwrap()
            .new()
            .map(IdData::id)
            .unwrap();
        manager
            .add_keyword(Keyword::new("vaccination", "v").unwrap())
            .unwrap();

        assert!(manager
            .set_keyword(id, Keyword::new("appointment", "p").unwrap())
            .is_ok());
        assert!(matches!(
            manager.set_keyword(id, Keyword::new("appointment", "v").unwrap()),
            Err(StoreError::DuplicateEntity(_))
        ));
        assert!(matches!(
            manager.set_keyword(99, Keyword::new("appointment", "x").unwrap()),
            Err(StoreError::NotFound(_))
        ));
    }
}

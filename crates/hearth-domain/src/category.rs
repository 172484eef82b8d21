//! Validated category keys and the household category catalog.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

const MAX_KEY_LEN: usize = 32;

/// Default catalog used when a household has not configured its own.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "housing",
    "utilities",
    "groceries",
    "dining",
    "transport",
    "health",
    "insurance",
    "entertainment",
    "subscriptions",
    "education",
    "savings",
    "salary",
    "other",
];

/// A normalised category identifier (`groceries`, `eating-out`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryKey(String);

impl CategoryKey {
    /// Trims, lowercases and validates a raw key.
    pub fn parse(raw: &str) -> Result<Self, CategoryKeyError> {
        let key = raw.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(CategoryKeyError::Empty);
        }
        if key.len() > MAX_KEY_LEN {
            return Err(CategoryKeyError::TooLong(key));
        }
        if let Some(ch) = key
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_')))
        {
            return Err(CategoryKeyError::InvalidCharacter(key, ch));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CategoryKey {
    type Err = CategoryKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for CategoryKey {
    type Error = CategoryKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CategoryKey> for String {
    fn from(key: CategoryKey) -> Self {
        key.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Errors that can occur when constructing [`CategoryKey`] values.
pub enum CategoryKeyError {
    Empty,
    TooLong(String),
    InvalidCharacter(String, char),
    NotInCatalog(String),
}

impl fmt::Display for CategoryKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKeyError::Empty => f.write_str("category key cannot be empty"),
            CategoryKeyError::TooLong(key) => {
                write!(f, "category key `{key}` exceeds {MAX_KEY_LEN} characters")
            }
            CategoryKeyError::InvalidCharacter(key, ch) => {
                write!(f, "category key `{key}` contains invalid character `{ch}`")
            }
            CategoryKeyError::NotInCatalog(key) => {
                write!(f, "category `{key}` is not configured for this household")
            }
        }
    }
}

impl std::error::Error for CategoryKeyError {}

/// The set of category keys a household is allowed to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCatalog {
    keys: BTreeSet<CategoryKey>,
}

impl CategoryCatalog {
    pub fn new(keys: impl IntoIterator<Item = CategoryKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Builds a catalog from raw strings, rejecting the first invalid key.
    pub fn from_raw<I, S>(raw: I) -> Result<Self, CategoryKeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = raw
            .into_iter()
            .map(|value| CategoryKey::parse(value.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { keys })
    }

    pub fn household_default() -> Self {
        Self::new(
            DEFAULT_CATEGORIES
                .iter()
                .filter_map(|raw| CategoryKey::parse(raw).ok()),
        )
    }

    pub fn contains(&self, key: &CategoryKey) -> bool {
        self.keys.contains(key)
    }

    /// Parses `raw` and checks membership in one step.
    pub fn resolve(&self, raw: &str) -> Result<CategoryKey, CategoryKeyError> {
        let key = CategoryKey::parse(raw)?;
        if self.contains(&key) {
            Ok(key)
        } else {
            Err(CategoryKeyError::NotInCatalog(key.0))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalises_case_and_whitespace() {
        let key = CategoryKey::parse("  Groceries ").unwrap();
        assert_eq!(key.as_str(), "groceries");
    }

    #[test]
    fn parse_rejects_spaces_and_symbols() {
        assert_eq!(
            CategoryKey::parse("eating out"),
            Err(CategoryKeyError::InvalidCharacter("eating out".into(), ' '))
        );
        assert_eq!(CategoryKey::parse(""), Err(CategoryKeyError::Empty));
    }

    #[test]
    fn deserialize_validates_keys() {
        let ok: CategoryKey = serde_json::from_str("\"Rent\"").unwrap();
        assert_eq!(ok.as_str(), "rent");
        assert!(serde_json::from_str::<CategoryKey>("\"r€nt\"").is_err());
    }

    #[test]
    fn catalog_resolves_only_known_keys() {
        let catalog = CategoryCatalog::household_default();
        assert!(catalog.resolve("Groceries").is_ok());
        assert!(matches!(
            catalog.resolve("yachts"),
            Err(CategoryKeyError::NotInCatalog(_))
        ));
    }
}

//! Brand alias table used for category-restricted coupons and catalog filters.
//!
//! Shoppers and product data spell brands inconsistently ("Air Jordan",
//! "NIKE", "Yeezy"). Each brand family owns a set of aliases; a brand matches
//! a category when both land in the same family after normalization.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct BrandAliasTable {
    families: BTreeMap<String, Vec<String>>,
    index: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum BrandAliasError {
    #[error("failed to read brand alias file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid brand alias file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Lowercases and drops everything that is not a letter or digit.
pub fn normalize_brand(raw: &str) -> String {
    raw.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}

impl BrandAliasTable {
    pub fn new(families: BTreeMap<String, Vec<String>>) -> Self {
        let mut normalized = BTreeMap::new();
        let mut index = HashMap::new();
        for (family, aliases) in families {
            let family = normalize_brand(&family);
            if family.is_empty() { continue; }
            let mut set: Vec<String> = vec![family.clone()];
            for alias in aliases.iter().map(|a| normalize_brand(a)).filter(|a| !a.is_empty()) {
                if !set.contains(&alias) { set.push(alias); }
            }
            for alias in &set {
                // first family to claim an alias keeps it
                index.entry(alias.clone()).or_insert_with(|| family.clone());
            }
            normalized.insert(family, set);
        }
        Self { families: normalized, index }
    }

    /// Parses a JSON object of `{ "family": ["alias", ...] }`.
    pub fn from_json(json: &str) -> Result<Self, BrandAliasError> {
        let families: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::new(families))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BrandAliasError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn families(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.families.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Family a brand belongs to, if it is a known alias.
    pub fn family_of(&self, brand: &str) -> Option<&str> {
        self.index.get(&normalize_brand(brand)).map(String::as_str)
    }

    /// Every normalized spelling accepted for `category`. Unknown categories
    /// expand to themselves.
    pub fn expand(&self, category: &str) -> HashSet<String> {
        let key = normalize_brand(category);
        match self.index.get(&key).and_then(|family| self.families.get(family)) {
            Some(aliases) => aliases.iter().cloned().collect(),
            None if key.is_empty() => HashSet::new(),
            None => HashSet::from([key]),
        }
    }

    pub fn matches(&self, brand: &str, category: &str) -> bool {
        let normalized = normalize_brand(brand);
        if normalized.is_empty() { return false; }
        if self.expand(category).contains(&normalized) { return true; }
        matches!((self.family_of(brand), self.family_of(category)), (Some(a), Some(b)) if a == b)
    }
}

impl Default for BrandAliasTable {
    fn default() -> Self {
        let families = [
            ("nike", &["airmax", "airjordan", "jordan", "airforce"][..]),
            ("adidas", &["yeezy", "boost", "ultraboost"][..]),
            ("puma", &["suede", "rs", "rsx"][..]),
            ("newbalance", &["nb"][..]),
            ("converse", &["chucktaylor", "allstar"][..]),
            ("vans", &["oldskool"][..]),
        ];
        Self::new(
            families
                .into_iter()
                .map(|(family, aliases)| (family.to_string(), aliases.iter().map(|a| a.to_string()).collect()))
                .collect(),
        )
    }
}

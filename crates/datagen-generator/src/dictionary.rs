//! In-memory word lists backing `dict` fields.

use datagen_core::Dictionary;
use rand::{Rng, RngCore};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Error type for loading word lists.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("Failed to read dictionary file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse dictionary YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Donald", "Edsger", "Frances", "Grace", "Hedy", "John",
    "Katherine", "Ken", "Linus", "Margaret", "Niklaus", "Radia", "Shafi", "Tim", "Whitfield",
    "Yukihiro",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Backus", "Dijkstra", "Hamilton", "Hopper", "Johnson", "Kernighan", "Knuth",
    "Lamarr", "Liskov", "Lovelace", "McCarthy", "Perlman", "Ritchie", "Shannon", "Thompson",
    "Torvalds", "Turing", "Wirth", "Goldwasser",
];

const CITIES: &[&str] = &[
    "Amsterdam", "Austin", "Bangalore", "Berlin", "Chicago", "Lagos", "Lisbon", "London",
    "Melbourne", "Montreal", "Nairobi", "Osaka", "Paris", "Santiago", "Seoul", "Toronto",
];

const COUNTRIES: &[&str] = &[
    "Argentina", "Australia", "Brazil", "Canada", "Chile", "France", "Germany", "India", "Japan",
    "Kenya", "Netherlands", "Nigeria", "Portugal", "South Korea", "United Kingdom",
    "United States",
];

const STATES: &[&str] = &[
    "AK", "AZ", "CA", "CO", "FL", "GA", "IL", "MA", "MI", "NY", "OH", "OR", "PA", "TX", "WA",
];

const STREETS: &[&str] = &[
    "Maple Street", "Oak Avenue", "Pine Road", "Cedar Lane", "Elm Street", "Birch Way",
    "Willow Drive", "Spruce Court", "Ash Boulevard", "Hickory Place",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "test.dev"];

/// Dictionary backed by static word lists, optionally extended from YAML.
///
/// Besides the plain categories, `full_name`, `email`, `address` and
/// `zip_code` are composed from the other lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordDictionary {
    #[serde(flatten)]
    categories: HashMap<String, Vec<String>>,
}

impl WordDictionary {
    /// Dictionary with no categories.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dictionary preloaded with the builtin categories.
    pub fn builtin() -> Self {
        let mut dictionary = Self::empty();
        for (category, words) in [
            ("first_name", FIRST_NAMES),
            ("last_name", LAST_NAMES),
            ("city", CITIES),
            ("country", COUNTRIES),
            ("state", STATES),
            ("street", STREETS),
            ("domain", DOMAINS),
        ] {
            dictionary.insert(category, words.iter().map(|w| w.to_string()).collect());
        }
        dictionary
    }

    /// Parse categories from a YAML mapping of category to word list.
    pub fn from_yaml(yaml: &str) -> Result<Self, DictionaryError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DictionaryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn insert(&mut self, category: impl Into<String>, words: Vec<String>) {
        self.categories.insert(category.into(), words);
    }

    /// Add every category of `other`, replacing same-named ones.
    pub fn merge(mut self, other: WordDictionary) -> Self {
        self.categories.extend(other.categories);
        self
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    fn pick(&self, category: &str, rng: &mut dyn RngCore) -> Option<String> {
        let words = self.categories.get(category)?;
        if words.is_empty() {
            return None;
        }
        let mut rng = rng;
        let idx = rng.random_range(0..words.len());
        Some(words[idx].clone())
    }

    fn pick_or_empty(&self, category: &str, rng: &mut dyn RngCore) -> String {
        self.pick(category, rng).unwrap_or_default()
    }
}

impl Dictionary for WordDictionary {
    fn value_from_dictionary(&self, category: &str, rng: &mut dyn RngCore) -> String {
        if let Some(word) = self.pick(category, rng) {
            return word;
        }

        match category {
            "full_name" => format!(
                "{} {}",
                self.pick_or_empty("first_name", rng),
                self.pick_or_empty("last_name", rng)
            ),
            "email" => format!(
                "{}.{}@{}",
                self.pick_or_empty("first_name", rng).to_lowercase(),
                self.pick_or_empty("last_name", rng).to_lowercase(),
                self.pick_or_empty("domain", rng)
            ),
            "address" => {
                let mut r = rng;
                let number = r.random_range(1..10_000);
                format!("{number} {}", self.pick_or_empty("street", r))
            }
            "zip_code" => {
                let mut r = rng;
                format!("{:05}", r.random_range(501..100_000))
            }
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    #[test]
    fn test_builtin_category() {
        let dictionary = WordDictionary::builtin();
        let mut rng = StdRng::seed_from_u64(42);

        let name = dictionary.value_from_dictionary("first_name", &mut rng);
        assert!(FIRST_NAMES.contains(&name.as_str()));
    }

    #[test]
    fn test_composed_categories() {
        let dictionary = WordDictionary::builtin();
        let mut rng = StdRng::seed_from_u64(42);

        let email = dictionary.value_from_dictionary("email", &mut rng);
        assert!(email.contains('@'));

        let zip = dictionary.value_from_dictionary("zip_code", &mut rng);
        assert_eq!(zip.len(), 5);
        assert!(zip.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_unknown_category_is_empty() {
        let dictionary = WordDictionary::empty();
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(dictionary.value_from_dictionary("silly_name", &mut rng), "");
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "silly_name:\n  - Fizz\n  - Buzz").unwrap();

        let dictionary = WordDictionary::builtin().merge(WordDictionary::from_file(file.path()).unwrap());
        let mut rng = StdRng::seed_from_u64(42);

        assert!(dictionary.has_category("city"));
        let word = dictionary.value_from_dictionary("silly_name", &mut rng);
        assert!(word == "Fizz" || word == "Buzz");
    }
}

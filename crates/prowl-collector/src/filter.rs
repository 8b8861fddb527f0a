#![allow(clippy::must_use_candidate)]

use std::fmt;

/// Record-level filters applied while a page is ingested.
///
/// Filters run in a fixed order: the name blacklist first, then the
/// maker threshold.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    blacklist: Vec<String>,
    max_makers: u32,
}

/// Why a raw item was not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Blacklisted { word: String },
    TooManyMakers { count: u32, max: u32 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Blacklisted { word } => write!(f, "name contains blacklisted word '{word}'"),
            Rejection::TooManyMakers { count, max } => {
                write!(f, "{count} makers exceeds the limit of {max}")
            }
        }
    }
}

impl RecordFilter {
    /// Blacklist words are lowercased once here; blank entries are dropped.
    pub fn new(blacklist: &[String], max_makers: u32) -> Self {
        let blacklist = blacklist
            .iter()
            .map(|word| word.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();

        Self {
            blacklist,
            max_makers,
        }
    }

    pub fn check(&self, name: &str, maker_count: u32) -> Result<(), Rejection> {
        if let Some(word) = self.blacklisted_word(name) {
            return Err(Rejection::Blacklisted {
                word: word.to_string(),
            });
        }

        if maker_count > self.max_makers {
            return Err(Rejection::TooManyMakers {
                count: maker_count,
                max: self.max_makers,
            });
        }

        Ok(())
    }

    fn blacklisted_word(&self, name: &str) -> Option<&str> {
        if self.blacklist.is_empty() {
            return None;
        }

        let name = name.to_lowercase();
        self.blacklist
            .iter()
            .find(|word| name.contains(word.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_empty_blacklist_accepts_everything() {
        let filter = RecordFilter::new(&[], 10);
        assert!(filter.check("Anything At All", 3).is_ok());
        assert!(filter.check("", 0).is_ok());
    }

    #[test]
    fn test_blacklist_matches_any_case_and_position() {
        let filter = RecordFilter::new(&words(&["Cat"]), 10);

        for name in ["cat", "CAT", "Catify", "BobCat", "the cAtalog app", "supercatz"] {
            assert_eq!(
                filter.check(name, 1),
                Err(Rejection::Blacklisted {
                    word: "cat".to_string()
                }),
                "expected '{name}' to be rejected"
            );
        }

        assert!(filter.check("Dog Walker", 1).is_ok());
    }

    #[test]
    fn test_blank_blacklist_entries_are_ignored() {
        let filter = RecordFilter::new(&words(&["", "  "]), 10);
        assert!(filter.check("Launchpad", 1).is_ok());
    }

    #[test]
    fn test_maker_threshold_is_inclusive() {
        let filter = RecordFilter::new(&[], 5);
        assert!(filter.check("Tool", 0).is_ok());
        assert!(filter.check("Tool", 5).is_ok());
        assert_eq!(
            filter.check("Tool", 6),
            Err(Rejection::TooManyMakers { count: 6, max: 5 })
        );
    }

    #[test]
    fn test_zero_threshold_only_accepts_zero_makers() {
        let filter = RecordFilter::new(&[], 0);
        assert!(filter.check("Solo", 0).is_ok());
        assert!(filter.check("Duo", 1).is_err());
    }

    #[test]
    fn test_blacklist_checked_before_makers() {
        let filter = RecordFilter::new(&words(&["crypto"]), 1);
        assert!(matches!(
            filter.check("CryptoWallet", 9),
            Err(Rejection::Blacklisted { .. })
        ));
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection::TooManyMakers { count: 6, max: 5 };
        assert_eq!(rejection.to_string(), "6 makers exceeds the limit of 5");
    }
}

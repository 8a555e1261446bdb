//! Orderings of terms facet entries.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShardCollectError;
use crate::facet::result::TermEntry;

/// How facet entries are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ComparatorType {
    /// Highest count first, ties by ascending term.
    #[default]
    Count,
    /// Lowest count first, ties by descending term.
    ReverseCount,
    /// Ascending term.
    Term,
    /// Descending term.
    ReverseTerm,
}

impl ComparatorType {
    pub fn compare<T: Ord>(&self, a: &TermEntry<T>, b: &TermEntry<T>) -> Ordering {
        match self {
            ComparatorType::Count => b
                .count
                .cmp(&a.count)
                .then_with(|| a.term.cmp(&b.term)),
            ComparatorType::ReverseCount => ComparatorType::Count.compare(a, b).reverse(),
            ComparatorType::Term => a.term.cmp(&b.term),
            ComparatorType::ReverseTerm => b.term.cmp(&a.term),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComparatorType::Count => "count",
            ComparatorType::ReverseCount => "reverse_count",
            ComparatorType::Term => "term",
            ComparatorType::ReverseTerm => "reverse_term",
        }
    }
}

impl fmt::Display for ComparatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComparatorType {
    type Err = ShardCollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(ComparatorType::Count),
            "reverse_count" | "reverseCount" => Ok(ComparatorType::ReverseCount),
            "term" => Ok(ComparatorType::Term),
            "reverse_term" | "reverseTerm" => Ok(ComparatorType::ReverseTerm),
            other => Err(ShardCollectError::invalid_argument(format!(
                "no type argument match for terms facet comparator [{other}]"
            ))),
        }
    }
}

impl TryFrom<String> for ComparatorType {
    type Error = ShardCollectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(term: i16, count: u32) -> TermEntry<i16> {
        TermEntry { term, count }
    }

    #[test]
    fn test_count_ordering() {
        let cmp = ComparatorType::Count;
        assert_eq!(cmp.compare(&entry(1, 5), &entry(2, 3)), Ordering::Less);
        assert_eq!(cmp.compare(&entry(1, 3), &entry(2, 3)), Ordering::Less);
        assert_eq!(cmp.compare(&entry(2, 3), &entry(2, 3)), Ordering::Equal);

        let rev = ComparatorType::ReverseCount;
        assert_eq!(rev.compare(&entry(1, 5), &entry(2, 3)), Ordering::Greater);
        assert_eq!(rev.compare(&entry(1, 3), &entry(2, 3)), Ordering::Greater);
    }

    #[test]
    fn test_term_ordering() {
        assert_eq!(
            ComparatorType::Term.compare(&entry(1, 1), &entry(2, 9)),
            Ordering::Less
        );
        assert_eq!(
            ComparatorType::ReverseTerm.compare(&entry(1, 1), &entry(2, 9)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("count".parse::<ComparatorType>().unwrap(), ComparatorType::Count);
        assert_eq!(
            "reverseCount".parse::<ComparatorType>().unwrap(),
            ComparatorType::ReverseCount
        );
        assert_eq!(
            "reverse_term".parse::<ComparatorType>().unwrap(),
            ComparatorType::ReverseTerm
        );

        let err = "popularity".parse::<ComparatorType>().unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("popularity"));
    }

    #[test]
    fn test_serde() {
        let cmp: ComparatorType = serde_json::from_str("\"reverse_count\"").unwrap();
        assert_eq!(cmp, ComparatorType::ReverseCount);
        assert_eq!(serde_json::to_string(&ComparatorType::Term).unwrap(), "\"term\"");
        assert!(serde_json::from_str::<ComparatorType>("\"bogus\"").is_err());
    }
}

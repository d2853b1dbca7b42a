use std::borrow::Cow;
use std::cmp::Ordering;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use test_strategy::Arbitrary;

/// Description for how string values should be compared against each other for ordering and
/// equality.
///
/// This represents the subset of MySQL's utf8mb4 collations that expressions need to distinguish
/// between: byte-wise comparison and case-insensitive comparison.
#[derive(
    Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, ValueEnum, Arbitrary,
)]
#[repr(u8)]
pub enum Collation {
    /// Binary collation, comparing strings by their UTF-8 bytes. This is the [`Default`].
    #[default]
    Utf8Bin,

    /// Case-insensitive collation. Strings compare equal if they are equal after lowercasing every
    /// character.
    Utf8GeneralCi,
}

impl Collation {
    /// Normalize the given string according to this collation.
    ///
    /// It will always be the case that two normalized strings compare in the same way as
    /// [`compare_strs`][]
    ///
    /// [`compare_strs`]: Collation::compare_strs
    pub fn normalize(self, s: &str) -> Cow<'_, str> {
        match self {
            Collation::Utf8Bin => s.into(),
            Collation::Utf8GeneralCi => s
                .trim_end_matches(' ')
                .chars()
                .flat_map(char::to_lowercase)
                .collect::<String>()
                .into(),
        }
    }

    /// Compare the given strings according to this collation.
    ///
    /// `Utf8GeneralCi` pads with spaces, so trailing spaces never affect the result.
    pub fn compare_strs(self, s1: &str, s2: &str) -> Ordering {
        match self {
            Collation::Utf8Bin => s1.cmp(s2),
            Collation::Utf8GeneralCi => s1
                .trim_end_matches(' ')
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(s2.trim_end_matches(' ').chars().flat_map(char::to_lowercase)),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_strategy::proptest;

    use super::*;

    #[proptest]
    fn normalized_strings_sort_like_their_originals(
        collation: Collation,
        #[strategy("[a-zA-Z Σσß]{0,8}")] s1: String,
        #[strategy("[a-zA-Z Σσß]{0,8}")] s2: String,
    ) {
        assert_eq!(
            collation.normalize(&s1).cmp(&collation.normalize(&s2)),
            collation.compare_strs(&s1, &s2)
        );
    }

    #[test]
    fn general_ci_folds_case() {
        let ci = Collation::Utf8GeneralCi;
        assert_eq!(ci.compare_strs("MySQL", "mysql"), Ordering::Equal);
        assert_eq!(ci.compare_strs("Ärger", "ärger"), Ordering::Equal);
        // sorted by letter, not by the uppercase-first byte order
        assert_eq!(ci.compare_strs("apple", "Banana"), Ordering::Less);
        assert_eq!(ci.compare_strs("ß", "ss"), Ordering::Greater);
    }

    #[test]
    fn general_ci_ignores_trailing_spaces() {
        let ci = Collation::Utf8GeneralCi;
        assert_eq!(ci.compare_strs("abc  ", "ABC"), Ordering::Equal);
        assert_eq!(ci.normalize("abc  "), "abc");
        assert_eq!(ci.compare_strs(" abc", "abc"), Ordering::Less);
    }

    #[test]
    fn bin_compares_bytes() {
        let bin = Collation::Utf8Bin;
        assert_eq!(bin.compare_strs("Banana", "apple"), Ordering::Less);
        assert_eq!(bin.compare_strs("abc ", "abc"), Ordering::Greater);
        assert_eq!(bin.normalize("AbC"), "AbC");
    }
}

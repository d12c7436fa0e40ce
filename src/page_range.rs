use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRangeError {
    #[error("No pages specified")]
    Empty,

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid page number: {0}")]
    InvalidPage(String),

    #[error("No valid pages selected")]
    NoPagesSelected,
}

/// One comma-separated token of a page range expression, still 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
    token: String,
}

impl PageRange {
    /// Parse a single token like "5" or "1-5"
    pub fn parse(s: &str) -> Result<Self, PageRangeError> {
        let token = s.trim();

        if let Some((start_str, end_str)) = token.split_once('-') {
            let invalid = || PageRangeError::InvalidRange(token.to_string());
            let start = parse_page_number(start_str).ok_or_else(invalid)?;
            let end = parse_page_number(end_str).ok_or_else(invalid)?;

            Ok(PageRange {
                start,
                end: Some(end),
                token: token.to_string(),
            })
        } else {
            let page = parse_page_number(token)
                .ok_or_else(|| PageRangeError::InvalidPage(token.to_string()))?;
            Ok(PageRange {
                start: page,
                end: None,
                token: token.to_string(),
            })
        }
    }

    /// Expand this range into zero-based page indices, checking it against
    /// the document's page count
    pub fn expand(&self, total_pages: u32) -> Result<RangeInclusive<u32>, PageRangeError> {
        match self.end {
            Some(end) => {
                if self.start < 1 || end > total_pages || self.start > end {
                    return Err(PageRangeError::InvalidRange(self.token.clone()));
                }
                Ok(self.start - 1..=end - 1)
            }
            None => {
                if self.start < 1 || self.start > total_pages {
                    return Err(PageRangeError::InvalidPage(self.token.clone()));
                }
                Ok(self.start - 1..=self.start - 1)
            }
        }
    }
}

/// Plain ASCII digits only; signs, decimals and exponents are rejected
fn parse_page_number(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok()
}

/// Ascending, deduplicated zero-based page indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageIndexSet(BTreeSet<u32>);

impl PageIndexSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.0.contains(&index)
    }

    pub fn first(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// 1-based page numbers, for display
    pub fn to_page_numbers(&self) -> Vec<u32> {
        self.iter().map(|index| index + 1).collect()
    }
}

impl FromIterator<u32> for PageIndexSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        PageIndexSet(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PageIndexSet {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

/// Renders 1-based page numbers with consecutive runs collapsed, e.g. "1-3,5"
impl fmt::Display for PageIndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(u32, u32)> = Vec::new();
        for page in self.to_page_numbers() {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == page => *end = page,
                _ => runs.push((page, page)),
            }
        }

        for (i, (start, end)) in runs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if start == end {
                write!(f, "{}", start)?;
            } else {
                write!(f, "{}-{}", start, end)?;
            }
        }
        Ok(())
    }
}

/// Resolve a page range expression like "1-3, 5, 8-10" into the zero-based
/// indices it selects.
///
/// Tokens are handled left to right and the first one that fails to parse or
/// falls outside `1..=total_pages` is the error reported.
pub fn resolve(expression: &str, total_pages: u32) -> Result<PageIndexSet, PageRangeError> {
    if expression.split(',').all(|token| token.trim().is_empty()) {
        return Err(PageRangeError::Empty);
    }

    let mut indices = BTreeSet::new();
    for token in expression.split(',') {
        indices.extend(PageRange::parse(token)?.expand(total_pages)?);
    }

    if indices.is_empty() {
        return Err(PageRangeError::NoPagesSelected);
    }

    tracing::debug!(expression, total_pages, selected = indices.len(), "resolved page range");
    Ok(PageIndexSet(indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_single_page() {
        let range = PageRange::parse("5").unwrap();
        assert_eq!(range.start, 5);
        assert_eq!(range.end, None);
        assert_eq!(range.expand(10).unwrap().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_page_range() {
        assert_eq!(resolve("1-3", 5).unwrap().to_vec(), vec![0, 1, 2]);
    }

    #[test]
    fn test_comma_separated() {
        assert_eq!(resolve("2,4", 5).unwrap().to_vec(), vec![1, 3]);
        assert_eq!(
            resolve("1-3, 5, 8-10", 10).unwrap().to_vec(),
            vec![0, 1, 2, 4, 7, 8, 9]
        );
    }

    #[test]
    fn test_overlap_collapses() {
        assert_eq!(resolve("1-3,2-4", 10).unwrap().to_vec(), vec![0, 1, 2, 3]);
        assert_eq!(resolve("4,1,4,2", 10).unwrap().to_vec(), vec![0, 1, 3]);
    }

    #[test]
    fn test_whitespace_around_bounds() {
        assert_eq!(resolve(" 2 - 3 ,  1 ", 5).unwrap().to_vec(), vec![0, 1, 2]);
    }

    #[test]
    fn test_descending_range_is_error() {
        assert_eq!(
            resolve("5-3", 10),
            Err(PageRangeError::InvalidRange("5-3".to_string()))
        );
    }

    #[test]
    fn test_range_out_of_bounds() {
        assert_eq!(
            resolve("0-2", 10),
            Err(PageRangeError::InvalidRange("0-2".to_string()))
        );
        assert_eq!(
            resolve("8-11", 10),
            Err(PageRangeError::InvalidRange("8-11".to_string()))
        );
    }

    #[test]
    fn test_malformed_range() {
        assert_eq!(
            resolve("1-", 10),
            Err(PageRangeError::InvalidRange("1-".to_string()))
        );
        assert_eq!(
            resolve("-5", 10),
            Err(PageRangeError::InvalidRange("-5".to_string()))
        );
        assert_eq!(
            resolve("1-2-3", 10),
            Err(PageRangeError::InvalidRange("1-2-3".to_string()))
        );
        assert_eq!(
            resolve("a-b", 10),
            Err(PageRangeError::InvalidRange("a-b".to_string()))
        );
    }

    #[test]
    fn test_invalid_page_zero() {
        assert_eq!(
            resolve("0", 5),
            Err(PageRangeError::InvalidPage("0".to_string()))
        );
    }

    #[test]
    fn test_page_exceeds_total() {
        assert_eq!(
            resolve("6", 5),
            Err(PageRangeError::InvalidPage("6".to_string()))
        );
    }

    #[test]
    fn test_non_numeric_page() {
        assert_eq!(
            resolve("1,abc", 5),
            Err(PageRangeError::InvalidPage("abc".to_string()))
        );
        assert_eq!(
            resolve("1,,2", 5),
            Err(PageRangeError::InvalidPage("".to_string()))
        );
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(resolve("", 5), Err(PageRangeError::Empty));
        assert_eq!(resolve("   ", 5), Err(PageRangeError::Empty));
        assert_eq!(resolve(" , ", 5), Err(PageRangeError::Empty));
    }

    #[test]
    fn test_first_error_wins() {
        assert_eq!(
            resolve("1,9,5-3", 5),
            Err(PageRangeError::InvalidPage("9".to_string()))
        );
    }

    #[test]
    fn test_bounds_error_before_later_syntax_error() {
        assert_eq!(
            resolve("9,abc", 5),
            Err(PageRangeError::InvalidPage("9".to_string()))
        );
        assert_eq!(
            resolve("9,1-x", 5),
            Err(PageRangeError::InvalidPage("9".to_string()))
        );
        assert_eq!(
            resolve("2-7,x", 5),
            Err(PageRangeError::InvalidRange("2-7".to_string()))
        );
    }

    #[test]
    fn test_signed_numbers_rejected() {
        assert_eq!(
            resolve("+3", 5),
            Err(PageRangeError::InvalidPage("+3".to_string()))
        );
        assert_eq!(
            resolve("1-+3", 5),
            Err(PageRangeError::InvalidRange("1-+3".to_string()))
        );
        assert_eq!(
            resolve("3.0", 5),
            Err(PageRangeError::InvalidPage("3.0".to_string()))
        );
    }

    #[test]
    fn test_huge_range_stays_lazy() {
        let range = PageRange::parse("1-4000000000").unwrap();
        let indices = range.expand(4_000_000_000).unwrap();
        assert_eq!(indices.start(), &0);
        assert_eq!(indices.end(), &3_999_999_999);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PageRangeError::InvalidRange("5-3".into()).to_string(),
            "Invalid range: 5-3"
        );
        assert_eq!(PageRangeError::NoPagesSelected.to_string(), "No valid pages selected");
    }

    #[test]
    fn test_display_collapses_runs() {
        let set = resolve("1-3,5,7-8", 10).unwrap();
        assert_eq!(set.to_string(), "1-3,5,7-8");
        assert_eq!(set.to_page_numbers(), vec![1, 2, 3, 5, 7, 8]);
    }

    proptest! {
        #[test]
        fn resolved_indices_are_in_bounds_and_ascending(
            total in 1u32..200,
            tokens in prop::collection::vec((1u32..250, 0u32..20, any::<bool>()), 1..8),
        ) {
            let expression = tokens
                .iter()
                .map(|(start, len, is_range)| {
                    if *is_range {
                        format!("{}-{}", start, start + len)
                    } else {
                        start.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(",");

            let first = resolve(&expression, total);
            prop_assert_eq!(&first, &resolve(&expression, total));

            if let Ok(set) = first {
                let indices = set.to_vec();
                prop_assert!(!indices.is_empty());
                prop_assert!(indices.iter().all(|&i| i < total));
                prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}

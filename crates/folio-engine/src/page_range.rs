// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range text ("1,3,5-8") to page sets.
//
// Two policies share one tokenizer: `parse` skips malformed tokens, while
// `parse_strict` rejects the first one. Neither checks numbers against a
// document; adapters drop pages the document does not have.

use folio_core::error::{FolioError, Result};
use folio_core::types::PageSet;
use tracing::debug;

/// Widest range a single token may name.
pub const MAX_RANGE_SPAN: i64 = 1_000_000;

/// Lenient parse: malformed tokens are logged and skipped.
pub fn parse(text: &str) -> PageSet {
    let mut pages = Vec::new();
    for token in tokens(text) {
        match parse_token(token) {
            Some(range) => pages.extend(range),
            None => debug!(token, "Skipping malformed page-range token"),
        }
    }
    pages.into_iter().collect()
}

/// Strict parse: the first malformed token is an error.
pub fn parse_strict(text: &str) -> Result<PageSet> {
    let mut pages = Vec::new();
    for token in tokens(text) {
        let range = parse_token(token).ok_or_else(|| FolioError::PageRange {
            token: token.to_string(),
        })?;
        pages.extend(range);
    }
    Ok(pages.into_iter().collect())
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// A token is either `n` or `a-b`. `a > b` is a valid, empty range.
fn parse_token(token: &str) -> Option<std::ops::RangeInclusive<i64>> {
    let Some((start, end)) = token.split_once('-') else {
        let page = token.parse::<i64>().ok()?;
        return Some(page..=page);
    };

    let (start, end) = (start.trim(), end.trim());
    if start.is_empty() || end.is_empty() || end.contains('-') {
        return None;
    }
    let start = start.parse::<i64>().ok()?;
    let end = end.parse::<i64>().ok()?;
    if end - start >= MAX_RANGE_SPAN {
        return None;
    }
    Some(start..=end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(set: &PageSet) -> Vec<i64> {
        set.iter().collect()
    }

    #[test]
    fn singles_and_ranges() {
        assert_eq!(pages(&parse("1,3,5-8")), vec![1, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn reversed_range_is_empty() {
        assert!(parse("5-2").is_empty());
        assert!(parse_strict("5-2").expect("valid").is_empty());
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(parse("").is_empty());
        assert!(parse(" , ,").is_empty());
        assert!(parse_strict("").expect("valid").is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(pages(&parse("2,2,2")), vec![2]);
        assert_eq!(pages(&parse("4-6, 5, 1")), vec![1, 4, 5, 6]);
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(pages(&parse(" 1 , 3 - 4 ")), vec![1, 3, 4]);
    }

    #[test]
    fn zero_is_kept() {
        assert_eq!(pages(&parse("0,2")), vec![0, 2]);
    }

    #[test]
    fn lenient_skips_malformed_tokens() {
        assert_eq!(pages(&parse("1,x,5-,-5,3")), vec![1, 3]);
        assert_eq!(pages(&parse("1-2-3,4")), vec![4]);
    }

    #[test]
    fn strict_rejects_malformed_tokens() {
        for (text, bad) in [("1,x", "x"), ("5-", "5-"), ("-5", "-5"), ("2, 1-2-3", "1-2-3")] {
            match parse_strict(text) {
                Err(FolioError::PageRange { token }) => assert_eq!(token, bad),
                other => panic!("{text:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn huge_ranges_are_malformed() {
        assert!(parse("1-999999999").is_empty());
        assert!(parse_strict("1-999999999").is_err());
        assert_eq!(parse("1-1000000").len(), 1_000_000);
    }

    #[test]
    fn display_form_reparses_to_the_same_set() {
        for text in ["1,3,5-8", "10-12,2,4", "0,1,2", "7", ""] {
            let set = parse(text);
            assert_eq!(parse_strict(&set.to_string()).expect("reparse"), set);
        }
    }
}

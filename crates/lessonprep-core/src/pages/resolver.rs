//! Page range resolution for mixed-script input such as "٢٥-٣٠، 41 43".

use std::borrow::Cow;
use std::collections::BTreeSet;

use tracing::trace;

use super::PageSet;

/// Widest range accepted in a single fragment. Wider ranges are discarded.
pub const MAX_RANGE_SPAN: u32 = 10_000;

const ARABIC_COMMA: char = '\u{060C}';

/// Map Arabic-Indic (U+0660..U+0669) and Extended Arabic-Indic (U+06F0..U+06F9)
/// digits to ASCII digits. Other characters pass through unchanged.
pub fn normalize_digits(input: &str) -> Cow<'_, str> {
    if !input.chars().any(|c| eastern_digit_value(c).is_some()) {
        return Cow::Borrowed(input);
    }

    Cow::Owned(
        input
            .chars()
            .map(|c| match eastern_digit_value(c) {
                Some(d) => char::from(b'0' + d),
                None => c,
            })
            .collect(),
    )
}

fn eastern_digit_value(c: char) -> Option<u8> {
    match c {
        '\u{0660}'..='\u{0669}' => Some((c as u32 - 0x0660) as u8),
        '\u{06F0}'..='\u{06F9}' => Some((c as u32 - 0x06F0) as u8),
        _ => None,
    }
}

/// Format a number with Arabic-Indic digits.
pub fn to_eastern_digits(n: u32) -> String {
    n.to_string()
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32(0x0660 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

/// Parse page input into a sorted, deduplicated page set.
///
/// Fragments are separated by ASCII commas, Arabic commas, or whitespace. Each
/// fragment is either a page number or an inclusive `start-end` range. Malformed
/// fragments, reversed ranges, and page 0 are skipped without error, so an input
/// made only of bad fragments yields an empty set.
pub fn resolve_pages(input: &str) -> PageSet {
    let normalized = normalize_digits(input);
    let mut pages = BTreeSet::new();

    let fragments = normalized
        .split(|c: char| c == ',' || c == ARABIC_COMMA || c.is_whitespace())
        .filter(|f| !f.is_empty());

    for fragment in fragments {
        if fragment.contains('-') {
            match parse_range(fragment) {
                Some((start, end)) => pages.extend(start..=end),
                None => trace!("Skipping malformed range: {:?}", fragment),
            }
        } else {
            match fragment.parse::<u32>() {
                Ok(page) if page >= 1 => {
                    pages.insert(page);
                }
                _ => trace!("Skipping malformed page: {:?}", fragment),
            }
        }
    }

    PageSet::from(pages)
}

fn parse_range(fragment: &str) -> Option<(u32, u32)> {
    let (start, end) = fragment.split_once('-')?;
    if end.contains('-') {
        return None;
    }

    let start: u32 = start.parse().ok()?;
    let end: u32 = end.parse().ok()?;

    if start == 0 || start > end || end - start >= MAX_RANGE_SPAN {
        return None;
    }

    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pages(input: &str) -> Vec<u32> {
        resolve_pages(input).into_vec()
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve_pages("").is_empty());
        assert!(resolve_pages("  ,، ").is_empty());
    }

    #[test]
    fn test_eastern_digit_range() {
        assert_eq!(pages("٢٥-٣٠"), vec![25, 26, 27, 28, 29, 30]);
    }

    #[test]
    fn test_extended_eastern_digits() {
        // Persian/Kurdish digit forms
        assert_eq!(pages("۴۱، ۴۳"), vec![41, 43]);
    }

    #[test]
    fn test_dedup_and_sort() {
        assert_eq!(pages("5, 3, 5"), vec![3, 5]);
        assert_eq!(pages("4-6 5 1"), vec![1, 4, 5, 6]);
    }

    #[test]
    fn test_reversed_range_discarded() {
        assert_eq!(pages("10-5"), Vec::<u32>::new());
        assert_eq!(pages("10-5, 2"), vec![2]);
    }

    #[test]
    fn test_malformed_fragments_skipped() {
        assert_eq!(pages("3,a,7"), vec![3, 7]);
        assert_eq!(pages("1-2-3, 4"), vec![4]);
        assert_eq!(pages("-5, 5-, x-y"), Vec::<u32>::new());
        assert_eq!(pages("0, 0-3"), Vec::<u32>::new());
    }

    #[test]
    fn test_mixed_separators() {
        assert_eq!(pages("1,2\t3\n4،5"), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_single_page_range() {
        assert_eq!(pages("7-7"), vec![7]);
    }

    #[test]
    fn test_oversized_range_discarded() {
        assert!(resolve_pages("1-4000000000").is_empty());
        assert_eq!(resolve_pages("1-10000").len(), 10_000);
    }

    #[test]
    fn test_normalize_digits_borrows_ascii() {
        assert!(matches!(normalize_digits("12-14"), Cow::Borrowed(_)));
        assert_eq!(normalize_digits("١٢-۱۴"), "12-14");
    }

    #[test]
    fn test_to_eastern_digits() {
        assert_eq!(to_eastern_digits(2530), "٢٥٣٠");
    }
}

//! Page selection: parsing free-form page input into an ordered page set.

mod resolver;

pub use resolver::{normalize_digits, resolve_pages, to_eastern_digits, MAX_RANGE_SPAN};

use std::collections::BTreeSet;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Distinct 1-based page numbers in strictly ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct PageSet(Vec<u32>);

impl PageSet {
    /// Build a page set from arbitrary numbers, sorting and dropping duplicates and zero.
    pub fn from_pages<I: IntoIterator<Item = u32>>(pages: I) -> Self {
        let set: BTreeSet<u32> = pages.into_iter().filter(|&p| p >= 1).collect();
        Self(set.into_iter().collect())
    }

    /// Lowest page in the set.
    pub fn first(&self) -> Option<u32> {
        self.0.first().copied()
    }

    /// Highest page in the set.
    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }
}

impl Deref for PageSet {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for PageSet {
    fn from(pages: Vec<u32>) -> Self {
        Self::from_pages(pages)
    }
}

impl From<PageSet> for Vec<u32> {
    fn from(set: PageSet) -> Self {
        set.0
    }
}

impl From<BTreeSet<u32>> for PageSet {
    fn from(set: BTreeSet<u32>) -> Self {
        Self::from_pages(set)
    }
}

impl std::fmt::Display for PageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Collapse consecutive runs back into ranges: [1,2,3,7] -> "1-3, 7"
        let mut parts = Vec::new();
        let mut iter = self.0.iter().copied().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while end.checked_add(1).is_some_and(|next| iter.peek() == Some(&next)) {
                end += 1;
                iter.next();
            }
            if start == end {
                parts.push(start.to_string());
            } else {
                parts.push(format!("{}-{}", start, end));
            }
        }
        write!(f, "{}", parts.join(", "))
    }
}

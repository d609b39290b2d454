//! Grades and textbooks the user picks from.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A textbook. `id` keys the saved PDF in the book store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub name: String,
}

/// A school grade and its textbooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub books: Vec<Book>,
}

impl Book {
    /// Create a book whose id is derived from its name.
    pub fn from_name(name: &str) -> Self {
        Self {
            id: slugify(name),
            name: name.to_string(),
        }
    }
}

impl Grade {
    /// Create a grade whose id is derived from its name.
    pub fn from_name(name: &str) -> Self {
        Self {
            id: slugify(name),
            name: name.to_string(),
            books: Vec::new(),
        }
    }
}

/// Hex digits of the name digest appended to ids of non-Latin names.
const DIGEST_SUFFIX_LEN: usize = 12;

/// Lowercase ASCII slug; runs of other characters become one `-`.
///
/// When the name has letters or digits outside ASCII, which the slug cannot
/// keep, a short SHA-256 digest of the whole name is appended so that names
/// differing only in those characters keep distinct ids.
pub fn slugify(name: &str) -> String {
    let name = name.trim();
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if !name.chars().any(|c| c.is_alphanumeric() && !c.is_ascii()) {
        return slug.to_string();
    }

    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    let suffix = &digest[..DIGEST_SUFFIX_LEN];
    if slug.is_empty() {
        suffix.to_string()
    } else {
        format!("{}-{}", slug, suffix)
    }
}

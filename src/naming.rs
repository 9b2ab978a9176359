//! Centralized handling of bucket folder and file names.
//!
//! Folder names in the bucket are free-form strings typed by different tools
//! (the camera import, the R2 dashboard, hand-edited JSON). Every stage has to
//! agree on three rules, so they live here:
//!
//! ## Ordering
//!
//! Names sort with the Unicode root collation at primary strength, the order
//! a browser's `localeCompare` gives with base sensitivity. Case and accents
//! are ignored (`"éclair.jpg"` sorts before `"f.jpg"`, `"avl10.jpg"` and
//! `"AVL2.jpg"` interleave by letters), and punctuation sorts before digits
//! (`"a_1.jpg"` before `"a1.jpg"`). Ties between names that differ only in
//! case or accents are broken by the raw string, so the order is total and
//! identical across runs.
//!
//! ## Apostrophes
//!
//! The ASCII apostrophe `'` and the typographic right single quote `’` are
//! interchangeable when looking up a folder. `"STREET SOUK 23'"` typed in the
//! mapping finds `"STREET SOUK 23’"` uploaded from macOS Finder, and the other
//! way round.
//!
//! ## URL Segments
//!
//! Names become URL path segments with URI-component percent encoding. A `/`
//! is kept literal so a segment that happens to carry one still addresses the
//! same object key.

use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use std::borrow::Cow;
use std::cmp::Ordering;

pub const ASCII_APOSTROPHE: char = '\'';
pub const RIGHT_SINGLE_QUOTE: char = '\u{2019}';

thread_local! {
    static COLLATOR: Option<CollatorBorrowed<'static>> = {
        let mut options = CollatorOptions::default();
        options.strength = Some(Strength::Primary);
        Collator::try_new(Default::default(), options).ok()
    };
}

/// Primary-strength collation with a raw-string tiebreak.
///
/// Falls back to comparing lowercased characters if the collation data
/// cannot be loaded.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(a, b),
            None => {
                let folded_a = a.chars().flat_map(char::to_lowercase);
                let folded_b = b.chars().flat_map(char::to_lowercase);
                folded_a.cmp(folded_b)
            }
        })
        .then_with(|| a.cmp(b))
}

/// Sort names in place with [`compare_names`].
pub fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| compare_names(a, b));
}

/// Spellings to try when looking a folder up, in lookup order:
/// the name as given, ASCII apostrophes turned typographic, then
/// typographic apostrophes turned ASCII.
pub fn spelling_variants(name: &str) -> [Cow<'_, str>; 3] {
    [
        Cow::Borrowed(name),
        Cow::Owned(name.replace(ASCII_APOSTROPHE, "\u{2019}")),
        Cow::Owned(name.replace(RIGHT_SINGLE_QUOTE, "'")),
    ]
}

/// Final `/`-separated segment of a path.
pub fn leaf_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, leaf)| leaf)
}

/// Extension of the final segment, including the dot (`".jpg"`).
///
/// A name that starts with its only dot (`".jpg"`, `".DS_Store"`) has no
/// extension. The case is preserved; callers decide how to compare.
pub fn extension(path: &str) -> Option<&str> {
    let leaf = leaf_name(path);
    match leaf.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(&leaf[dot..]),
    }
}

/// Percent-encode a name for use as a URL path segment.
pub fn encode_segment(name: &str) -> String {
    urlencoding::encode(name).replace("%2F", "/")
}

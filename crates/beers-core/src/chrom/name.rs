//! Chromosome name ordering.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::roman::roman_to_arabic;

/// A chromosome name that sorts the way biologists expect.
///
/// The ordering, applied to the lower-cased name:
///
/// 1. leading digits (sorted numerically)
/// 2. leading roman numerals (sorted by their arabic equivalents)
/// 3. leading gender or mitochondrial designators (sorted x, y, m)
/// 4. leading "chr" (the prefix itself is ignored)
/// 5. leading alphabetic characters (dictionary order)
/// 6. leading non-alphanumeric characters (character order)
///
/// When the leading portions of two names tie, the trailing portions are
/// compared by the same rules, recursing through the names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromosomeName {
    original: String,
    content: String,
}

impl ChromosomeName {
    pub fn new(content: impl Into<String>) -> Self {
        let original = content.into();
        let content = original.to_lowercase();
        Self { original, content }
    }

    /// The name as originally written, case preserved.
    pub fn original(&self) -> &str {
        &self.original
    }
}

impl fmt::Display for ChromosomeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl PartialEq for ChromosomeName {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for ChromosomeName {}

impl PartialOrd for ChromosomeName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChromosomeName {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_content(&self.content, &other.content)
    }
}

/// Split off the longest leading run of characters satisfying `class`.
fn leading_run<'a>(content: &'a str, class: impl Fn(char) -> bool) -> (&'a str, &'a str) {
    let end = content
        .char_indices()
        .find(|&(_, c)| !class(c))
        .map_or(content.len(), |(index, _)| index);
    content.split_at(end)
}

/// Compare two leading digit runs as numbers of arbitrary width.
fn cmp_numeric(lead: &str, other_lead: &str) -> Ordering {
    let lead = lead.trim_start_matches('0');
    let other_lead = other_lead.trim_start_matches('0');
    lead.len()
        .cmp(&other_lead.len())
        .then_with(|| lead.cmp(other_lead))
}

fn is_roman_char(c: char) -> bool {
    matches!(c, 'i' | 'v' | 'x')
}

fn is_roman_or_gender_char(c: char) -> bool {
    matches!(c, 'i' | 'v' | 'x' | 'y' | 'm')
}

fn cmp_content(content: &str, other: &str) -> Ordering {
    // A name that ran out of characters sorts ahead of one that has more.
    let (Some(first), Some(other_first)) = (content.chars().next(), other.chars().next()) else {
        return content.len().cmp(&other.len());
    };

    // Leading digits sort ahead of everything else.
    match (first.is_ascii_digit(), other_first.is_ascii_digit()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (true, true) => {
            let (lead, rest) = leading_run(content, |c| c.is_ascii_digit());
            let (other_lead, other_rest) = leading_run(other, |c| c.is_ascii_digit());
            return cmp_numeric(lead, other_lead).then_with(|| cmp_content(rest, other_rest));
        }
        (false, false) => {}
    }

    // Roman numerals and the x/y/m designators come next, as one class.
    match (
        is_roman_or_gender_char(first),
        is_roman_or_gender_char(other_first),
    ) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    let (lead, rest) = leading_run(content, is_roman_char);
    let (other_lead, other_rest) = leading_run(other, is_roman_char);
    if let (Some(value), Some(other_value)) = (roman_to_arabic(lead), roman_to_arabic(other_lead)) {
        return value
            .cmp(&other_value)
            .then_with(|| cmp_content(rest, other_rest));
    }

    // X or Y ahead of M.
    if first == 'm' && matches!(other_first, 'x' | 'y') {
        return Ordering::Greater;
    }
    if matches!(first, 'x' | 'y') && other_first == 'm' {
        return Ordering::Less;
    }

    // A "chr" prefix sorts ahead of anything left, and otherwise drops out.
    match (content.starts_with("chr"), other.starts_with("chr")) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (true, true) => return cmp_content(&content[3..], &other[3..]),
        (false, false) => {}
    }

    // Remaining alphabetic names in dictionary order.
    match (first.is_alphabetic(), other_first.is_alphabetic()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (true, true) => {
            let (lead, rest) = leading_run(content, char::is_alphabetic);
            let (other_lead, other_rest) = leading_run(other, char::is_alphabetic);
            return lead
                .cmp(other_lead)
                .then_with(|| cmp_content(rest, other_rest));
        }
        (false, false) => {}
    }

    // Only non-alphanumeric leaders remain; plain character order.
    let (lead, rest) = leading_run(content, |c| !c.is_alphanumeric());
    let (other_lead, other_rest) = leading_run(other, |c| !c.is_alphanumeric());
    lead.cmp(other_lead)
        .then_with(|| cmp_content(rest, other_rest))
}

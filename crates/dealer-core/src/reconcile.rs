//! # Item Reconciliation
//!
//! When an invoice or purchase is edited, the vehicles on the saved document
//! are compared with the vehicles on the edited one. The result says which
//! stock movements the edit needs.
//!
//! ```text
//!   saved:  {A, B}        edited: {A, C}
//!
//!   removed {B}  ──► invoice: release B      purchase: withdraw B
//!   added   {C}  ──► invoice: reserve C      purchase: receive C
//!   kept    {A}  ──► update line in place
//! ```
//!
//! Chassis numbers are compared after [`normalize_identifier`], so
//! `" ma3erl "` and `"MA3ERL"` are the same vehicle.

use std::collections::HashSet;

/// Canonical form of a chassis or engine number: trimmed, upper case.
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Returns the first identifier that appears more than once, if any.
pub fn find_duplicate<'a, I>(identifiers: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    identifiers
        .into_iter()
        .map(normalize_identifier)
        .find(|id| !seen.insert(id.clone()))
}

/// Stock movements implied by an edit.
///
/// Each list keeps the order the chassis numbers were given in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDiff {
    /// On the edited document only.
    pub added: Vec<String>,
    /// On the saved document only.
    pub removed: Vec<String>,
    /// On both.
    pub kept: Vec<String>,
}

/// Compares the chassis numbers of a saved document with an edited one.
///
/// ## Example
/// ```rust
/// use dealer_core::reconcile::diff_chassis;
///
/// let diff = diff_chassis(["A", "B"], ["A", "C"]);
/// assert_eq!(diff.removed, vec!["B"]);
/// assert_eq!(diff.added, vec!["C"]);
/// assert_eq!(diff.kept, vec!["A"]);
/// ```
pub fn diff_chassis<'a, P, N>(previous: P, next: N) -> ItemDiff
where
    P: IntoIterator<Item = &'a str>,
    N: IntoIterator<Item = &'a str>,
{
    let previous: Vec<String> = previous.into_iter().map(normalize_identifier).collect();
    let next: Vec<String> = next.into_iter().map(normalize_identifier).collect();

    let previous_set: HashSet<&str> = previous.iter().map(String::as_str).collect();
    let next_set: HashSet<&str> = next.iter().map(String::as_str).collect();

    let mut diff = ItemDiff::default();
    for chassis in &next {
        if previous_set.contains(chassis.as_str()) {
            diff.kept.push(chassis.clone());
        } else {
            diff.added.push(chassis.clone());
        }
    }
    diff.removed = previous
        .iter()
        .filter(|c| !next_set.contains(c.as_str()))
        .cloned()
        .collect();

    diff
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_one_keep_one() {
        let diff = diff_chassis(["A", "B"], ["A"]);
        assert_eq!(diff.kept, vec!["A"]);
        assert_eq!(diff.removed, vec!["B"]);
        assert!(diff.added.is_empty());
    }

    #[test]
    fn test_identical_lists_are_unchanged() {
        let diff = diff_chassis(["A", "B"], ["B", "A"]);
        assert!(diff.added.is_empty() && diff.removed.is_empty());
        assert_eq!(diff.kept, vec!["B", "A"]);
    }

    #[test]
    fn test_full_replacement() {
        let diff = diff_chassis(["A", "B"], ["C", "D"]);
        assert_eq!(diff.removed, vec!["A", "B"]);
        assert_eq!(diff.added, vec!["C", "D"]);
        assert!(diff.kept.is_empty());
    }

    #[test]
    fn test_comparison_is_normalized() {
        let diff = diff_chassis(["ma3erl01"], [" MA3ERL01 "]);
        assert!(diff.added.is_empty() && diff.removed.is_empty());
        assert_eq!(diff.kept, vec!["MA3ERL01"]);
    }

    #[test]
    fn test_find_duplicate() {
        assert_eq!(find_duplicate(["A", "B", "a"]), Some("A".to_string()));
        assert_eq!(find_duplicate(["A", "B"]), None);
        assert_eq!(find_duplicate(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("  me4jf50\t"), "ME4JF50");
    }
}

//! The set of email addresses allowed past the gate.
//!
//! Matching is exact: case-sensitive, no whitespace trimming and no
//! address normalization. `Alice@example.com` and `alice@example.com` are
//! different entries.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Authorized email addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList {
    emails: HashSet<String>,
}

impl AllowList {
    /// Creates an empty allow-list. Nobody is authorized.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the email is on the list.
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    /// Returns true if nobody is authorized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            emails: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_authorizes_nobody() {
        let list = AllowList::empty();
        assert!(list.is_empty());
        assert!(!list.contains("a@x.com"));
        assert!(!list.contains(""));
    }

    #[test]
    fn exact_match_only() {
        let list: AllowList = ["a@x.com"].into_iter().collect();
        assert!(list.contains("a@x.com"));
        assert!(!list.contains("A@x.com"));
        assert!(!list.contains(" a@x.com"));
        assert!(!list.contains("a@x.com "));
    }

    #[test]
    fn duplicates_collapse() {
        let list: AllowList = ["a@x.com", "a@x.com", "b@x.com"].into_iter().collect();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn deserializes_from_plain_list() {
        let list: AllowList =
            serde_json::from_str(r#"["a@x.com", "b@x.com"]"#).expect("deserialize");
        assert!(list.contains("b@x.com"));
        assert_eq!(list.len(), 2);
    }
}

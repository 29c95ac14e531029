use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A single literal rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternEntry {
    /// The literal text to look for. Never empty.
    #[serde(rename = "match")]
    pub find: String,
    /// The text substituted for every occurrence of `find`. May be empty.
    #[serde(default)]
    pub replacement: String,
}

impl PatternEntry {
    pub fn new(find: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replacement: replacement.into(),
        }
    }

    /// `true` when applying this entry can never change any text.
    pub fn is_noop(&self) -> bool {
        self.find == self.replacement
    }
}

/// An ordered list of rewrite rules.
///
/// Entries are applied in sequence and each one sees the text produced by the
/// entries before it, so the order here is part of the table's meaning.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    entries: Vec<PatternEntry>,
}

impl PatternTable {
    /// Builds a table, rejecting any entry with an empty `match`.
    pub fn new(entries: Vec<PatternEntry>) -> Result<Self> {
        if let Some(pos) = entries.iter().position(|e| e.find.is_empty()) {
            return Err(format!("Pattern table entry {} has an empty match string", pos + 1).into());
        }
        Ok(Self { entries })
    }

    /// Drops every entry whose match and replacement are identical.
    ///
    /// Returns the collapsed table and the dropped entries, in table order.
    pub fn without_noops(self) -> (Self, Vec<PatternEntry>) {
        let (noops, entries): (Vec<_>, Vec<_>) =
            self.entries.into_iter().partition(PatternEntry::is_noop);
        (Self { entries }, noops)
    }

    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    /// The match strings of the table, in order, without duplicates.
    pub fn match_strings(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !out.contains(&entry.find) {
                out.push(entry.find.clone());
            }
        }
        out
    }
}

impl Deref for PatternTable {
    type Target = [PatternEntry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

/// A flat list of literal strings used by search mode.
///
/// Unlike [`PatternTable`], order carries no meaning beyond display.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<String>,
}

impl PatternList {
    /// Builds a list, rejecting empty strings and silently dropping duplicates.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for p in patterns {
            let p = p.into();
            if p.is_empty() {
                return Err("Search patterns must not be empty".into());
            }
            if !out.contains(&p) {
                out.push(p);
            }
        }
        Ok(Self { patterns: out })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.patterns
    }
}

impl Deref for PatternList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_match_rejected() {
        let err = PatternTable::new(vec![
            PatternEntry::new("a", "b"),
            PatternEntry::new("", "c"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("entry 2"));
    }

    #[test]
    fn test_empty_replacement_allowed() {
        let table = PatternTable::new(vec![PatternEntry::new("|| legacy", "")]).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_without_noops_keeps_order() {
        let table = PatternTable::new(vec![
            PatternEntry::new("a", "b"),
            PatternEntry::new("same", "same"),
            PatternEntry::new("c", "d"),
        ])
        .unwrap();

        let (table, dropped) = table.without_noops();

        let finds: Vec<&str> = table.iter().map(|e| e.find.as_str()).collect();
        assert_eq!(finds, vec!["a", "c"]);
        assert_eq!(dropped, vec![PatternEntry::new("same", "same")]);
    }

    #[test]
    fn test_match_strings_dedup() {
        let table = PatternTable::new(vec![
            PatternEntry::new("x", "1"),
            PatternEntry::new("y", "2"),
            PatternEntry::new("x", "3"),
        ])
        .unwrap();
        assert_eq!(table.match_strings(), vec!["x", "y"]);
    }

    #[test]
    fn test_pattern_list_rejects_empty() {
        assert!(PatternList::new(vec![".isOrgAdmin", ""]).is_err());
        let list = PatternList::new(vec!["a", "b", "a"]).unwrap();
        assert_eq!(list.as_slice(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_entry_yaml_field_names() {
        let entry: PatternEntry =
            serde_yaml::from_str("match: \"userData.admin\"\nreplacement: userData.isOrgAdmin\n")
                .unwrap();
        assert_eq!(entry, PatternEntry::new("userData.admin", "userData.isOrgAdmin"));

        let deletion: PatternEntry = serde_yaml::from_str("match: \"|| legacy\"\n").unwrap();
        assert_eq!(deletion.replacement, "");
    }
}

//! Glossary entry handling
//!
//! A glossary is a user-managed source→target term-substitution list applied
//! during translation. Entries travel over the wire in tab-separated-values
//! form; this module validates terms and converts between the map and TSV
//! representations.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// A validated set of glossary entries mapping source terms to target terms
///
/// Terms may not be empty and may not contain tab or newline characters;
/// duplicate source terms are rejected. Entries are kept in a stable order so
/// the TSV serialization is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlossaryEntries {
    entries: BTreeMap<String, String>,
}

impl GlossaryEntries {
    /// Create an empty entry set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an entry set from (source, target) pairs, validating each term
    pub fn from_pairs<I, S, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut entries = Self::new();
        for (source, target) in pairs {
            entries.insert(source.into(), target.into())?;
        }
        Ok(entries)
    }

    /// Parse entries from tab-separated-values text, one entry per line
    pub fn from_tsv(tsv: &str) -> Result<Self> {
        let mut entries = Self::new();
        for (index, line) in tsv.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (source, target) = line.split_once('\t').ok_or_else(|| {
                Error::InvalidGlossaryEntries(format!(
                    "line {}: expected source and target separated by a tab",
                    index + 1
                ))
            })?;
            entries.insert(source.to_string(), target.to_string())?;
        }
        Ok(entries)
    }

    /// Add one entry, validating both terms and rejecting duplicate sources
    pub fn insert(&mut self, source: String, target: String) -> Result<()> {
        validate_term(&source, "source")?;
        validate_term(&target, "target")?;
        if self.entries.contains_key(&source) {
            return Err(Error::InvalidGlossaryEntries(format!(
                "duplicate source term {source:?}"
            )));
        }
        self.entries.insert(source, target);
        Ok(())
    }

    /// Look up the target term for a source term
    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (source, target) pairs in stable order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Serialize the entries to tab-separated-values text
    pub fn to_tsv(&self) -> String {
        let mut tsv = String::new();
        for (source, target) in &self.entries {
            tsv.push_str(source);
            tsv.push('\t');
            tsv.push_str(target);
            tsv.push('\n');
        }
        tsv
    }
}

/// Terms must be non-empty after trimming and free of tab/newline characters.
fn validate_term(term: &str, side: &str) -> Result<()> {
    if term.trim().is_empty() {
        return Err(Error::InvalidGlossaryEntries(format!(
            "{side} term must not be empty"
        )));
    }
    if term.contains(['\t', '\n', '\r']) {
        return Err(Error::InvalidGlossaryEntries(format!(
            "{side} term {term:?} contains an invalid character"
        )));
    }
    Ok(())
}

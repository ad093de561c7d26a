//! Query options and result shaping.

use ldap3::Scope;

use crate::entry::DirectoryEntry;
use crate::error::{AdError, Result};

/// Options of [`crate::AdTools::ldap_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Fail with [`AdError::MultipleHits`] when more than one entry matches.
    pub single_result: bool,
    /// Search the whole subtree instead of the immediate children.
    pub subtree: bool,
    /// Attributes to return.
    pub attributes: Vec<String>,
    /// Search base. Falls back to the session base DN.
    pub base_dn: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            single_result: true,
            subtree: true,
            attributes: vec!["dn".to_owned()],
            base_dn: None,
        }
    }
}

impl QueryOptions {
    pub fn single_result(mut self, single: bool) -> Self {
        self.single_result = single;
        self
    }

    pub fn subtree(mut self, subtree: bool) -> Self {
        self.subtree = subtree;
        self
    }

    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn base_dn(mut self, dn: impl Into<String>) -> Self {
        self.base_dn = Some(dn.into());
        self
    }

    pub(crate) fn scope(&self) -> Scope {
        if self.subtree {
            Scope::Subtree
        } else {
            Scope::OneLevel
        }
    }
}

/// Outcome of a query, depending on the result count and options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// First value of the single requested attribute.
    Value(String),
    /// The single matched entry.
    Entry(DirectoryEntry),
    /// Every matched entry, in server order.
    Entries(Vec<DirectoryEntry>),
}

impl QueryResult {
    pub fn into_value(self) -> Option<String> {
        match self {
            QueryResult::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_entry(self) -> Option<DirectoryEntry> {
        match self {
            QueryResult::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn into_entries(self) -> Vec<DirectoryEntry> {
        match self {
            QueryResult::Value(_) => Vec::new(),
            QueryResult::Entry(entry) => vec![entry],
            QueryResult::Entries(entries) => entries,
        }
    }
}

/// Reduce matched entries to exactly one, or fail.
pub(crate) fn single_entry(
    filter: &str,
    mut entries: Vec<DirectoryEntry>,
) -> Result<DirectoryEntry> {
    match entries.len() {
        0 => Err(AdError::NoHits(filter.to_owned())),
        1 => Ok(entries.remove(0)),
        _ => Err(AdError::MultipleHits(filter.to_owned())),
    }
}

/// Shape search results according to `options`.
pub(crate) fn shape(
    filter: &str,
    entries: Vec<DirectoryEntry>,
    options: &QueryOptions,
) -> Result<QueryResult> {
    if entries.is_empty() {
        return Err(AdError::NoHits(filter.to_owned()));
    }

    if !options.single_result {
        return Ok(QueryResult::Entries(entries));
    }

    let entry = single_entry(filter, entries)?;
    match options.attributes.as_slice() {
        [field] => entry
            .first(field)
            .filter(|value| !value.is_empty())
            .map(|value| QueryResult::Value(value.to_owned()))
            .ok_or_else(|| AdError::invalid(format!("field {field} is empty"))),
        _ => Ok(QueryResult::Entry(entry)),
    }
}

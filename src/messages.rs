//! Message catalog keyed by [`ErrorKind`].
//!
//! The catalog is loaded once, at process start, by the presentation layer.
//! Errors themselves never carry translated text.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{AdError, ErrorKind, Result};

static CATALOG: OnceLock<MessageCatalog> = OnceLock::new();

/// User facing texts for each error kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MessageCatalog {
    messages: HashMap<ErrorKind, String>,
}

impl MessageCatalog {
    /// Parse a YAML mapping such as `no_hits: "Fant ingen treff for {detail}"`.
    ///
    /// Unknown keys are ignored.
    pub fn from_yaml(input: &str) -> Result<Self> {
        let raw: HashMap<String, String> = serde_yaml::from_str(input)?;
        Ok(Self::from_raw(raw))
    }

    /// Reads a catalog file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            AdError::invalid(format!(
                "cannot open message catalog {}: {err}",
                path.display()
            ))
        })?;
        let raw: HashMap<String, String> = serde_yaml::from_reader(file)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(mut raw: HashMap<String, String>) -> Self {
        let messages = ErrorKind::ALL
            .into_iter()
            .filter_map(|kind| raw.remove(kind.as_str()).map(|m| (kind, m)))
            .collect();

        Self { messages }
    }

    pub fn get(&self, kind: ErrorKind) -> Option<&str> {
        self.messages.get(&kind).map(String::as_str)
    }

    /// Render an error, replacing `{detail}` with the error's own text.
    pub fn render(&self, err: &AdError) -> String {
        match self.get(err.kind()) {
            Some(template) => template.replace("{detail}", &err.to_string()),
            None => err.to_string(),
        }
    }
}

/// Install the process-wide catalog.
///
/// Returns `false` if a catalog was already installed.
pub fn install(catalog: MessageCatalog) -> bool {
    CATALOG.set(catalog).is_ok()
}

/// Describe an error using the installed catalog, if any.
pub fn describe(err: &AdError) -> String {
    match CATALOG.get() {
        Some(catalog) => catalog.render(err),
        None => err.to_string(),
    }
}

//! Search filters for object lookups.

use std::fmt;
use std::str::FromStr;

use crate::error::{AdError, Result};

/// Escape a value before substituting it into a search filter.
pub fn escape_filter_value(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '*' => out.push_str(r"\2a"),
            '(' => out.push_str(r"\28"),
            ')' => out.push_str(r"\29"),
            '\\' => out.push_str(r"\5c"),
            '\0' => out.push_str(r"\00"),
            c => out.push(c),
        }
    }
    out
}

/// Categories of objects the locator knows how to find.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// A user, by display name.
    #[default]
    User,
    /// A user, by user principal name.
    Upn,
    /// A user, by pre-Windows 2000 logon name.
    Username,
    /// A computer, by name.
    Computer,
}

impl ObjectType {
    /// Attribute matched against the searched name.
    pub fn attribute(&self) -> &'static str {
        match self {
            ObjectType::User => "displayName",
            ObjectType::Upn => "userPrincipalName",
            ObjectType::Username => "sAMAccountName",
            ObjectType::Computer => "name",
        }
    }

    pub fn object_class(&self) -> &'static str {
        match self {
            ObjectType::Computer => "computer",
            _ => "user",
        }
    }

    /// Attribute returned when the caller asks for none.
    pub fn default_attribute(&self) -> &'static str {
        match self {
            ObjectType::User | ObjectType::Username => "sAMAccountName",
            ObjectType::Upn => "userPrincipalName",
            ObjectType::Computer => "name",
        }
    }

    /// Build the search filter for `name`. The name is escaped.
    pub fn filter(&self, name: &str) -> String {
        format!(
            "(&({}={})(objectClass={}))",
            self.attribute(),
            escape_filter_value(name),
            self.object_class()
        )
    }
}

impl FromStr for ObjectType {
    type Err = AdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(ObjectType::User),
            "upn" => Ok(ObjectType::Upn),
            "username" => Ok(ObjectType::Username),
            "computer" => Ok(ObjectType::Computer),
            _ => Err(AdError::invalid(format!("invalid type {s}"))),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectType::User => "user",
            ObjectType::Upn => "upn",
            ObjectType::Username => "username",
            ObjectType::Computer => "computer",
        })
    }
}

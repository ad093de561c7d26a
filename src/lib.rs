//! adtools binds to Active Directory over LDAP, finds users, computers and
//! groups, moves objects between organizational units and resets passwords.

#![forbid(unsafe_code)]

pub mod account;
pub mod adtools;
pub mod config;
pub mod directory;
pub mod entry;
pub mod error;
pub mod filetime;
pub mod filter;
pub mod messages;
pub mod password;
pub mod query;
pub mod telemetry;

pub use crate::account::{AccountControl, decode_account_control};
pub use crate::adtools::AdTools;
pub use crate::config::{
    ConfigStore, DomainConfig, Domains, Protocol, SessionConfig,
};
pub use crate::directory::{Directory, LdapSession};
pub use crate::entry::{DirectoryEntry, extract_field, field_label};
pub use crate::error::{AdError, ErrorKind, Result};
pub use crate::filter::{ObjectType, escape_filter_value};
pub use crate::query::{QueryOptions, QueryResult};

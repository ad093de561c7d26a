//! Error handler for adtools.

use ldap3::LdapError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdError>;

/// LDAP result code sent back on a rejected simple bind.
pub const INVALID_CREDENTIALS: u32 = 49;

/// Enum representing every failure surfaced by a directory session.
#[derive(Debug, Error)]
pub enum AdError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("unable to connect: {details}")]
    Connection {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid user name or password")]
    Authentication,

    #[error("directory returned rc={code}: {message}")]
    Directory { code: u32, message: String },

    #[error("no hits for query {0}")]
    NoHits(String),

    #[error("multiple hits for query {0}")]
    MultipleHits(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// Stable error categories, used as keys by the message catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Connection,
    Authentication,
    Directory,
    NoHits,
    MultipleHits,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::InvalidInput,
        ErrorKind::Connection,
        ErrorKind::Authentication,
        ErrorKind::Directory,
        ErrorKind::NoHits,
        ErrorKind::MultipleHits,
    ];

    /// Snake case name used in catalog files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Connection => "connection",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Directory => "directory",
            ErrorKind::NoHits => "no_hits",
            ErrorKind::MultipleHits => "multiple_hits",
        }
    }
}

impl AdError {
    pub fn invalid(details: impl Into<String>) -> Self {
        Self::InvalidInput(details.into())
    }

    pub fn connection<E>(details: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            details: details.into(),
            source: Some(Box::new(err)),
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdError::InvalidInput(_) | AdError::Config(_) => {
                ErrorKind::InvalidInput
            },
            AdError::Connection { .. } => ErrorKind::Connection,
            AdError::Authentication => ErrorKind::Authentication,
            AdError::Directory { .. } => ErrorKind::Directory,
            AdError::NoHits(_) => ErrorKind::NoHits,
            AdError::MultipleHits(_) => ErrorKind::MultipleHits,
        }
    }

    /// Map a failed bind, turning `invalidCredentials` into
    /// [`AdError::Authentication`].
    pub fn from_bind(err: LdapError) -> Self {
        match err {
            LdapError::LdapResult { result }
                if result.rc == INVALID_CREDENTIALS =>
            {
                AdError::Authentication
            },
            err => err.into(),
        }
    }
}

impl From<LdapError> for AdError {
    fn from(err: LdapError) -> Self {
        match err {
            LdapError::LdapResult { result } => AdError::Directory {
                code: result.rc,
                message: if result.text.is_empty() {
                    result.to_string()
                } else {
                    result.text
                },
            },
            err => AdError::connection(err.to_string(), err),
        }
    }
}

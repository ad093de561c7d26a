//! Directory access port and its LDAP adapter.

use std::collections::HashSet;
use std::time::Duration;

use ldap3::{LdapConn, LdapConnSettings, Mod, Scope, SearchEntry};
use url::Url;

use crate::config::SessionConfig;
use crate::entry::DirectoryEntry;
use crate::error::{AdError, Result};

/// Time allowed to open the network connection.
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(1);

/// Blocking primitives needed by [`crate::AdTools`].
pub trait Directory {
    /// Authenticate the session with a simple bind.
    fn simple_bind(&mut self, bind_dn: &str, password: &str) -> Result<()>;

    fn search(
        &mut self,
        base: &str,
        scope: Scope,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Vec<DirectoryEntry>>;

    fn add(
        &mut self,
        dn: &str,
        attrs: Vec<(String, HashSet<String>)>,
    ) -> Result<()>;

    fn modify(&mut self, dn: &str, mods: Vec<Mod<Vec<u8>>>) -> Result<()>;

    /// Rename `dn` to `rdn` under `new_parent`, dropping the old RDN.
    fn rename(&mut self, dn: &str, rdn: &str, new_parent: &str) -> Result<()>;

    fn unbind(&mut self) -> Result<()>;
}

/// Build the connection URL of a session.
pub fn endpoint_url(config: &SessionConfig) -> Result<Url> {
    let raw = format!(
        "{}://{}:{}",
        config.protocol.scheme(),
        config.host,
        config.port
    );

    Url::parse(&raw).map_err(|err| {
        AdError::connection(format!("invalid host {}: {err}", config.host), err)
    })
}

/// LDAP v3 session over [`LdapConn`].
///
/// Referrals are never chased.
pub struct LdapSession {
    conn: LdapConn,
    url: Url,
}

impl LdapSession {
    /// Open a connection to the configured host. Does not bind.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        let url = endpoint_url(config)?;
        let settings = LdapConnSettings::new().set_conn_timeout(NETWORK_TIMEOUT);

        tracing::debug!(%url, "opening LDAP connection");
        let conn = LdapConn::with_settings(settings, url.as_str())
            .map_err(|err| AdError::connection(url.to_string(), err))?;

        Ok(Self { conn, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Directory for LdapSession {
    fn simple_bind(&mut self, bind_dn: &str, password: &str) -> Result<()> {
        self.conn
            .simple_bind(bind_dn, password)
            .and_then(|res| res.success())
            .map_err(AdError::from_bind)?;
        Ok(())
    }

    fn search(
        &mut self,
        base: &str,
        scope: Scope,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Vec<DirectoryEntry>> {
        let (entries, _) = self
            .conn
            .search(base, scope, filter, attrs.to_vec())?
            .success()?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_ref() && !entry.is_intermediate())
            .map(|entry| SearchEntry::construct(entry).into())
            .collect())
    }

    fn add(
        &mut self,
        dn: &str,
        attrs: Vec<(String, HashSet<String>)>,
    ) -> Result<()> {
        self.conn.add(dn, attrs)?.success()?;
        Ok(())
    }

    fn modify(&mut self, dn: &str, mods: Vec<Mod<Vec<u8>>>) -> Result<()> {
        self.conn.modify(dn, mods)?.success()?;
        Ok(())
    }

    fn rename(&mut self, dn: &str, rdn: &str, new_parent: &str) -> Result<()> {
        self.conn
            .modifydn(dn, rdn, true, Some(new_parent))?
            .success()?;
        Ok(())
    }

    fn unbind(&mut self) -> Result<()> {
        self.conn.unbind()?;
        Ok(())
    }
}

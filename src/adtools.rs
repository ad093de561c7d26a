//! Active Directory session.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use ldap3::{Mod, Scope};
use regex_lite::Regex;
use tracing::instrument;

use crate::account::AccountControl;
use crate::config::{ConfigStore, DomainConfig, Protocol, SessionConfig};
use crate::directory::{Directory, LdapSession};
use crate::entry::DirectoryEntry;
use crate::error::{AdError, Result};
use crate::filter::ObjectType;
use crate::password::encode_unicode_pwd;
use crate::query::{self, QueryOptions, QueryResult};

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9@.,=-]+$").expect("valid username pattern")
});

static PASSWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9 !@#$%^&*()+-]+$").expect("valid password pattern")
});

/// Leaf component of a DN, up to the first `,XX` boundary. Attribute
/// types in a DN ignore case.
static LEAF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(CN=.+?),[A-Z]{2}.+").expect("valid leaf pattern")
});

/// `groupType` of a global security group (0x80000002), as AD's signed
/// 32-bit integer.
pub const SECURITY_GROUP: i32 = 0x8000_0002_u32 as i32;

/// Check bind credentials before anything is sent to the server.
pub fn validate_credentials(username: &str, password: &str) -> Result<()> {
    if username.is_empty() || password.is_empty() {
        return Err(AdError::invalid(
            "username and/or password are not specified",
        ));
    }

    if !USERNAME_RE.is_match(username) || !PASSWORD_RE.is_match(password) {
        return Err(AdError::invalid(
            "invalid characters in username or password",
        ));
    }

    Ok(())
}

/// Relative name of the object `dn` points to, e.g. `CN=foo`.
pub fn leaf_rdn(dn: &str) -> Option<String> {
    LEAF_RE
        .is_match(dn)
        .then(|| LEAF_RE.replace(dn, "$1").into_owned())
}

/// Opens a directory for a resolved configuration. Does not bind.
pub type Opener = Box<dyn FnMut(&SessionConfig) -> Result<Box<dyn Directory>>>;

fn ldap_opener(config: &SessionConfig) -> Result<Box<dyn Directory>> {
    Ok(Box::new(LdapSession::open(config)?))
}

/// Session against one domain controller.
///
/// Owns at most one bound connection, unbound when dropped.
pub struct AdTools {
    directory: Option<Box<dyn Directory>>,
    config: Option<SessionConfig>,
    opener: Opener,
}

impl Default for AdTools {
    fn default() -> Self {
        Self {
            directory: None,
            config: None,
            opener: Box::new(ldap_opener),
        }
    }
}

impl fmt::Debug for AdTools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdTools")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl AdTools {
    /// Create an unconnected session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unconnected session that opens directories with
    /// `opener` instead of a network connection.
    pub fn with_opener<F, D>(mut opener: F) -> Self
    where
        F: FnMut(&SessionConfig) -> Result<D> + 'static,
        D: Directory + 'static,
    {
        Self {
            directory: None,
            config: None,
            opener: Box::new(move |config: &SessionConfig| {
                Ok(Box::new(opener(config)?) as Box<dyn Directory>)
            }),
        }
    }

    /// Wrap an already opened directory. The directory is used as is: call
    /// [`AdTools::bind`] if it still needs authentication.
    pub fn with_directory<D>(config: SessionConfig, directory: D) -> Self
    where
        D: Directory + 'static,
    {
        Self {
            directory: Some(Box::new(directory)),
            config: Some(config),
            opener: Box::new(ldap_opener),
        }
    }

    /// Connect and bind using the domain `key` of `store`.
    pub fn connect(key: &str, store: &impl ConfigStore) -> Result<Self> {
        let mut tools = Self::new();
        tools.connect_domain(key, store)?;
        Ok(tools)
    }

    /// Connect this session using the domain `key` of `store`.
    #[instrument(skip(self, store))]
    pub fn connect_domain(
        &mut self,
        key: &str,
        store: &impl ConfigStore,
    ) -> Result<()> {
        let domain = store.lookup(key).ok_or_else(|| {
            AdError::invalid(format!("domain key {key} not found in config file"))
        })?;
        let config = domain.resolve()?;

        let username = config.username.clone().unwrap_or_default();
        let password = config.password.clone().unwrap_or_default();
        self.open(config, &username, &password)
    }

    /// Build a session from a configuration record.
    ///
    /// Binds only when both username and password are set. Otherwise the
    /// session stays unconnected until [`AdTools::connect_and_bind`].
    pub fn connect_config(domain: &DomainConfig) -> Result<Self> {
        let mut tools = Self::new();
        tools.load_config(domain)?;
        Ok(tools)
    }

    /// Apply a configuration record to this session, binding when it
    /// carries credentials.
    pub fn load_config(&mut self, domain: &DomainConfig) -> Result<()> {
        let config = domain.resolve()?;

        match (config.username.clone(), config.password.clone()) {
            (Some(username), Some(password)) => {
                self.open(config, &username, &password)
            },
            _ => {
                self.disconnect();
                self.config = Some(config);
                Ok(())
            },
        }
    }

    /// Connect and bind using explicit credentials.
    ///
    /// `host` falls back to the configured domain controller. `protocol`
    /// must be `plaintext` or `encrypted`. `port` defaults to the
    /// protocol's port.
    #[instrument(skip(self, password))]
    pub fn connect_and_bind(
        &mut self,
        username: &str,
        password: &str,
        host: Option<&str>,
        protocol: &str,
        port: Option<&str>,
    ) -> Result<()> {
        validate_credentials(username, password)?;

        let port = port
            .filter(|port| !port.is_empty())
            .map(|port| {
                port.parse::<u16>().map_err(|_| {
                    AdError::invalid("port number must be numeric")
                })
            })
            .transpose()?;
        let protocol: Protocol = protocol.parse()?;

        let host = match host.filter(|host| !host.is_empty()) {
            Some(host) => host.to_owned(),
            None => self
                .config
                .as_ref()
                .map(|config| config.host.clone())
                .ok_or_else(|| {
                    AdError::invalid("DC not specified and not set in config")
                })?,
        };

        let mut config = SessionConfig::new(
            host,
            protocol,
            port.unwrap_or_else(|| protocol.default_port()),
        );
        config.base_dn = self.config.as_ref().and_then(|c| c.base_dn.clone());

        self.open(config, username, password)
    }

    /// Bind the current directory with new credentials.
    #[instrument(skip(self, password))]
    pub fn bind(&mut self, username: &str, password: &str) -> Result<()> {
        validate_credentials(username, password)?;
        self.directory()?.simple_bind(username, password)?;
        tracing::info!(username, "bound to directory");
        Ok(())
    }

    fn open(
        &mut self,
        config: SessionConfig,
        username: &str,
        password: &str,
    ) -> Result<()> {
        validate_credentials(username, password)?;

        let mut directory = (self.opener)(&config)?;
        directory.simple_bind(username, password)?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            username,
            "bound to directory"
        );

        self.disconnect();
        self.directory = Some(directory);
        self.config = Some(config);
        Ok(())
    }

    /// Unbind and release the current connection, if any.
    pub fn disconnect(&mut self) {
        if let Some(mut directory) = self.directory.take() {
            if let Err(err) = directory.unbind() {
                tracing::warn!(error = %err, "failed to unbind");
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.directory.is_some()
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    fn directory(&mut self) -> Result<&mut (dyn Directory + 'static)> {
        self.directory
            .as_deref_mut()
            .ok_or_else(|| AdError::invalid("not connected to AD"))
    }

    fn base_dn(&self, base_dn: Option<&str>) -> Result<String> {
        base_dn
            .filter(|dn| !dn.is_empty())
            .or_else(|| self.config.as_ref()?.base_dn.as_deref())
            .map(str::to_owned)
            .ok_or_else(|| {
                AdError::invalid("base DN empty and not set in config")
            })
    }

    fn search(
        &mut self,
        filter: &str,
        base_dn: Option<&str>,
        scope: Scope,
        attributes: &[String],
    ) -> Result<Vec<DirectoryEntry>> {
        self.directory()?;
        let base = self.base_dn(base_dn)?;
        let attrs: Vec<&str> = attributes.iter().map(String::as_str).collect();

        let entries = self.directory()?.search(&base, scope, filter, &attrs)?;
        tracing::debug!(%base, filter, hits = entries.len(), "search done");
        Ok(entries)
    }

    /// Run a search and shape its results according to `options`.
    pub fn ldap_query(
        &mut self,
        filter: &str,
        options: &QueryOptions,
    ) -> Result<QueryResult> {
        let entries = self.search(
            filter,
            options.base_dn.as_deref(),
            options.scope(),
            &options.attributes,
        )?;

        query::shape(filter, entries, options)
    }

    /// Find exactly one object by name.
    ///
    /// `name` is escaped before it is placed in the filter. Without
    /// `attributes`, only the default attribute of `kind` is fetched.
    pub fn find_object(
        &mut self,
        name: &str,
        base_dn: Option<&str>,
        kind: ObjectType,
        attributes: Option<&[&str]>,
    ) -> Result<DirectoryEntry> {
        let attributes: Vec<String> = match attributes {
            Some(attrs) if !attrs.is_empty() => {
                attrs.iter().map(|a| a.to_string()).collect()
            },
            _ => vec![kind.default_attribute().to_owned()],
        };

        let filter = kind.filter(name);
        let entries =
            self.search(&filter, base_dn, Scope::Subtree, &attributes)?;
        query::single_entry(&filter, entries)
    }

    /// Decoded `userAccountControl` of the object at `dn`.
    pub fn account_control(&mut self, dn: &str) -> Result<AccountControl> {
        let attrs = ["userAccountControl".to_owned()];
        let entries =
            self.search("(objectClass=*)", Some(dn), Scope::Base, &attrs)?;
        let entry = query::single_entry(dn, entries)?;

        entry.account_control().ok_or_else(|| {
            AdError::invalid("field userAccountControl is empty")
        })
    }

    /// Move an object under `new_parent` and return its new DN.
    #[instrument(skip(self))]
    pub fn move_object(&mut self, dn: &str, new_parent: &str) -> Result<String> {
        let rdn = leaf_rdn(dn).ok_or_else(|| {
            AdError::invalid(format!("cannot find object name in {dn}"))
        })?;

        self.directory()?.rename(dn, &rdn, new_parent)?;
        tracing::info!(dn, new_parent, "object moved");
        Ok(format!("{rdn},{new_parent}"))
    }

    /// Reset the password of `dn`.
    ///
    /// With `must_change`, the user has to pick a new password at next
    /// logon.
    #[instrument(skip(self, password))]
    pub fn change_password(
        &mut self,
        dn: &str,
        password: &str,
        must_change: bool,
    ) -> Result<()> {
        if dn.is_empty() || password.is_empty() {
            return Err(AdError::invalid(
                "DN or password is empty or not specified",
            ));
        }

        let mut mods = vec![Mod::Replace(
            b"unicodePwd".to_vec(),
            HashSet::from([encode_unicode_pwd(password)]),
        )];
        if must_change {
            mods.push(Mod::Replace(
                b"pwdLastSet".to_vec(),
                HashSet::from([b"0".to_vec()]),
            ));
        }

        self.directory()?.modify(dn, mods)?;
        tracing::info!(dn, must_change, "password reset");
        Ok(())
    }

    /// Create a security group named `name` at `dn`.
    #[instrument(skip(self))]
    pub fn create_group(&mut self, name: &str, dn: &str) -> Result<()> {
        if name.is_empty() || dn.is_empty() {
            return Err(AdError::invalid("group name or DN is empty"));
        }

        let attrs = vec![
            ("cn".to_owned(), HashSet::from([name.to_owned()])),
            (
                "objectClass".to_owned(),
                HashSet::from(["top".to_owned(), "group".to_owned()]),
            ),
            (
                "groupType".to_owned(),
                HashSet::from([SECURITY_GROUP.to_string()]),
            ),
            ("sAMAccountName".to_owned(), HashSet::from([name.to_owned()])),
        ];

        self.directory()?.add(dn, attrs)?;
        tracing::info!(dn, "group created");
        Ok(())
    }

    /// Add `user_dn` to the members of `group_dn`.
    #[instrument(skip(self))]
    pub fn member_add(&mut self, user_dn: &str, group_dn: &str) -> Result<()> {
        let mods = vec![Mod::Add(
            b"member".to_vec(),
            HashSet::from([user_dn.as_bytes().to_vec()]),
        )];

        self.directory()?.modify(group_dn, mods)?;
        tracing::info!(user_dn, group_dn, "member added");
        Ok(())
    }

    /// Remove `user_dn` from `group_dn`, or every member when `None`.
    ///
    /// Returns `false` when the directory refuses the removal.
    #[instrument(skip(self))]
    pub fn member_del(
        &mut self,
        user_dn: Option<&str>,
        group_dn: &str,
    ) -> Result<bool> {
        let values = user_dn
            .map(|dn| HashSet::from([dn.as_bytes().to_vec()]))
            .unwrap_or_default();
        let mods = vec![Mod::Delete(b"member".to_vec(), values)];

        match self.directory()?.modify(group_dn, mods) {
            Ok(()) => Ok(true),
            Err(AdError::Directory { code, message }) => {
                tracing::debug!(code, %message, group_dn, "member removal refused");
                Ok(false)
            },
            Err(err) => Err(err),
        }
    }
}

impl Drop for AdTools {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::directory::memory::{MemoryDirectory, Request, RequestLog};
    use crate::error::ErrorKind;

    const ADMIN: &str = "cn=admin,dc=example,dc=com";
    const TEST_OU: &str = "OU=Test,DC=example,DC=com";
    const USER1: &str = "cn=user1,ou=Users,ou=adtools-test,ou=Test,dc=example,dc=com";
    const GROUP1: &str =
        "cn=group1,ou=Groups,ou=adtools-test,ou=Test,dc=example,dc=com";

    fn ou(dn: &str) -> DirectoryEntry {
        DirectoryEntry::new(dn).with_attr("objectClass", ["organizationalUnit"])
    }

    fn user(name: &str, upn: &str) -> DirectoryEntry {
        DirectoryEntry::new(format!(
            "cn={name},ou=Users,ou=adtools-test,ou=Test,dc=example,dc=com"
        ))
        .with_attr("objectClass", ["top", "person", "user"])
        .with_attr("displayName", [name])
        .with_attr("sAMAccountName", [name])
        .with_attr("userPrincipalName", [upn])
        .with_attr("userAccountControl", ["512"])
    }

    fn fixture() -> MemoryDirectory {
        MemoryDirectory::new()
            .with_credentials(ADMIN, "test")
            .with_entry(ou("dc=example,dc=com"))
            .with_entry(ou("ou=Test,dc=example,dc=com"))
            .with_entry(ou("ou=adtools-test,ou=Test,dc=example,dc=com"))
            .with_entry(ou("ou=Users,ou=adtools-test,ou=Test,dc=example,dc=com"))
            .with_entry(ou("ou=Groups,ou=adtools-test,ou=Test,dc=example,dc=com"))
            .with_entry(user("user1", "user1@example.com"))
            .with_entry(user("user2", "user2@example.com"))
            .with_entry(
                DirectoryEntry::new(GROUP1)
                    .with_attr("objectClass", ["top", "group"])
                    .with_attr("member", [USER1]),
            )
    }

    fn tools() -> (AdTools, RequestLog) {
        let config = SessionConfig::new("localhost", Protocol::Plaintext, 389)
            .base_dn("DC=example,DC=com");
        let directory = fixture();
        let log = directory.log();

        let mut tools = AdTools::with_directory(config, directory);
        tools.bind(ADMIN, "test").unwrap();
        (tools, log)
    }

    #[test]
    fn test_invalid_protocol() {
        let err = AdTools::new()
            .connect_and_bind("a", "b", Some("b"), "xxx", None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "invalid protocol specified");
    }

    #[test]
    fn test_connect_and_bind_no_username() {
        let err = AdTools::new()
            .connect_and_bind("", "", Some(""), "plaintext", None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "username and/or password are not specified"
        );
    }

    #[test]
    fn test_connect_and_bind_invalid_chars() {
        for (username, password) in [
            ("u$er", "test"),
            ("cn=admin,dc=example,dc=com", "æøå"),
            ("admin)(cn=*", "test"),
            ("admin user", "test"),
            ("admin", "pass\"word"),
        ] {
            let err = AdTools::new()
                .connect_and_bind(username, password, Some("localhost"), "plaintext", None)
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "invalid characters in username or password"
            );
        }
    }

    #[test]
    fn test_connect_and_bind_bad_port() {
        let err = AdTools::new()
            .connect_and_bind(ADMIN, "test", Some("localhost"), "plaintext", Some("ldap"))
            .unwrap_err();
        assert_eq!(err.to_string(), "port number must be numeric");

        let err = AdTools::new()
            .connect_and_bind(ADMIN, "test", None, "plaintext", None)
            .unwrap_err();
        assert_eq!(err.to_string(), "DC not specified and not set in config");
    }

    #[test]
    fn test_connect_config() {
        let domains = HashMap::from([(
            "missing_dc".to_owned(),
            DomainConfig {
                username: Some(ADMIN.into()),
                ..Default::default()
            },
        )]);

        let err = AdTools::connect("missing_dc", &domains).unwrap_err();
        assert_eq!(err.to_string(), "DC must be specified in config file");

        let err = AdTools::connect("nope", &domains).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        // No credentials: nothing is opened.
        let config = DomainConfig {
            dc: Some("localhost".into()),
            ..Default::default()
        };
        let mut tools = AdTools::connect_config(&config).unwrap();
        assert!(!tools.is_connected());
        assert_eq!(tools.config().unwrap().port, 389);

        let err = tools
            .ldap_query("(objectclass=*)", &QueryOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "not connected to AD");
    }

    /// Session whose opener hands out `directory` once.
    fn opening(directory: MemoryDirectory) -> AdTools {
        let mut directory = Some(directory);
        AdTools::with_opener(move |_: &SessionConfig| {
            directory.take().ok_or_else(|| AdError::Connection {
                details: "already opened".into(),
                source: None,
            })
        })
    }

    #[test]
    fn test_connect_domain() {
        let domains = HashMap::from([(
            "test".to_owned(),
            DomainConfig {
                dc: Some("localhost".into()),
                username: Some(ADMIN.into()),
                password: Some("test".into()),
                ..Default::default()
            },
        )]);
        let directory = fixture();
        let log = directory.log();

        let mut tools = opening(directory);
        tools.connect_domain("test", &domains).unwrap();
        assert!(tools.is_connected());
        assert_eq!(log.borrow()[0], Request::Bind(ADMIN.into()));

        let config = tools.config().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 389);

        let options = QueryOptions::default().base_dn(TEST_OU).subtree(false);
        let dn = tools.ldap_query("(objectclass=*)", &options).unwrap();
        assert_eq!(
            dn.into_value().as_deref(),
            Some("ou=adtools-test,ou=Test,dc=example,dc=com")
        );

        let user = tools
            .find_object("user1", Some(TEST_OU), ObjectType::User, None)
            .unwrap();
        assert_eq!(user.dn, USER1);
    }

    #[test]
    fn test_connect_domain_rejected() {
        let domains = HashMap::from([(
            "test".to_owned(),
            DomainConfig {
                dc: Some("localhost".into()),
                username: Some(ADMIN.into()),
                password: Some("wrong".into()),
                ..Default::default()
            },
        )]);

        let mut tools = opening(fixture());
        let err = tools.connect_domain("test", &domains).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(!tools.is_connected());
        assert!(format!("{tools:?}").contains("connected: false"));
    }

    #[test]
    fn test_connect_and_bind_uses_config() {
        let mut tools = opening(fixture());
        tools
            .load_config(&DomainConfig {
                dc: Some("dc01.example.com".into()),
                dn: Some("DC=example,DC=com".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(!tools.is_connected());

        tools
            .connect_and_bind(ADMIN, "test", None, "encrypted", None)
            .unwrap();
        let config = tools.config().unwrap();
        assert_eq!(config.host, "dc01.example.com");
        assert_eq!(config.protocol, Protocol::Encrypted);
        assert_eq!(config.port, 636);
        assert_eq!(config.base_dn.as_deref(), Some("DC=example,DC=com"));

        // The carried base DN is used when none is given.
        let user = tools
            .find_object("user2@example.com", None, ObjectType::Upn, None)
            .unwrap();
        assert_eq!(user.first("userPrincipalName"), Some("user2@example.com"));
    }

    #[test]
    fn test_bind() {
        let (mut tools, log) = tools();
        assert!(tools.is_connected());

        let err = tools.bind(ADMIN, "wrong").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);

        // Rejected before reaching the directory.
        let err = tools.bind("u$er", "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let binds = log
            .borrow()
            .iter()
            .filter(|r| matches!(r, Request::Bind(_)))
            .count();
        assert_eq!(binds, 2);
    }

    #[test]
    fn test_ldap_query() {
        let (mut tools, log) = tools();
        let options = QueryOptions::default().base_dn(TEST_OU).subtree(false);

        let result = tools.ldap_query("(objectclass=*)", &options).unwrap();
        assert_eq!(
            result,
            QueryResult::Value("ou=adtools-test,ou=Test,dc=example,dc=com".into())
        );
        assert!(log.borrow().contains(&Request::Search(
            TEST_OU.into(),
            Scope::OneLevel,
            "(objectclass=*)".into()
        )));
    }

    #[test]
    fn test_multiple_hits() {
        let (mut tools, _) = tools();
        let options = QueryOptions::default().base_dn(TEST_OU);

        let err = tools.ldap_query("(objectclass=user)", &options).unwrap_err();
        assert!(
            matches!(err, AdError::MultipleHits(f) if f == "(objectclass=user)")
        );

        let all = tools
            .ldap_query("(objectclass=user)", &options.single_result(false))
            .unwrap()
            .into_entries();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_no_hits() {
        let (mut tools, _) = tools();
        let options = QueryOptions::default().base_dn(TEST_OU);

        let err = tools.ldap_query("(objectclass=foo)", &options).unwrap_err();
        assert!(matches!(err, AdError::NoHits(f) if f == "(objectclass=foo)"));
    }

    #[test]
    fn test_missing_base() {
        let (mut tools, _) = tools();
        let options =
            QueryOptions::default().base_dn("OU=Nowhere,DC=example,DC=com");

        let err = tools.ldap_query("(objectclass=*)", &options).unwrap_err();
        assert!(matches!(err, AdError::Directory { code: 32, .. }));
    }

    #[test]
    fn test_find_object() {
        let (mut tools, _) = tools();

        let user = tools
            .find_object("user1", Some(TEST_OU), ObjectType::User, None)
            .unwrap();
        assert_eq!(user.dn, USER1);
        assert_eq!(user.first("sAMAccountName"), Some("user1"));
        assert!(!user.contains("displayName"));

        let user = tools
            .find_object("user1", Some(TEST_OU), ObjectType::Username, None)
            .unwrap();
        assert_eq!(user.dn, USER1);

        // Falls back to the session base DN.
        let user = tools
            .find_object(
                "user2@example.com",
                None,
                ObjectType::Upn,
                Some(&["displayName", "userAccountControl"][..]),
            )
            .unwrap();
        assert_eq!(user.first("displayName"), Some("user2"));
        assert!(!user.account_control().unwrap().is_disabled());

        let err = tools
            .find_object("user2@upn.local", Some(TEST_OU), ObjectType::Upn, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoHits);
    }

    #[test]
    fn test_object_not_found() {
        let (mut tools, _) = tools();
        let err = tools
            .find_object("computer1", Some(TEST_OU), ObjectType::Computer, None)
            .unwrap_err();
        assert!(matches!(
            err,
            AdError::NoHits(f) if f == "(&(name=computer1)(objectClass=computer))"
        ));
    }

    #[test]
    fn test_find_object_escapes_name() {
        let (mut tools, _) = tools();
        let err = tools
            .find_object("*", Some(TEST_OU), ObjectType::Username, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoHits);
    }

    #[test]
    fn test_account_control() {
        let (mut tools, _) = tools();
        let flags = tools.account_control(USER1).unwrap();
        assert_eq!(flags.names(), ["NORMAL_ACCOUNT"]);
    }

    #[test]
    fn test_leaf_rdn() {
        assert_eq!(
            leaf_rdn("CN=foo,OU=A,DC=x,DC=y").as_deref(),
            Some("CN=foo")
        );
        assert_eq!(
            leaf_rdn("CN=Doe\\, John,OU=Staff,DC=x").as_deref(),
            Some("CN=Doe\\, John")
        );
        assert_eq!(leaf_rdn("cn=foo,ou=a").as_deref(), Some("cn=foo"));
        assert_eq!(leaf_rdn("OU=A,DC=x"), None);
    }

    #[test]
    fn test_move_lowercase_dn() {
        let (mut tools, _) = tools();
        let users = "ou=Users,ou=adtools-test,ou=Test,dc=example,dc=com";
        let groups = "ou=Groups,ou=adtools-test,ou=Test,dc=example,dc=com";

        let user = tools
            .find_object("user1", Some(TEST_OU), ObjectType::User, None)
            .unwrap();
        let dn = tools.move_object(&user.dn, groups).unwrap();
        assert_eq!(dn, format!("cn=user1,{groups}"));

        let err = tools
            .find_object("user1", Some(users), ObjectType::User, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoHits);
    }

    #[test]
    fn test_move() {
        let directory = MemoryDirectory::new()
            .with_entry(ou("OU=A,DC=x,DC=y"))
            .with_entry(ou("OU=B,DC=x,DC=y"))
            .with_entry(DirectoryEntry::new("CN=foo,OU=A,DC=x,DC=y"));
        let log = directory.log();
        let mut tools = AdTools::with_directory(
            SessionConfig::new("localhost", Protocol::Plaintext, 389),
            directory,
        );

        let dn = tools
            .move_object("CN=foo,OU=A,DC=x,DC=y", "OU=B,DC=x,DC=y")
            .unwrap();
        assert_eq!(dn, "CN=foo,OU=B,DC=x,DC=y");
        assert!(log.borrow().contains(&Request::Rename(
            "CN=foo,OU=A,DC=x,DC=y".into(),
            "CN=foo".into(),
            "OU=B,DC=x,DC=y".into()
        )));

        let err = tools
            .move_object("CN=foo,OU=A,DC=x,DC=y", "OU=B,DC=x,DC=y")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Directory);
    }

    #[test]
    fn test_change_password() {
        let (mut tools, log) = tools();

        let err = tools.change_password(USER1, "", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        tools.change_password(USER1, "Secret1", true).unwrap();
        let expected = Request::Modify(
            USER1.into(),
            vec![
                Mod::Replace(
                    b"unicodePwd".to_vec(),
                    HashSet::from([encode_unicode_pwd("Secret1")]),
                ),
                Mod::Replace(
                    b"pwdLastSet".to_vec(),
                    HashSet::from([b"0".to_vec()]),
                ),
            ],
        );
        assert_eq!(log.borrow().last(), Some(&expected));

        let err = tools
            .change_password("cn=ghost,dc=example,dc=com", "Secret1", false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Directory);
    }

    #[test]
    fn test_create_group() {
        let (mut tools, _) = tools();
        let dn = "cn=group2,ou=Groups,ou=adtools-test,ou=Test,dc=example,dc=com";

        tools.create_group("group2", dn).unwrap();
        let group = tools
            .ldap_query(
                "(sAMAccountName=group2)",
                &QueryOptions::default()
                    .attributes(["objectClass", "groupType"]),
            )
            .unwrap()
            .into_entry()
            .unwrap();
        assert_eq!(group.first("groupType"), Some("-2147483646"));
        assert_eq!(group.get("objectclass").unwrap(), ["group", "top"]);

        let err = tools.create_group("group2", dn).unwrap_err();
        assert!(matches!(err, AdError::Directory { code: 68, .. }));
    }

    #[test]
    fn test_members() {
        let (mut tools, _) = tools();
        let user2 =
            "cn=user2,ou=Users,ou=adtools-test,ou=Test,dc=example,dc=com";

        tools.member_add(user2, GROUP1).unwrap();
        let err = tools.member_add(user2, "cn=nope,dc=example,dc=com");
        assert!(err.is_err());

        assert!(tools.member_del(Some(USER1), GROUP1).unwrap());
        assert!(!tools.member_del(Some(USER1), GROUP1).unwrap());

        assert!(tools.member_del(None, GROUP1).unwrap());
        assert!(!tools.member_del(None, GROUP1).unwrap());
    }

    #[test]
    fn test_disconnect() {
        let (mut tools, log) = tools();
        tools.disconnect();
        assert!(!tools.is_connected());
        assert_eq!(log.borrow().last(), Some(&Request::Unbind));

        let err = tools.member_add(USER1, GROUP1).unwrap_err();
        assert_eq!(err.to_string(), "not connected to AD");
    }

    #[test]
    fn test_unbind_on_drop() {
        let (tools, log) = tools();
        drop(tools);
        assert_eq!(log.borrow().last(), Some(&Request::Unbind));
    }
}

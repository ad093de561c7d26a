//! Directory entries returned by searches.

use std::collections::BTreeMap;

use ldap3::SearchEntry;

use crate::account::AccountControl;

/// A distinguished name with its attributes.
///
/// Attribute names are case-insensitive and stored lowercased.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    attrs: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Append values to an attribute.
    pub fn with_attr<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.push_values(name, values);
        self
    }

    pub(crate) fn push_values<I, V>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attrs
            .entry(name.to_lowercase())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    #[cfg(test)]
    pub(crate) fn attrs_mut(&mut self) -> &mut BTreeMap<String, Vec<String>> {
        &mut self.attrs
    }

    /// Values of an attribute.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attrs.get(&name.to_lowercase()).map(Vec::as_slice)
    }

    /// First value of an attribute. `dn` yields the entry DN.
    pub fn first(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("dn") {
            return Some(&self.dn);
        }

        self.get(name)?.first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(&name.to_lowercase())
    }

    /// Iterate attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Decoded `userAccountControl`, if present and numeric.
    pub fn account_control(&self) -> Option<AccountControl> {
        self.first("userAccountControl")?
            .parse::<u32>()
            .ok()
            .map(AccountControl::from_bits)
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        let mut out = DirectoryEntry::new(entry.dn);
        for (name, values) in entry.attrs {
            out.push_values(&name, values);
        }
        out
    }
}

/// Readable labels of common user attributes, as shown by AD tools.
const FIELD_LABELS: &[(&str, &str)] = &[
    ("givenName", "First Name"),
    ("sn", "Last Name"),
    ("initials", "Initials"),
    ("displayName", "Display Name"),
    ("description", "Description"),
    ("physicalDeliveryOfficeName", "Office"),
    ("telephoneNumber", "Telephone Number"),
    ("otherTelephone", "Telephone: Other"),
    ("mail", "E-Mail"),
    ("wWWHomePage", "Web Page"),
    ("url", "Web Page: Other"),
    ("userPrincipalName", "User logon name"),
    ("sAMAccountName", "User logon name (pre-Windows 2000)"),
    ("logonHours", "Logon Hours"),
    ("userWorkstations", "Log On To"),
    ("lockoutTime", "Account is locked out"),
    ("pwdLastSet", "Password last set"),
    ("userAccountControl", "Other Account Options"),
    ("accountExpires", "Account Expires"),
    ("streetAddress", "Street"),
    ("postOfficeBox", "P.O.Box"),
    ("postalCode", "Zip/Postal Code"),
    ("memberOf", "Member of"),
    ("profilePath", "Profile Path"),
    ("scriptPath", "Logon Script"),
    ("homeDirectory", "Home Folder: Local Path"),
    ("homeDrive", "Home Folder: Connect"),
    ("homePhone", "Home"),
    ("otherHomePhone", "Home: Other"),
    ("pager", "Pager"),
    ("otherPager", "Pager: Other"),
    ("mobile", "Mobile"),
    ("otherMobile", "Mobile: Other"),
    ("facsimileTelephoneNumber", "Fax"),
    ("otherFacsimileTelephoneNumber", "Fax: Other"),
    ("ipPhone", "IP phone"),
    ("otherIpPhone", "IP phone: Other"),
    ("info", "Notes"),
    ("l", "City"),
    ("st", "State/Province"),
];

/// Readable label of an attribute, e.g. `Office` for
/// `physicalDeliveryOfficeName`. Case-insensitive.
pub fn field_label(name: &str) -> Option<&'static str> {
    FIELD_LABELS
        .iter()
        .find(|(field, _)| field.eq_ignore_ascii_case(name))
        .map(|(_, label)| *label)
}

/// First value of `field` from each entry, in result order.
///
/// Entries without the field are skipped.
pub fn extract_field<'a>(
    entries: &'a [DirectoryEntry],
    field: &str,
) -> Vec<&'a str> {
    entries
        .iter()
        .filter_map(|entry| entry.first(field))
        .collect()
}

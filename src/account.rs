//! `userAccountControl` flags.

use std::collections::BTreeMap;
use std::fmt;

/// Highest bit position covered by the known flags.
const MAX_BIT: u32 = 26;

/// Named bits of `userAccountControl`, ascending.
const FLAGS: [(u32, &str); 22] = [
    (0x0000_0001, "SCRIPT"),
    (0x0000_0002, "ACCOUNTDISABLE"),
    (0x0000_0008, "HOMEDIR_REQUIRED"),
    (0x0000_0010, "LOCKOUT"),
    (0x0000_0020, "PASSWD_NOTREQD"),
    (0x0000_0040, "PASSWD_CANT_CHANGE"),
    (0x0000_0080, "ENCRYPTED_TEXT_PWD_ALLOWED"),
    (0x0000_0100, "TEMP_DUPLICATE_ACCOUNT"),
    (0x0000_0200, "NORMAL_ACCOUNT"),
    (0x0000_0800, "INTERDOMAIN_TRUST_ACCOUNT"),
    (0x0000_1000, "WORKSTATION_TRUST_ACCOUNT"),
    (0x0000_2000, "SERVER_TRUST_ACCOUNT"),
    (0x0001_0000, "DONT_EXPIRE_PASSWORD"),
    (0x0002_0000, "MNS_LOGON_ACCOUNT"),
    (0x0004_0000, "SMARTCARD_REQUIRED"),
    (0x0008_0000, "TRUSTED_FOR_DELEGATION"),
    (0x0010_0000, "NOT_DELEGATED"),
    (0x0020_0000, "USE_DES_KEY_ONLY"),
    (0x0040_0000, "DONT_REQ_PREAUTH"),
    (0x0080_0000, "PASSWORD_EXPIRED"),
    (0x0100_0000, "TRUSTED_TO_AUTH_FOR_DELEGATION"),
    (0x0400_0000, "PARTIAL_SECRETS_ACCOUNT"),
];

/// Name of a single flag value.
pub fn flag_name(bit: u32) -> Option<&'static str> {
    FLAGS
        .iter()
        .find(|(value, _)| *value == bit)
        .map(|(_, name)| *name)
}

/// Map every known bit set in `flags` to its name.
///
/// Unknown bits are dropped.
pub fn decode_account_control(flags: u32) -> BTreeMap<u32, &'static str> {
    (0..=MAX_BIT)
        .map(|i| 1u32 << i)
        .filter(|bit| flags & bit != 0)
        .filter_map(|bit| flag_name(bit).map(|name| (bit, name)))
        .collect()
}

/// Typed view over a `userAccountControl` value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountControl(u32);

impl AccountControl {
    pub const SCRIPT: u32 = 0x0000_0001;
    pub const ACCOUNTDISABLE: u32 = 0x0000_0002;
    pub const LOCKOUT: u32 = 0x0000_0010;
    pub const PASSWD_NOTREQD: u32 = 0x0000_0020;
    pub const NORMAL_ACCOUNT: u32 = 0x0000_0200;
    pub const WORKSTATION_TRUST_ACCOUNT: u32 = 0x0000_1000;
    pub const SERVER_TRUST_ACCOUNT: u32 = 0x0000_2000;
    pub const DONT_EXPIRE_PASSWORD: u32 = 0x0001_0000;
    pub const SMARTCARD_REQUIRED: u32 = 0x0004_0000;
    pub const PASSWORD_EXPIRED: u32 = 0x0080_0000;

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub fn is_disabled(&self) -> bool {
        self.contains(Self::ACCOUNTDISABLE)
    }

    /// Names of the set flags, ascending by bit.
    pub fn names(&self) -> Vec<&'static str> {
        decode_account_control(self.0).into_values().collect()
    }
}

impl fmt::Display for AccountControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join("|"))
    }
}

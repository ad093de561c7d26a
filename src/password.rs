//! `unicodePwd` encoding.

/// Encode a password the way AD expects it in `unicodePwd`.
///
/// The password is wrapped in double quotes, then written as UTF-16LE.
/// For ASCII input every character becomes the byte itself followed by a
/// NUL byte.
pub fn encode_unicode_pwd(password: &str) -> Vec<u8> {
    let quoted = format!("\"{password}\"");
    quoted.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

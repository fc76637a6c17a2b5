use std::fmt;

use super::error::StorageError;

const MAX_KEY_LEN: usize = 1024;

/// A validated object key.
///
/// Keys are `/`-separated segments of `[A-Za-z0-9._-]`. Segments may not be
/// empty and may not be `.` or `..`, so a key maps onto a relative
/// filesystem path without escaping the store root.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn parse(key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        validate(&key).map_err(|msg| StorageError::InvalidKey(format!("{msg}: {key:?}")))?;
        Ok(Self(key))
    }

    /// `images/{owner}/{id}.{ext}`, where the uploaded original lives.
    ///
    /// The owner id is encoded with [`owner_segment`], so any authenticated
    /// id is accepted.
    pub fn for_upload(owner_id: &str, asset_id: &str, extension: &str) -> Result<Self, StorageError> {
        single_segment(asset_id)?;
        let owner = owner_segment(owner_id);
        Self::parse(format!("images/{owner}/{asset_id}.{extension}"))
    }

    /// `images/{owner}/transformed/{id}.{ext}`, where derived variants live.
    pub fn for_variant(
        owner_id: &str,
        asset_id: &str,
        extension: &str,
    ) -> Result<Self, StorageError> {
        single_segment(asset_id)?;
        let owner = owner_segment(owner_id);
        Self::parse(format!("images/{owner}/transformed/{asset_id}.{extension}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encode an owner id as one key segment.
///
/// ASCII letters, digits and `-` are kept; every other byte becomes `_xx`
/// (lowercase hex). `_` itself is escaped, so distinct ids never collide.
fn owner_segment(owner_id: &str) -> String {
    let mut out = String::with_capacity(owner_id.len());
    for byte in owner_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push('_');
            out.push_str(&hex::encode([byte]));
        }
    }
    out
}

fn single_segment(part: &str) -> Result<(), StorageError> {
    if part.contains('/') {
        return Err(StorageError::InvalidKey(format!(
            "{part:?} must be a single key segment"
        )));
    }
    Ok(())
}

fn validate(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("key is empty");
    }
    if key.len() > MAX_KEY_LEN {
        return Err("key exceeds 1024 bytes");
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err("key must not start or end with '/'");
    }
    if key.contains('\\') {
        return Err("key must not contain backslashes");
    }
    for segment in key.split('/') {
        if segment.is_empty() {
            return Err("key must not contain empty segments");
        }
        if segment == "." || segment == ".." {
            return Err("key must not contain '.' or '..' segments");
        }
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return Err("key contains invalid characters (allowed: a-zA-Z0-9, /, -, _, .)");
    }
    Ok(())
}

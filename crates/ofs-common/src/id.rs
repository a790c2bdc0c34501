//! Volume name and caller ID validation.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::{OfsError, OfsResult};

/// A validated volume name.
///
/// Volume names end up as the last component of a mountpoint path, so they
/// must:
/// - Be 1-255 bytes long
/// - Not contain `/` or NUL
/// - Not be `.` or `..`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VolumeName(String);

impl VolumeName {
    /// Maximum length of a volume name (one path component).
    pub const MAX_LENGTH: usize = 255;

    /// Create a new volume name, validating the format.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::InvalidName`] if the name cannot be used as a
    /// path component.
    pub fn new(name: impl Into<String>) -> OfsResult<Self> {
        let name = name.into();
        if Self::is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(OfsError::InvalidName { name })
        }
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= Self::MAX_LENGTH
            && name != "."
            && name != ".."
            && !name.contains(['/', '\0'])
    }
}

impl fmt::Display for VolumeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VolumeName {
    type Err = OfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VolumeName {
    type Error = OfsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VolumeName> for String {
    fn from(name: VolumeName) -> Self {
        name.0
    }
}

impl AsRef<str> for VolumeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets maps keyed by `VolumeName` be queried with a plain `&str`.
impl Borrow<str> for VolumeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// An opaque identifier for a caller attaching to a volume, usually a
/// container ID.
///
/// The only requirement is that it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CallerId(String);

impl CallerId {
    /// Create a new caller ID.
    ///
    /// # Errors
    ///
    /// Returns [`OfsError::InvalidCallerId`] if the ID is empty.
    pub fn new(id: impl Into<String>) -> OfsResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(OfsError::InvalidCallerId { id });
        }
        Ok(Self(id))
    }

    /// Get the caller ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short version of the ID (first 12 characters).
    #[must_use]
    pub fn short(&self) -> &str {
        self.0
            .char_indices()
            .nth(12)
            .map_or(self.0.as_str(), |(idx, _)| &self.0[..idx])
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CallerId {
    type Err = OfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CallerId {
    type Error = OfsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CallerId> for String {
    fn from(id: CallerId) -> Self {
        id.0
    }
}

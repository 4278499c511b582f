//! Extension namespaces
//!
//! Builtin identifiers carry no namespace. Extension identifiers carry a
//! [`Namespace`] that is well-formed, not reserved, and not a category name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::category::Category;
use crate::identifier::IdentError;

/// Namespaces that belong to the host system and may not be claimed by extensions
pub const RESERVED_NAMESPACES: [&str; 8] = [
    "gofai", "core", "cardplay", "builtin", "system", "user", "test", "internal",
];

static NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("namespace pattern compiles"));

/// Validated extension namespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Validate and wrap a namespace
    ///
    /// # Errors
    /// - [`IdentError::InvalidNamespace`] if the name is malformed
    /// - [`IdentError::ReservedNamespace`] if the name is reserved
    /// - [`IdentError::NamespaceShadowsCategory`] if the name equals a category
    pub fn new(name: impl Into<String>) -> Result<Self, IdentError> {
        let name = name.into();
        if !NAMESPACE_RE.is_match(&name) {
            return Err(IdentError::InvalidNamespace(name));
        }
        if is_reserved(&name) {
            return Err(IdentError::ReservedNamespace(name));
        }
        if Category::lookup(&name).is_some() {
            return Err(IdentError::NamespaceShadowsCategory(name));
        }
        Ok(Self(name))
    }

    /// Namespace as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Check whether a name is in the reserved set
#[inline]
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMESPACES.contains(&name)
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Namespace {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = IdentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_accepts_kebab_case() {
        assert!(Namespace::new("my-pack").is_ok());
        assert!(Namespace::new("acme2").is_ok());
        assert!(Namespace::new("a-b-c").is_ok());
    }

    #[test]
    fn namespace_rejects_malformed() {
        for bad in ["", "My-Pack", "-pack", "pack-", "pa--ck", "pa_ck", "pa:ck"] {
            assert!(
                matches!(Namespace::new(bad), Err(IdentError::InvalidNamespace(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn namespace_rejects_reserved() {
        for reserved in RESERVED_NAMESPACES {
            assert!(matches!(
                Namespace::new(reserved),
                Err(IdentError::ReservedNamespace(_))
            ));
        }
    }

    #[test]
    fn namespace_rejects_category_names() {
        assert!(matches!(
            Namespace::new("card"),
            Err(IdentError::NamespaceShadowsCategory(_))
        ));
    }
}

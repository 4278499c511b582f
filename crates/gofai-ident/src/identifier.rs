//! Opaque identifiers
//!
//! Provides [`Identifier`], the only way to name an entity or vocabulary entry.
//!
//! # Format
//! - Builtin: `category:path[:path...]` (e.g. `section:chorus-2`)
//! - Extension: `namespace:category:path[:path...]` (e.g. `acme:card:tape-echo`)
//!
//! Identifiers can only be produced by [`Identifier::make`],
//! [`Identifier::make_extension`] or [`Identifier::parse`]; all three validate.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::category::Category;
use crate::namespace::Namespace;

/// Separator between identifier components
pub const SEPARATOR: char = ':';

static SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+([_-][a-z0-9]+)*$").expect("segment pattern compiles"));

/// Validated, immutable identifier
///
/// Stores the canonical string alongside its parsed components so accessors
/// never re-parse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    raw: String,
    namespace: Option<Namespace>,
    category: Category,
    path: Vec<String>,
}

/// Structured breakdown of an identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedIdentifier {
    /// Extension namespace, absent for builtins
    pub namespace: Option<String>,
    /// Identifier category
    pub category: Category,
    /// Path segments (at least one)
    pub path: Vec<String>,
    /// True when no namespace is present
    pub is_builtin: bool,
}

impl Identifier {
    /// Create a builtin identifier
    ///
    /// # Errors
    /// Returns [`IdentError::EmptyPath`] or [`IdentError::InvalidSegment`] when the
    /// path is missing or malformed.
    pub fn make<I, S>(category: Category, path: I) -> Result<Self, IdentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(None, category, path)
    }

    /// Create an extension identifier under `namespace`
    ///
    /// # Errors
    /// Fails when the namespace is malformed or reserved, or the path is invalid.
    pub fn make_extension<I, S>(
        namespace: &str,
        category: Category,
        path: I,
    ) -> Result<Self, IdentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let namespace = Namespace::new(namespace)?;
        Self::build(Some(namespace), category, path)
    }

    /// Parse a canonical identifier string
    ///
    /// There is no partially valid identifier: either every component checks
    /// out or the whole string is rejected.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        if s.is_empty() {
            return Err(IdentError::Empty);
        }

        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        let first = parts[0];

        // A leading category means builtin; anything else must be a namespace.
        if let Some(category) = Category::lookup(first) {
            return Self::build(None, category, parts[1..].iter().copied());
        }

        let namespace = Namespace::new(first)?;
        let category_name = parts.get(1).copied().unwrap_or_default();
        let category = category_name.parse::<Category>()?;
        Self::build(Some(namespace), category, parts[2..].iter().copied())
    }

    fn build<I, S>(
        namespace: Option<Namespace>,
        category: Category,
        path: I,
    ) -> Result<Self, IdentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path: Vec<String> = path
            .into_iter()
            .map(|seg| {
                let seg = seg.as_ref();
                if SEGMENT_RE.is_match(seg) {
                    Ok(seg.to_string())
                } else {
                    Err(IdentError::InvalidSegment(seg.to_string()))
                }
            })
            .collect::<Result<_, _>>()?;

        if path.is_empty() {
            return Err(IdentError::EmptyPath);
        }

        let raw = format_parts(namespace.as_ref().map(Namespace::as_str), category, &path);
        Ok(Self {
            raw,
            namespace,
            category,
            path,
        })
    }

    /// Canonical string form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Identifier category
    #[inline]
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Extension namespace (None for builtins)
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Last path segment
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> &str {
        // build() guarantees at least one segment
        self.path.last().map_or("", String::as_str)
    }

    /// True when no namespace is present
    #[inline]
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.namespace.is_none()
    }

    /// Structured breakdown
    #[must_use]
    pub fn breakdown(&self) -> ParsedIdentifier {
        ParsedIdentifier {
            namespace: self.namespace.as_ref().map(|n| n.as_str().to_string()),
            category: self.category,
            path: self.path.clone(),
            is_builtin: self.is_builtin(),
        }
    }

    /// Derive a child identifier in the same namespace and category
    ///
    /// # Errors
    /// Returns [`IdentError::InvalidSegment`] if `segment` is malformed.
    pub fn child(&self, segment: &str) -> Result<Self, IdentError> {
        let mut path: Vec<&str> = self.path.iter().map(String::as_str).collect();
        path.push(segment);
        Self::build(self.namespace.clone(), self.category, path)
    }
}

impl ParsedIdentifier {
    /// Canonical string form of this breakdown
    #[must_use]
    pub fn format(&self) -> String {
        format_parts(self.namespace.as_deref(), self.category, &self.path)
    }

    /// Validate this breakdown into an identifier
    ///
    /// # Errors
    /// Fails on any invalid component.
    pub fn to_identifier(&self) -> Result<Identifier, IdentError> {
        match &self.namespace {
            Some(ns) => Identifier::make_extension(ns, self.category, &self.path),
            None => Identifier::make(self.category, &self.path),
        }
    }
}

/// Parse a string into its structured breakdown
///
/// # Errors
/// Same as [`Identifier::parse`].
pub fn parse(s: &str) -> Result<ParsedIdentifier, IdentError> {
    Identifier::parse(s).map(|id| id.breakdown())
}

fn format_parts(namespace: Option<&str>, category: Category, path: &[String]) -> String {
    let mut out = String::new();
    if let Some(ns) = namespace {
        out.push_str(ns);
        out.push(SEPARATOR);
    }
    out.push_str(category.as_str());
    for seg in path {
        out.push(SEPARATOR);
        out.push_str(seg);
    }
    out
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Identifier {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = IdentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.raw
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

/// Errors constructing or parsing identifiers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentError {
    /// Empty input string
    #[error("identifier cannot be empty")]
    Empty,

    /// Category not in the fixed set
    #[error("unknown identifier category: '{0}'")]
    UnknownCategory(String),

    /// No path segments after the category
    #[error("identifier path cannot be empty")]
    EmptyPath,

    /// Path segment violates the segment format
    #[error("invalid path segment: '{0}' (lowercase alphanumerics joined by '-' or '_')")]
    InvalidSegment(String),

    /// Namespace violates the namespace format
    #[error("invalid namespace: '{0}' (lowercase alphanumerics joined by '-')")]
    InvalidNamespace(String),

    /// Namespace is reserved for the host system
    #[error("namespace '{0}' is reserved")]
    ReservedNamespace(String),

    /// Namespace collides with a category name
    #[error("namespace '{0}' collides with a category name")]
    NamespaceShadowsCategory(String),

    /// Identifier has the wrong category for a typed wrapper
    #[error("expected a '{expected}' identifier, got '{found}'")]
    CategoryMismatch {
        /// Required category
        expected: Category,
        /// Identifier that was supplied
        found: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_builtin() {
        let id = Identifier::make(Category::Section, ["chorus-2"]).unwrap();
        assert_eq!(id.as_str(), "section:chorus-2");
        assert!(id.is_builtin());
        assert_eq!(id.category(), Category::Section);
        assert_eq!(id.leaf(), "chorus-2");
    }

    #[test]
    fn make_multi_segment() {
        let id = Identifier::make(Category::Param, ["bass", "eq", "low_gain"]).unwrap();
        assert_eq!(id.as_str(), "param:bass:eq:low_gain");
        assert_eq!(id.path(), &["bass", "eq", "low_gain"]);
    }

    #[test]
    fn make_extension() {
        let id = Identifier::make_extension("acme", Category::Card, ["tape-echo"]).unwrap();
        assert_eq!(id.as_str(), "acme:card:tape-echo");
        assert!(!id.is_builtin());
        assert_eq!(id.namespace().map(Namespace::as_str), Some("acme"));
    }

    #[test]
    fn make_rejects_empty_path() {
        let empty: [&str; 0] = [];
        assert_eq!(Identifier::make(Category::Layer, empty), Err(IdentError::EmptyPath));
    }

    #[test]
    fn make_rejects_bad_segment() {
        for bad in ["", "Bass", "bass drum", "bass-", "a:b", "_x"] {
            assert!(
                matches!(
                    Identifier::make(Category::Layer, [bad]),
                    Err(IdentError::InvalidSegment(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn make_extension_rejects_reserved() {
        for ns in ["gofai", "core", "cardplay", "builtin", "system", "user", "test", "internal"] {
            assert!(matches!(
                Identifier::make_extension(ns, Category::Card, ["x"]),
                Err(IdentError::ReservedNamespace(_))
            ));
        }
    }

    #[test]
    fn parse_builtin() {
        let id = Identifier::parse("layer:bass").unwrap();
        assert_eq!(id.category(), Category::Layer);
        assert_eq!(id.path(), &["bass"]);
        assert!(id.is_builtin());
    }

    #[test]
    fn parse_extension() {
        let id: Identifier = "my-pack:lex:wobble".parse().unwrap();
        assert_eq!(id.namespace().map(Namespace::as_str), Some("my-pack"));
        assert_eq!(id.category(), Category::Lex);
        assert_eq!(id.path(), &["wobble"]);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(Identifier::parse(""), Err(IdentError::Empty));
        assert_eq!(Identifier::parse("layer"), Err(IdentError::EmptyPath));
        assert_eq!(Identifier::parse("layer:"), Err(IdentError::InvalidSegment(String::new())));
        assert!(matches!(Identifier::parse("acme:bogus:x"), Err(IdentError::UnknownCategory(_))));
        assert!(matches!(Identifier::parse("acme"), Err(IdentError::UnknownCategory(_))));
        assert!(matches!(Identifier::parse("Acme:card:x"), Err(IdentError::InvalidNamespace(_))));
        assert!(matches!(Identifier::parse("core:card:x"), Err(IdentError::ReservedNamespace(_))));
        assert!(matches!(Identifier::parse("layer:bass::x"), Err(IdentError::InvalidSegment(_))));
    }

    #[test]
    fn parse_breakdown() {
        let parsed = parse("acme:card:tape-echo").unwrap();
        assert_eq!(parsed.namespace.as_deref(), Some("acme"));
        assert_eq!(parsed.category, Category::Card);
        assert_eq!(parsed.path, vec!["tape-echo".to_string()]);
        assert!(!parsed.is_builtin);
        assert_eq!(parsed.format(), "acme:card:tape-echo");
    }

    #[test]
    fn child_extends_path() {
        let card = Identifier::make(Category::Card, ["bass"]).unwrap();
        let child = card.child("eq").unwrap();
        assert_eq!(child.as_str(), "card:bass:eq");
        assert!(card.child("Bad").is_err());
    }

    #[test]
    fn serde_round_trip_as_string() {
        let id = Identifier::make(Category::Section, ["verse-1"]).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"section:verse-1\"");
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn serde_rejects_invalid() {
        let result: Result<Identifier, _> = serde_json::from_str("\"core:card:x\"");
        assert!(result.is_err());
    }
}

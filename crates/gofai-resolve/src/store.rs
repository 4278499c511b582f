//! Project-store seam
//!
//! The resolver never owns project data. It asks a [`ProjectStore`] for
//! candidates of one kind matching one predicate within an optional container.

use gofai_entity::{BarSpan, EntityKind};
use gofai_ident::Identifier;
use serde::{Deserialize, Serialize};

/// Predicate a store query applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "snake_case")]
pub enum Matcher {
    /// Exact identifier
    Id(Identifier),
    /// Exact name, case-insensitive
    Name(String),
    /// Type tag ("chorus", "reverb"), case-insensitive
    Type(String),
    /// Approximate name; candidates carry a similarity score
    Fuzzy(String),
    /// Every entity of the kind
    Any,
}

/// "Find entities of kind K matching P within container C"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityQuery {
    /// Kind wanted
    pub kind: EntityKind,
    /// Predicate
    pub matcher: Matcher,
    /// Only entities directly inside this container
    pub container: Option<Identifier>,
}

impl EntityQuery {
    /// Unqualified query
    #[inline]
    #[must_use]
    pub fn new(kind: EntityKind, matcher: Matcher) -> Self {
        Self {
            kind,
            matcher,
            container: None,
        }
    }

    /// Restrict to a container
    #[inline]
    #[must_use]
    pub fn within(mut self, container: Option<Identifier>) -> Self {
        self.container = container;
        self
    }
}

/// An entity a store offers for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Entity identifier
    pub id: Identifier,
    /// Entity kind
    pub kind: EntityKind,
    /// Name as shown in the project
    pub name: String,
    /// Type tag
    #[serde(default)]
    pub type_tag: Option<String>,
    /// Bars covered
    #[serde(default)]
    pub span: Option<BarSpan>,
    /// 0-based position among entities of the same kind (timeline or list order)
    pub order: usize,
    /// Entities directly containing this one
    #[serde(default)]
    pub containers: Vec<Identifier>,
    /// Match strength in `0.0..=1.0`
    pub confidence: f64,
}

impl Candidate {
    /// Name with bar span when the entity has one ("Chorus 2 (bars 49–65)")
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.span {
            Some(span) => format!("{} ({span})", self.name),
            None => self.name.clone(),
        }
    }

    /// Copy with a different confidence
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Store lookup failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The entity exists but the caller may not see it
    #[error("access to '{0}' is denied")]
    AccessDenied(String),

    /// Backend failure
    #[error("project store error: {0}")]
    Backend(String),
}

/// Read-only project lookup used by the resolver
pub trait ProjectStore {
    /// Candidates of `query.kind` matching `query.matcher`
    ///
    /// Results come back in project order.
    ///
    /// # Errors
    /// Returns [`StoreError::AccessDenied`] when an id lookup hits a
    /// restricted entity.
    fn find(&self, query: &EntityQuery) -> Result<Vec<Candidate>, StoreError>;

    /// Song length in bars, if known
    fn length_bars(&self) -> Option<u32>;
}

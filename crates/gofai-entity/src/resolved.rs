//! Resolved references
//!
//! Created only by successful resolution. A resolved reference carries enough
//! context in its display name (bar span for sections) to be unambiguous.

use gofai_ident::{EventId, Identifier, LayerId, SectionId};
use gofai_select::{describe, Selector};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::error::EntityError;
use crate::registry::EntityKind;

/// Inclusive span of 1-based bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBarSpan")]
pub struct BarSpan {
    start: u32,
    end: u32,
}

#[derive(Deserialize)]
struct RawBarSpan {
    start: u32,
    end: u32,
}

impl TryFrom<RawBarSpan> for BarSpan {
    type Error = EntityError;

    fn try_from(raw: RawBarSpan) -> Result<Self, Self::Error> {
        BarSpan::new(raw.start, raw.end)
    }
}

impl BarSpan {
    /// Create a span
    ///
    /// # Errors
    /// Fails when `start` is 0 or after `end`.
    pub fn new(start: u32, end: u32) -> Result<Self, EntityError> {
        if start == 0 || start > end {
            return Err(EntityError::InvalidSpan { start, end });
        }
        Ok(Self { start, end })
    }

    /// Span of a single bar
    ///
    /// # Errors
    /// Fails when `bar` is 0.
    pub fn bar(bar: u32) -> Result<Self, EntityError> {
        Self::new(bar, bar)
    }

    /// First bar
    #[inline]
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last bar (inclusive)
    #[inline]
    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of bars covered
    #[inline]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Always false; a span covers at least one bar
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True if `bar` lies inside the span
    #[inline]
    #[must_use]
    pub fn contains(&self, bar: u32) -> bool {
        (self.start..=self.end).contains(&bar)
    }

    /// True if `other` lies entirely inside this span
    #[inline]
    #[must_use]
    pub fn covers(&self, other: &BarSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Equivalent time selector
    #[must_use]
    pub fn to_selector(&self) -> Selector {
        Selector::bars(
            i32::try_from(self.start).unwrap_or(i32::MAX),
            i32::try_from(self.end).unwrap_or(i32::MAX),
        )
    }
}

impl Display for BarSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "bar {}", self.start)
        } else {
            write!(f, "bars {}–{}", self.start, self.end)
        }
    }
}

/// An entity bound to project data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRef {
    /// Entity kind
    pub kind: EntityKind,
    /// Bound identifier
    pub id: Identifier,
    /// Unambiguous display name ("Chorus 2 (bars 49–65)")
    pub display_name: String,
    /// Bars covered, for time-based entities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<BarSpan>,
    /// Containing entity the match was restricted to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Identifier>,
}

impl ResolvedRef {
    /// Bound layer, if this is a layer reference
    #[must_use]
    pub fn as_layer(&self) -> Option<LayerId> {
        LayerId::try_from(self.id.clone()).ok()
    }

    /// Bound section, if this is a section reference
    #[must_use]
    pub fn as_section(&self) -> Option<SectionId> {
        SectionId::try_from(self.id.clone()).ok()
    }
}

impl Display for ResolvedRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// A set of events bound to project data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEvents {
    /// Selector that yields the bound events
    pub selector: Selector,
    /// Display name
    pub display_name: String,
}

impl ResolvedEvents {
    /// Bind an explicit set of events
    #[must_use]
    pub fn from_ids(ids: Vec<EventId>) -> Self {
        let selector = Selector::events(ids);
        let display_name = describe(&selector);
        Self {
            selector,
            display_name,
        }
    }

    /// Bind events described by a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        let display_name = describe(&selector);
        Self {
            selector,
            display_name,
        }
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "binding", rename_all = "snake_case")]
pub enum Binding {
    /// A single entity
    Entity(ResolvedRef),
    /// A set of events
    Events(ResolvedEvents),
}

impl Binding {
    /// Entity kind bound
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Binding::Entity(r) => r.kind,
            Binding::Events(_) => EntityKind::Event,
        }
    }

    /// Display name
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Binding::Entity(r) => &r.display_name,
            Binding::Events(e) => &e.display_name,
        }
    }

    /// Entity binding, if any
    #[must_use]
    pub fn as_entity(&self) -> Option<&ResolvedRef> {
        match self {
            Binding::Entity(r) => Some(r),
            Binding::Events(_) => None,
        }
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

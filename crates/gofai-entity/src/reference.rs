//! Unresolved references
//!
//! The shapes a natural-language front end produces for "the chorus",
//! "that reverb", "bars 5 to 8" and so on. They describe an entity without
//! naming its identifier and are consumed once by the resolver.

use gofai_ident::Identifier;
use gofai_select::Selector;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::registry::EntityKind;
use crate::resolved::BarSpan;

/// Position relative to a temporal or list context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativePosition {
    /// Earliest in the project
    First,
    /// Latest in the project
    Last,
    /// After the playhead
    Next,
    /// Before the playhead
    Previous,
    /// Under the playhead
    Current,
}

impl RelativePosition {
    /// True for positions that need a playhead to interpret
    #[inline]
    #[must_use]
    pub const fn needs_playhead(self) -> bool {
        matches!(
            self,
            RelativePosition::Next | RelativePosition::Previous | RelativePosition::Current
        )
    }

    /// English adjective
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RelativePosition::First => "first",
            RelativePosition::Last => "last",
            RelativePosition::Next => "next",
            RelativePosition::Previous => "previous",
            RelativePosition::Current => "current",
        }
    }
}

/// Pointing form of a mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deixis {
    /// "this", "these": bound through the UI selection
    Deictic,
    /// "it", "them": bound through discourse history
    Anaphoric,
}

/// Descriptive fields shared by every unresolved reference
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mention {
    /// Explicit identifier, if the user named one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    /// Name as spoken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 1-based ordinal as spoken ("the second chorus" is 2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    /// Relative position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<RelativePosition>,
    /// Deictic or anaphoric form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deixis: Option<Deixis>,
    /// Original text, kept for explanations
    #[serde(default)]
    pub raw_text: String,
}

impl Mention {
    /// Mention with only its source text
    #[must_use]
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Self::default()
        }
    }

    /// With explicit identifier
    #[must_use]
    pub fn with_id(mut self, id: Identifier) -> Self {
        self.id = Some(id);
        self
    }

    /// With name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With 1-based ordinal
    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    /// With relative position
    #[must_use]
    pub fn with_relative(mut self, relative: RelativePosition) -> Self {
        self.relative = Some(relative);
        self
    }

    /// Mark as deictic ("this")
    #[must_use]
    pub fn deictic(mut self) -> Self {
        self.deixis = Some(Deixis::Deictic);
        self
    }

    /// Mark as anaphoric ("it")
    #[must_use]
    pub fn anaphoric(mut self) -> Self {
        self.deixis = Some(Deixis::Anaphoric);
        self
    }
}

/// Noun the user used for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerNoun {
    /// "layer"
    #[default]
    Layer,
    /// "track"
    Track,
}

/// A reference awaiting resolution, one variant per entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnresolvedRef {
    /// Board reference
    Board {
        /// Descriptive fields
        #[serde(flatten)]
        mention: Mention,
        /// Qualifying container
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within: Option<Box<UnresolvedRef>>,
    },
    /// Deck reference
    Deck {
        /// Descriptive fields
        #[serde(flatten)]
        mention: Mention,
        /// Qualifying container
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within: Option<Box<UnresolvedRef>>,
    },
    /// Layer or track reference
    #[serde(alias = "track")]
    Layer {
        /// Descriptive fields
        #[serde(flatten)]
        mention: Mention,
        /// Noun used, for provenance only
        #[serde(default)]
        noun: LayerNoun,
        /// Qualifying container
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within: Option<Box<UnresolvedRef>>,
    },
    /// Section reference
    Section {
        /// Descriptive fields
        #[serde(flatten)]
        mention: Mention,
        /// Section type ("chorus", "verse", ...)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        section_type: Option<String>,
        /// Qualifying container
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within: Option<Box<UnresolvedRef>>,
    },
    /// Bar range reference
    Range {
        /// Descriptive fields
        #[serde(flatten)]
        mention: Mention,
        /// Explicit bars
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bars: Option<BarSpan>,
        /// Qualifying container
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within: Option<Box<UnresolvedRef>>,
    },
    /// Card reference
    Card {
        /// Descriptive fields
        #[serde(flatten)]
        mention: Mention,
        /// Card type ("reverb", "eq", ...)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        card_type: Option<String>,
        /// Qualifying container
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within: Option<Box<UnresolvedRef>>,
    },
    /// Card parameter reference
    Param {
        /// Descriptive fields
        #[serde(flatten)]
        mention: Mention,
        /// Qualifying container
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within: Option<Box<UnresolvedRef>>,
    },
    /// Event reference
    Events {
        /// Descriptive fields
        #[serde(flatten)]
        mention: Mention,
        /// Description of the events, when given as a predicate
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<Selector>,
        /// Qualifying container
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within: Option<Box<UnresolvedRef>>,
    },
}

impl UnresolvedRef {
    /// Reference of `kind` with no kind-specific fields
    #[must_use]
    pub fn new(kind: EntityKind, mention: Mention) -> Self {
        match kind {
            EntityKind::Board => UnresolvedRef::Board {
                mention,
                within: None,
            },
            EntityKind::Deck => UnresolvedRef::Deck {
                mention,
                within: None,
            },
            EntityKind::Layer => UnresolvedRef::Layer {
                mention,
                noun: LayerNoun::Layer,
                within: None,
            },
            EntityKind::Section => UnresolvedRef::Section {
                mention,
                section_type: None,
                within: None,
            },
            EntityKind::Range => UnresolvedRef::Range {
                mention,
                bars: None,
                within: None,
            },
            EntityKind::Card => UnresolvedRef::Card {
                mention,
                card_type: None,
                within: None,
            },
            EntityKind::Param => UnresolvedRef::Param {
                mention,
                within: None,
            },
            EntityKind::Event => UnresolvedRef::Events {
                mention,
                selector: None,
                within: None,
            },
        }
    }

    /// Layer reference spoken as "track"
    #[must_use]
    pub fn track(mention: Mention) -> Self {
        UnresolvedRef::Layer {
            mention,
            noun: LayerNoun::Track,
            within: None,
        }
    }

    /// Section reference by type
    #[must_use]
    pub fn section_of_type(section_type: impl Into<String>, mention: Mention) -> Self {
        UnresolvedRef::Section {
            mention,
            section_type: Some(section_type.into()),
            within: None,
        }
    }

    /// Card reference by type
    #[must_use]
    pub fn card_of_type(card_type: impl Into<String>, mention: Mention) -> Self {
        UnresolvedRef::Card {
            mention,
            card_type: Some(card_type.into()),
            within: None,
        }
    }

    /// Range reference by explicit bars
    #[must_use]
    pub fn bars(bars: BarSpan, mention: Mention) -> Self {
        UnresolvedRef::Range {
            mention,
            bars: Some(bars),
            within: None,
        }
    }

    /// Event reference described by a selector
    #[must_use]
    pub fn events(selector: Selector, mention: Mention) -> Self {
        UnresolvedRef::Events {
            mention,
            selector: Some(selector),
            within: None,
        }
    }

    /// Qualify by a container reference
    #[must_use]
    pub fn within(mut self, container: UnresolvedRef) -> Self {
        *self.within_slot() = Some(Box::new(container));
        self
    }

    fn within_slot(&mut self) -> &mut Option<Box<UnresolvedRef>> {
        match self {
            UnresolvedRef::Board { within, .. }
            | UnresolvedRef::Deck { within, .. }
            | UnresolvedRef::Layer { within, .. }
            | UnresolvedRef::Section { within, .. }
            | UnresolvedRef::Range { within, .. }
            | UnresolvedRef::Card { within, .. }
            | UnresolvedRef::Param { within, .. }
            | UnresolvedRef::Events { within, .. } => within,
        }
    }

    /// Entity kind referred to
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            UnresolvedRef::Board { .. } => EntityKind::Board,
            UnresolvedRef::Deck { .. } => EntityKind::Deck,
            UnresolvedRef::Layer { .. } => EntityKind::Layer,
            UnresolvedRef::Section { .. } => EntityKind::Section,
            UnresolvedRef::Range { .. } => EntityKind::Range,
            UnresolvedRef::Card { .. } => EntityKind::Card,
            UnresolvedRef::Param { .. } => EntityKind::Param,
            UnresolvedRef::Events { .. } => EntityKind::Event,
        }
    }

    /// Shared descriptive fields
    #[must_use]
    pub fn mention(&self) -> &Mention {
        match self {
            UnresolvedRef::Board { mention, .. }
            | UnresolvedRef::Deck { mention, .. }
            | UnresolvedRef::Layer { mention, .. }
            | UnresolvedRef::Section { mention, .. }
            | UnresolvedRef::Range { mention, .. }
            | UnresolvedRef::Card { mention, .. }
            | UnresolvedRef::Param { mention, .. }
            | UnresolvedRef::Events { mention, .. } => mention,
        }
    }

    /// Qualifying container, if any
    #[must_use]
    pub fn container(&self) -> Option<&UnresolvedRef> {
        match self {
            UnresolvedRef::Board { within, .. }
            | UnresolvedRef::Deck { within, .. }
            | UnresolvedRef::Layer { within, .. }
            | UnresolvedRef::Section { within, .. }
            | UnresolvedRef::Range { within, .. }
            | UnresolvedRef::Card { within, .. }
            | UnresolvedRef::Param { within, .. }
            | UnresolvedRef::Events { within, .. } => within.as_deref(),
        }
    }

    /// Section or card type hint
    #[must_use]
    pub fn type_hint(&self) -> Option<&str> {
        match self {
            UnresolvedRef::Section { section_type, .. } => section_type.as_deref(),
            UnresolvedRef::Card { card_type, .. } => card_type.as_deref(),
            _ => None,
        }
    }

    /// Original text
    #[inline]
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.mention().raw_text
    }

    /// True when nothing but the entity kind was given ("the layer")
    #[must_use]
    pub fn is_bare(&self) -> bool {
        let m = self.mention();
        let specific = match self {
            UnresolvedRef::Section { section_type, .. } => section_type.is_some(),
            UnresolvedRef::Card { card_type, .. } => card_type.is_some(),
            UnresolvedRef::Range { bars, .. } => bars.is_some(),
            UnresolvedRef::Events { selector, .. } => selector.is_some(),
            _ => false,
        };
        m.id.is_none()
            && m.name.is_none()
            && m.ordinal.is_none()
            && m.relative.is_none()
            && m.deixis.is_none()
            && !specific
    }
}

impl Display for UnresolvedRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let raw = self.raw_text();
        if raw.is_empty() {
            write!(f, "the {}", self.kind().info().display_name)
        } else {
            f.write_str(raw)
        }
    }
}

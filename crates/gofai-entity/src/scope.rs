//! Composed scopes
//!
//! A [`Scope`] stacks references from board down to parameter. Any level may
//! be absent, in which case it defaults to ambient context. Whether a scope is
//! resolved is decided structurally: every present level must hold a
//! [`Binding`].

use gofai_select::Selector;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::error::EntityError;
use crate::reference::UnresolvedRef;
use crate::registry::EntityKind;
use crate::resolved::Binding;

/// Level of a scope, top-down
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeSlot {
    /// Board
    Board,
    /// Deck
    Deck,
    /// Layer
    Layer,
    /// Section or range
    Region,
    /// Events
    Events,
    /// Card
    Card,
    /// Parameter
    Param,
}

impl ScopeSlot {
    /// Every slot, top-down
    pub const ALL: [ScopeSlot; 7] = [
        ScopeSlot::Board,
        ScopeSlot::Deck,
        ScopeSlot::Layer,
        ScopeSlot::Region,
        ScopeSlot::Events,
        ScopeSlot::Card,
        ScopeSlot::Param,
    ];

    /// Slot an entity kind occupies
    #[must_use]
    pub const fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Board => ScopeSlot::Board,
            EntityKind::Deck => ScopeSlot::Deck,
            EntityKind::Layer => ScopeSlot::Layer,
            EntityKind::Section | EntityKind::Range => ScopeSlot::Region,
            EntityKind::Event => ScopeSlot::Events,
            EntityKind::Card => ScopeSlot::Card,
            EntityKind::Param => ScopeSlot::Param,
        }
    }
}

impl Display for ScopeSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScopeSlot::Board => "board",
            ScopeSlot::Deck => "deck",
            ScopeSlot::Layer => "layer",
            ScopeSlot::Region => "region",
            ScopeSlot::Events => "events",
            ScopeSlot::Card => "card",
            ScopeSlot::Param => "param",
        })
    }
}

/// One scope level, before or after resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ScopeLevel {
    /// Awaiting resolution
    Unresolved(UnresolvedRef),
    /// Bound
    Resolved(Binding),
}

impl ScopeLevel {
    /// Entity kind at this level
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            ScopeLevel::Unresolved(r) => r.kind(),
            ScopeLevel::Resolved(b) => b.kind(),
        }
    }

    /// Binding, if resolved
    #[must_use]
    pub fn binding(&self) -> Option<&Binding> {
        match self {
            ScopeLevel::Resolved(b) => Some(b),
            ScopeLevel::Unresolved(_) => None,
        }
    }
}

/// References composed across levels
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    board: Option<ScopeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deck: Option<ScopeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layer: Option<ScopeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    region: Option<ScopeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    events: Option<ScopeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    card: Option<ScopeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    param: Option<ScopeLevel>,
}

impl Scope {
    /// Empty scope (everything ambient)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a level in the slot for its kind, replacing any previous one
    #[must_use]
    pub fn with(mut self, level: ScopeLevel) -> Self {
        let slot = ScopeSlot::for_kind(level.kind());
        *self.slot_mut(slot) = Some(level);
        self
    }

    /// Add an unresolved reference
    #[must_use]
    pub fn with_unresolved(self, reference: UnresolvedRef) -> Self {
        self.with(ScopeLevel::Unresolved(reference))
    }

    /// Add a binding
    #[must_use]
    pub fn with_binding(self, binding: Binding) -> Self {
        self.with(ScopeLevel::Resolved(binding))
    }

    /// Level at `slot`
    #[must_use]
    pub fn get(&self, slot: ScopeSlot) -> Option<&ScopeLevel> {
        match slot {
            ScopeSlot::Board => self.board.as_ref(),
            ScopeSlot::Deck => self.deck.as_ref(),
            ScopeSlot::Layer => self.layer.as_ref(),
            ScopeSlot::Region => self.region.as_ref(),
            ScopeSlot::Events => self.events.as_ref(),
            ScopeSlot::Card => self.card.as_ref(),
            ScopeSlot::Param => self.param.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: ScopeSlot) -> &mut Option<ScopeLevel> {
        match slot {
            ScopeSlot::Board => &mut self.board,
            ScopeSlot::Deck => &mut self.deck,
            ScopeSlot::Layer => &mut self.layer,
            ScopeSlot::Region => &mut self.region,
            ScopeSlot::Events => &mut self.events,
            ScopeSlot::Card => &mut self.card,
            ScopeSlot::Param => &mut self.param,
        }
    }

    /// Present levels, top-down
    pub fn levels(&self) -> impl Iterator<Item = (ScopeSlot, &ScopeLevel)> {
        ScopeSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|level| (slot, level)))
    }

    /// True when no level is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels().next().is_none()
    }

    /// True when every present level is bound
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.levels()
            .all(|(_, level)| matches!(level, ScopeLevel::Resolved(_)))
    }

    /// Slots still awaiting resolution
    #[must_use]
    pub fn unresolved_slots(&self) -> Vec<ScopeSlot> {
        self.levels()
            .filter(|(_, level)| matches!(level, ScopeLevel::Unresolved(_)))
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Event selector restricting edits to this scope
    ///
    /// Layer, section or range, and events levels narrow the selection;
    /// board, deck, card and parameter levels do not select events. An empty
    /// scope selects everything.
    ///
    /// # Errors
    /// - [`EntityError::UnresolvedScope`] if any level is unresolved
    /// - [`EntityError::SlotMismatch`] if a binding cannot fill its level
    pub fn base_selector(&self) -> Result<Selector, EntityError> {
        if let Some(slot) = self.unresolved_slots().first() {
            return Err(EntityError::UnresolvedScope(*slot));
        }

        let mut parts = Vec::new();

        if let Some(ScopeLevel::Resolved(Binding::Entity(r))) = &self.layer {
            let layer = r.as_layer().ok_or_else(|| EntityError::SlotMismatch {
                slot: ScopeSlot::Layer,
                id: r.id.to_string(),
            })?;
            parts.push(Selector::layer(layer));
        }

        if let Some(ScopeLevel::Resolved(Binding::Entity(r))) = &self.region {
            let part = match (r.kind, r.as_section(), r.span) {
                (EntityKind::Section, Some(section), _) => Selector::section(section),
                (_, _, Some(span)) => span.to_selector(),
                _ => {
                    return Err(EntityError::SlotMismatch {
                        slot: ScopeSlot::Region,
                        id: r.id.to_string(),
                    })
                }
            };
            parts.push(part);
        }

        if let Some(ScopeLevel::Resolved(Binding::Events(e))) = &self.events {
            parts.push(e.selector.clone());
        }

        Ok(match parts.len() {
            0 => Selector::All,
            1 => parts.remove(0),
            _ => Selector::and_all(parts),
        })
    }
}

//! Interaction context
//!
//! UI selection, prior focus, discourse history and playhead position as
//! supplied by the caller on each call. The resolver only reads it.

use gofai_entity::EntityKind;
use gofai_ident::{EventId, Identifier};
use gofai_select::{ContextState, SelectionContext};
use serde::{Deserialize, Serialize};

/// Current UI selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UiSelection {
    /// Selected entities (layers, cards, sections, ...)
    #[serde(default)]
    pub items: Vec<Identifier>,
    /// Selected events
    #[serde(default)]
    pub events: Vec<EventId>,
    /// True when the project changed since the selection was made
    #[serde(default)]
    pub stale: bool,
}

impl UiSelection {
    /// Selection of entities
    #[must_use]
    pub fn of_items(items: impl IntoIterator<Item = Identifier>) -> Self {
        Self {
            items: items.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Selection of events
    #[must_use]
    pub fn of_events(events: impl IntoIterator<Item = EventId>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Mark as stale
    #[must_use]
    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    /// True when nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.events.is_empty()
    }
}

/// Something mentioned earlier in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Referent {
    /// A single entity
    Entity {
        /// Entity identifier
        id: Identifier,
    },
    /// A set of events
    Events {
        /// Event identifiers
        ids: Vec<EventId>,
    },
}

impl Referent {
    /// Entity kind referred to, if the identifier names one
    #[must_use]
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Referent::Entity { id } => EntityKind::from_category(id.category()),
            Referent::Events { .. } => Some(EntityKind::Event),
        }
    }
}

/// Everything the caller knows about the ongoing interaction
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InteractionContext {
    /// Current UI selection
    #[serde(default)]
    pub selection: Option<UiSelection>,
    /// Entity the user was last working on
    #[serde(default)]
    pub prior_focus: Option<Identifier>,
    /// Discourse history, most recent first
    #[serde(default)]
    pub discourse: Vec<Referent>,
    /// Bar under the playhead
    #[serde(default)]
    pub playhead_bar: Option<u32>,
}

impl InteractionContext {
    /// Empty context
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With UI selection
    #[must_use]
    pub fn with_selection(mut self, selection: UiSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// With prior focus
    #[must_use]
    pub fn with_focus(mut self, focus: Identifier) -> Self {
        self.prior_focus = Some(focus);
        self
    }

    /// Record a referent as the most recent mention
    #[must_use]
    pub fn mentioning(mut self, referent: Referent) -> Self {
        self.discourse.insert(0, referent);
        self
    }

    /// With playhead position
    #[must_use]
    pub fn at_bar(mut self, bar: u32) -> Self {
        self.playhead_bar = Some(bar);
        self
    }

    /// 0-based recency of the most recent mention of `id`
    #[must_use]
    pub fn recency_of(&self, id: &Identifier) -> Option<usize> {
        self.discourse
            .iter()
            .position(|r| matches!(r, Referent::Entity { id: rid } if rid == id))
    }
}

impl SelectionContext for InteractionContext {
    fn selected_events(&self) -> ContextState<'_> {
        match &self.selection {
            None => ContextState::Missing,
            Some(sel) if sel.stale => ContextState::Stale,
            Some(sel) => ContextState::Available(&sel.events),
        }
    }

    fn referenced_events(&self) -> ContextState<'_> {
        self.discourse
            .iter()
            .find_map(|r| match r {
                Referent::Events { ids } => Some(ContextState::Available(ids.as_slice())),
                Referent::Entity { .. } => None,
            })
            .unwrap_or(ContextState::Missing)
    }

    fn playhead_bar(&self) -> Option<u32> {
        self.playhead_bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gofai_ident::Category;

    fn layer(name: &str) -> Identifier {
        Identifier::make(Category::Layer, [name]).unwrap()
    }

    #[test]
    fn mentioning_keeps_most_recent_first() {
        let ctx = InteractionContext::new()
            .mentioning(Referent::Entity { id: layer("bass") })
            .mentioning(Referent::Entity { id: layer("keys") });
        assert_eq!(ctx.recency_of(&layer("keys")), Some(0));
        assert_eq!(ctx.recency_of(&layer("bass")), Some(1));
        assert_eq!(ctx.recency_of(&layer("drums")), None);
    }

    #[test]
    fn selection_state() {
        let ids = vec![EventId::make(["n1"]).unwrap()];
        let ctx = InteractionContext::new().with_selection(UiSelection::of_events(ids.clone()));
        assert_eq!(ctx.selected_events(), ContextState::Available(&ids));

        let stale = InteractionContext::new().with_selection(UiSelection::of_events(ids).stale());
        assert_eq!(stale.selected_events(), ContextState::Stale);

        assert_eq!(InteractionContext::new().selected_events(), ContextState::Missing);
    }

    #[test]
    fn referenced_events_uses_latest_event_referent() {
        let older = vec![EventId::make(["a"]).unwrap()];
        let newer = vec![EventId::make(["b"]).unwrap()];
        let ctx = InteractionContext::new()
            .mentioning(Referent::Events { ids: older })
            .mentioning(Referent::Entity { id: layer("bass") })
            .mentioning(Referent::Events { ids: newer.clone() });
        assert_eq!(ctx.referenced_events(), ContextState::Available(&newer));
    }

    #[test]
    fn referent_kind() {
        assert_eq!(
            Referent::Entity { id: layer("bass") }.kind(),
            Some(EntityKind::Layer)
        );
        let lex = Identifier::make(Category::Lex, ["bright"]).unwrap();
        assert_eq!(Referent::Entity { id: lex }.kind(), None);
    }
}

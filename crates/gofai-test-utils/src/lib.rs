//! Testing utilities for GOFAI workspace
//!
//! A demo song project plus interaction-context builders shared by the
//! integration tests.

#![allow(missing_docs)]

use gofai_entity::BarSpan;
use gofai_ident::{Category, EventId, Identifier, LayerId, SectionId};
use gofai_resolve::{
    EntityRecord, InteractionContext, MemoryProject, ProjectData, Referent, Resolver, UiSelection,
};
use gofai_select::{Event, EventKind, Role};

pub const SONG_LENGTH: u32 = 72;

pub fn ident(category: Category, leaf: &str) -> Identifier {
    Identifier::make(category, [leaf]).unwrap()
}

pub fn section_id(leaf: &str) -> Identifier {
    ident(Category::Section, leaf)
}

pub fn layer_id(leaf: &str) -> Identifier {
    ident(Category::Layer, leaf)
}

pub fn card_id(leaf: &str) -> Identifier {
    ident(Category::Card, leaf)
}

pub fn event_id(leaf: &str) -> EventId {
    EventId::make([leaf]).unwrap()
}

fn span(start: u32, end: u32) -> BarSpan {
    BarSpan::new(start, end).unwrap()
}

fn section(leaf: &str, name: &str, section_type: &str, start: u32, end: u32) -> EntityRecord {
    EntityRecord::new(section_id(leaf), name)
        .with_type(section_type)
        .with_span(span(start, end))
}

fn card(leaf: &str, name: &str, card_type: &str, layer: &str) -> EntityRecord {
    EntityRecord::new(card_id(leaf), name)
        .with_type(card_type)
        .within(layer_id(layer))
}

fn param(leaf: &str, name: &str, card: &str) -> EntityRecord {
    EntityRecord::new(ident(Category::Param, leaf), name).within(card_id(card))
}

fn note(leaf: &str, layer: &str, section: &str, bar: u32, pitch: u8) -> Event {
    Event::note(
        event_id(leaf),
        LayerId::make([layer]).unwrap(),
        bar,
        1.0,
        pitch,
    )
    .in_section(SectionId::make([section]).unwrap())
}

/// Entities of the demo song
///
/// Sections (bars): Intro 1–8, Verse 1 9–16, Chorus 1 17–24, Verse 2 25–48,
/// Chorus 2 49–65, Outro 66–72. Layers Bass, Keys, Drums and Lead sit on one
/// deck. The Drums layer carries a card named "Bass" and the deck holds a
/// restricted limiter.
pub fn demo_entities() -> Vec<EntityRecord> {
    let board = ident(Category::Board, "main");
    let deck = ident(Category::Deck, "arrangement");
    let layer = |leaf: &str, name: &str| EntityRecord::new(layer_id(leaf), name).within(deck.clone());

    vec![
        EntityRecord::new(board.clone(), "Main"),
        EntityRecord::new(deck.clone(), "Arrangement").within(board),
        section("intro", "Intro", "intro", 1, 8),
        section("verse-1", "Verse 1", "verse", 9, 16),
        section("chorus-1", "Chorus 1", "chorus", 17, 24),
        section("verse-2", "Verse 2", "verse", 25, 48),
        section("chorus-2", "Chorus 2", "chorus", 49, 65),
        section("outro", "Outro", "outro", 66, 72),
        layer("bass", "Bass"),
        layer("keys", "Keys"),
        layer("drums", "Drums"),
        layer("lead", "Lead"),
        card("bass-eq", "EQ", "eq", "bass"),
        card("bass-comp", "Compressor", "compressor", "bass"),
        card("keys-reverb", "Reverb", "reverb", "keys"),
        card("lead-reverb", "Reverb", "reverb", "lead"),
        card("drums-low", "Bass", "eq", "drums"),
        EntityRecord::new(card_id("limiter"), "Limiter")
            .with_type("limiter")
            .within(deck.clone())
            .restricted(),
        param("bass-eq-gain", "Gain", "bass-eq"),
        param("keys-reverb-mix", "Mix", "keys-reverb"),
        param("keys-reverb-decay", "Decay", "keys-reverb"),
    ]
}

/// Events of the demo song
pub fn demo_events() -> Vec<Event> {
    vec![
        note("lead-verse", "lead", "verse-1", 9, 67).with_role(Role::Lead),
        note("bass-1", "bass", "chorus-1", 17, 36).with_role(Role::Bass),
        note("bass-2", "bass", "chorus-1", 18, 38).with_role(Role::Bass),
        Event::new(
            event_id("keys-1"),
            EventKind::Chord,
            LayerId::make(["keys"]).unwrap(),
            17,
            1.0,
        )
        .with_pitch(60)
        .with_role(Role::Harmony)
        .in_section(SectionId::make(["chorus-1"]).unwrap()),
        Event::new(
            event_id("kick-1"),
            EventKind::Drum,
            LayerId::make(["drums"]).unwrap(),
            17,
            1.0,
        )
        .with_pitch(36)
        .with_role(Role::Percussion)
        .in_section(SectionId::make(["chorus-1"]).unwrap()),
        note("lead-1", "lead", "chorus-1", 20, 72)
            .with_role(Role::Lead)
            .with_velocity(96),
        note("bass-3", "bass", "chorus-2", 49, 36).with_role(Role::Bass),
        note("lead-2", "lead", "chorus-2", 50, 76)
            .with_role(Role::Lead)
            .with_velocity(100)
            .with_tag("hook"),
        note("lead-3", "lead", "chorus-2", 51, 79)
            .with_role(Role::Lead)
            .with_velocity(90)
            .with_tag("hook"),
    ]
}

pub fn demo_project_data() -> ProjectData {
    ProjectData {
        length_bars: Some(SONG_LENGTH),
        entities: demo_entities(),
        events: demo_events(),
    }
}

pub fn demo_project() -> MemoryProject {
    MemoryProject::from_data(demo_project_data()).unwrap()
}

pub fn resolver() -> Resolver {
    Resolver::default()
}

pub fn empty_context() -> InteractionContext {
    InteractionContext::new()
}

pub fn playhead_at(bar: u32) -> InteractionContext {
    InteractionContext::new().at_bar(bar)
}

pub fn selecting(items: impl IntoIterator<Item = Identifier>) -> InteractionContext {
    InteractionContext::new().with_selection(UiSelection::of_items(items))
}

pub fn selecting_events(ids: impl IntoIterator<Item = EventId>) -> InteractionContext {
    InteractionContext::new().with_selection(UiSelection::of_events(ids))
}

pub fn stale_selection(items: impl IntoIterator<Item = Identifier>) -> InteractionContext {
    InteractionContext::new().with_selection(UiSelection::of_items(items).stale())
}

/// Context whose discourse mentions `ids` in order, the last one most recent
pub fn after_mentioning(ids: impl IntoIterator<Item = Identifier>) -> InteractionContext {
    ids.into_iter().fold(InteractionContext::new(), |ctx, id| {
        ctx.mentioning(Referent::Entity { id })
    })
}

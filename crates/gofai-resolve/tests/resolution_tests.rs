//! Integration tests for resolution precedence, ambiguity and scope handling

use gofai_entity::{
    Binding, EntityKind, Mention, RelativePosition, Scope, ScopeSlot, UnresolvedRef,
};
use gofai_ident::{LayerId, SectionId};
use gofai_resolve::{
    Candidate, DefaultBindings, DefaultRule, EntityQuery, FailureReason, InteractionContext,
    Matcher, ProjectStore, Referent, ResolutionMethod, ResolutionResult, Resolver, ResolverConfig,
    ScopeResolution, StoreError,
};
use gofai_select::{EventKind, Selector};
use gofai_test_utils::{
    after_mentioning, card_id, demo_project, empty_context, event_id, layer_id,
    playhead_at, resolver, section_id, selecting, selecting_events, stale_selection,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Store that answers id lookups with one entity and fuzzy lookups with fixed scores
struct FixedStore {
    exact: Option<Candidate>,
    fuzzy: Vec<Candidate>,
}

impl ProjectStore for FixedStore {
    fn find(&self, query: &EntityQuery) -> Result<Vec<Candidate>, StoreError> {
        Ok(match &query.matcher {
            Matcher::Id(id) => self.exact.iter().filter(|c| &c.id == id).cloned().collect(),
            Matcher::Fuzzy(_) => self.fuzzy.clone(),
            _ => Vec::new(),
        })
    }

    fn length_bars(&self) -> Option<u32> {
        None
    }
}

/// Store whose backend is unreachable
struct OfflineStore;

impl ProjectStore for OfflineStore {
    fn find(&self, _: &EntityQuery) -> Result<Vec<Candidate>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    fn length_bars(&self) -> Option<u32> {
        None
    }
}

fn layer_candidate(leaf: &str, order: usize, confidence: f64) -> Candidate {
    Candidate {
        id: layer_id(leaf),
        kind: EntityKind::Layer,
        name: leaf.to_string(),
        type_tag: None,
        span: None,
        order,
        containers: Vec::new(),
        confidence,
    }
}

fn fuzzy_store(scores: &[(&str, f64)]) -> FixedStore {
    FixedStore {
        exact: None,
        fuzzy: scores
            .iter()
            .enumerate()
            .map(|(i, (leaf, score))| layer_candidate(leaf, i, *score))
            .collect(),
    }
}

fn named_layer(name: &str) -> UnresolvedRef {
    UnresolvedRef::new(EntityKind::Layer, Mention::new(name).with_name(name))
}

fn bound_id(result: &ResolutionResult) -> Option<String> {
    result
        .binding()
        .and_then(Binding::as_entity)
        .map(|r| r.id.to_string())
}

#[test]
fn test_second_chorus_scenario() {
    let project = demo_project();
    let reference = UnresolvedRef::section_of_type(
        "chorus",
        Mention::new("the second chorus").with_ordinal(2),
    );
    let result = resolver().resolve(&reference, Some(&project), &empty_context());

    let ResolutionResult::Resolved {
        binding,
        method,
        explanation,
        ..
    } = result
    else {
        panic!("expected a binding");
    };
    assert_eq!(method, ResolutionMethod::TypeAndOrdinal);
    assert_eq!(binding.display_name(), "Chorus 2 (bars 49–65)");
    assert_eq!(explanation, "'the second chorus' → Chorus 2 (bars 49–65)");
    assert_eq!(
        binding.as_entity().map(|r| r.id.clone()),
        Some(section_id("chorus-2"))
    );
}

#[test]
fn test_exact_id_wins_over_name() {
    let project = demo_project();
    let reference = UnresolvedRef::new(
        EntityKind::Layer,
        Mention::new("keys")
            .with_id(layer_id("keys"))
            .with_name("Bass"),
    );
    let result = resolver().resolve(&reference, Some(&project), &empty_context());
    assert_eq!(result.method(), Some(ResolutionMethod::ExactId));
    assert_eq!(bound_id(&result).as_deref(), Some("layer:keys"));
}

#[test]
fn test_ambiguity_gap() {
    let reference = named_layer("pads");

    let close = fuzzy_store(&[("pad-a", 0.80), ("pad-b", 0.70)]);
    let result = resolver().resolve(&reference, Some(&close), &empty_context());
    let ResolutionResult::Ambiguous {
        candidates,
        question,
        suggested_default,
    } = result
    else {
        panic!("expected ambiguity");
    };
    assert_eq!(candidates.len(), 2);
    assert_eq!(question, "Which layer do you mean: pad-a or pad-b?");
    assert_eq!(suggested_default, Some(layer_id("pad-a")));

    let apart = fuzzy_store(&[("pad-a", 0.90), ("pad-b", 0.60)]);
    let result = resolver().resolve(&reference, Some(&apart), &empty_context());
    let ResolutionResult::Resolved {
        confidence, method, ..
    } = &result
    else {
        panic!("expected a binding, got {result:?}");
    };
    assert_eq!(*method, ResolutionMethod::FuzzyName);
    assert!((confidence - 0.90).abs() < 1e-9);
    assert_eq!(bound_id(&result).as_deref(), Some("layer:pad-a"));
}

#[test]
fn test_configured_gap_widens_ambiguity() {
    let config = ResolverConfig::from_toml_str("ambiguity_gap = 0.35\n").unwrap();
    let apart = fuzzy_store(&[("pad-a", 0.90), ("pad-b", 0.60)]);
    let result = Resolver::new(config).resolve(&named_layer("pads"), Some(&apart), &empty_context());
    assert!(result.is_ambiguous());
}

#[test]
fn test_fuzzy_below_threshold_reports_near_matches() {
    let store = fuzzy_store(&[("pad-a", 0.60), ("pad-b", 0.55)]);
    let result = resolver().resolve(&named_layer("pads"), Some(&store), &empty_context());
    let ResolutionResult::Failed {
        reason,
        near_matches,
        suggestion,
        ..
    } = result
    else {
        panic!("expected failure");
    };
    assert_eq!(reason, FailureReason::NotFound);
    assert_eq!(near_matches.len(), 2);
    assert_eq!(near_matches[0].id, layer_id("pad-a"));
    assert_eq!(suggestion.as_deref(), Some("did you mean pad-a?"));
}

#[test]
fn test_fuzzy_name_against_project() {
    let project = demo_project();
    let result = resolver().resolve(&named_layer("Kees"), Some(&project), &empty_context());
    assert_eq!(result.method(), Some(ResolutionMethod::FuzzyName));
    assert_eq!(bound_id(&result).as_deref(), Some("layer:keys"));

    let missing = resolver().resolve(&named_layer("Strings"), Some(&project), &empty_context());
    let ResolutionResult::Failed {
        reason,
        near_matches,
        ..
    } = missing
    else {
        panic!("expected failure");
    };
    assert_eq!(reason, FailureReason::NotFound);
    assert!(near_matches.len() <= 3);
}

#[test]
fn test_deixis_requires_live_selection() {
    let project = demo_project();
    let reference = UnresolvedRef::new(EntityKind::Layer, Mention::new("this layer").deictic());

    let none = resolver().resolve(&reference, Some(&project), &empty_context());
    assert_eq!(none.failure_reason(), Some(FailureReason::NoSelection));

    let stale = resolver().resolve(
        &reference,
        Some(&project),
        &stale_selection([layer_id("bass")]),
    );
    assert_eq!(stale.failure_reason(), Some(FailureReason::StaleSelection));

    let live = resolver().resolve(&reference, Some(&project), &selecting([layer_id("bass")]));
    assert_eq!(live.method(), Some(ResolutionMethod::Deictic));
    assert_eq!(bound_id(&live).as_deref(), Some("layer:bass"));
}

#[test]
fn test_deictic_events_use_selected_events() {
    let project = demo_project();
    let reference = UnresolvedRef::new(EntityKind::Event, Mention::new("this note").deictic());
    let ctx = selecting_events([event_id("lead-2")]);
    let result = resolver().resolve(&reference, Some(&project), &ctx);

    let Some(Binding::Events(events)) = result.binding() else {
        panic!("expected events, got {result:?}");
    };
    let selection = resolver().select(&events.selector, &project, &ctx).unwrap();
    assert_eq!(selection.ids(), vec![&event_id("lead-2")]);
}

#[test]
fn test_layer_and_track_bind_identically() {
    let project = demo_project();
    let layer = named_layer("Bass");
    let track = UnresolvedRef::track(Mention::new("the bass track").with_name("Bass"));

    let a = resolver().resolve(&layer, Some(&project), &empty_context());
    let b = resolver().resolve(&track, Some(&project), &empty_context());
    assert_eq!(a.binding(), b.binding());
    assert_eq!(bound_id(&a).as_deref(), Some("layer:bass"));
}

#[test]
fn test_card_within_layer() {
    let project = demo_project();
    let on_keys = UnresolvedRef::card_of_type("reverb", Mention::new("the reverb on the keys"))
        .within(named_layer("Keys"));
    let result = resolver().resolve(&on_keys, Some(&project), &empty_context());
    let entity = result.binding().and_then(Binding::as_entity).unwrap();
    assert_eq!(entity.id, card_id("keys-reverb"));
    assert_eq!(entity.container, Some(layer_id("keys")));

    let unqualified = UnresolvedRef::card_of_type("reverb", Mention::new("the reverb"));
    let result = resolver().resolve(&unqualified, Some(&project), &empty_context());
    assert!(result.is_ambiguous());
}

#[test]
fn test_container_excludes_same_name_elsewhere() {
    let project = demo_project();
    let bass_card = |layer: &str| {
        UnresolvedRef::new(EntityKind::Card, Mention::new("the bass card").with_name("Bass"))
            .within(named_layer(layer))
    };

    let on_drums = resolver().resolve(&bass_card("Drums"), Some(&project), &empty_context());
    assert_eq!(bound_id(&on_drums).as_deref(), Some("card:drums-low"));

    let on_keys = resolver().resolve(&bass_card("Keys"), Some(&project), &empty_context());
    assert_eq!(on_keys.failure_reason(), Some(FailureReason::NotFound));
}

#[test]
fn test_qualifier_may_be_any_ancestor() {
    let project = demo_project();
    let main_board = UnresolvedRef::new(EntityKind::Board, Mention::new("the main board").with_name("Main"));
    let bass = named_layer("Bass").within(main_board);
    let result = resolver().resolve(&bass, Some(&project), &empty_context());
    assert_eq!(bound_id(&result).as_deref(), Some("layer:bass"));

    let deck = UnresolvedRef::new(
        EntityKind::Deck,
        Mention::new("the arrangement").with_name("Arrangement"),
    );
    let eq = UnresolvedRef::new(EntityKind::Card, Mention::new("the EQ").with_name("EQ")).within(deck);
    let result = resolver().resolve(&eq, Some(&project), &empty_context());
    assert_eq!(bound_id(&result).as_deref(), Some("card:bass-eq"));
}

#[test]
fn test_backend_failure_keeps_detail() {
    let result = resolver().resolve(&named_layer("Bass"), Some(&OfflineStore), &empty_context());
    let ResolutionResult::Failed {
        reason,
        message,
        suggestion,
        ..
    } = result
    else {
        panic!("expected a failure");
    };
    assert_eq!(reason, FailureReason::NotFound);
    assert!(message.contains("connection refused"), "{message}");
    assert!(suggestion.is_some());
}

#[test]
fn test_failure_reasons() {
    let project = demo_project();
    let layer = named_layer("Bass");

    let no_project = resolver().resolve(&layer, None, &empty_context());
    assert_eq!(no_project.failure_reason(), Some(FailureReason::NoProject));

    let it = UnresolvedRef::new(EntityKind::Layer, Mention::new("it").anaphoric());
    let no_discourse = resolver().resolve(&it, Some(&project), &empty_context());
    assert_eq!(no_discourse.failure_reason(), Some(FailureReason::NoDiscourse));

    let fourth = UnresolvedRef::section_of_type(
        "chorus",
        Mention::new("the fourth chorus").with_ordinal(4),
    );
    let out_of_range = resolver().resolve(&fourth, Some(&project), &empty_context());
    assert_eq!(out_of_range.failure_reason(), Some(FailureReason::OutOfRange));

    let limiter = UnresolvedRef::new(
        EntityKind::Card,
        Mention::new("the limiter").with_id(card_id("limiter")),
    );
    let denied = resolver().resolve(&limiter, Some(&project), &empty_context());
    assert_eq!(denied.failure_reason(), Some(FailureReason::AccessDenied));

    let wrong_kind = UnresolvedRef::new(
        EntityKind::Layer,
        Mention::new("chorus").with_id(section_id("chorus-1")),
    );
    let mismatch = resolver().resolve(&wrong_kind, Some(&project), &empty_context());
    assert_eq!(mismatch.failure_reason(), Some(FailureReason::TypeMismatch));
}

#[test]
fn test_anaphora_uses_most_recent_matching_kind() {
    let project = demo_project();
    let ctx = after_mentioning([layer_id("bass"), layer_id("keys"), section_id("chorus-1")]);
    let it = UnresolvedRef::new(EntityKind::Layer, Mention::new("it").anaphoric());
    let result = resolver().resolve(&it, Some(&project), &ctx);
    assert_eq!(result.method(), Some(ResolutionMethod::Anaphoric));
    assert_eq!(bound_id(&result).as_deref(), Some("layer:keys"));
}

#[test]
fn test_anaphoric_events() {
    let project = demo_project();
    let ctx = InteractionContext::new().mentioning(Referent::Events {
        ids: vec![event_id("bass-1"), event_id("bass-2")],
    });
    let them = UnresolvedRef::new(EntityKind::Event, Mention::new("them").anaphoric());
    let result = resolver().resolve(&them, Some(&project), &ctx);
    let Some(Binding::Events(events)) = result.binding() else {
        panic!("expected events, got {result:?}");
    };
    let selection = resolver().select(&events.selector, &project, &ctx).unwrap();
    assert_eq!(selection.len(), 2);
}

#[test]
fn test_salience_and_defaults_for_bare_layer() {
    let project = demo_project();
    let bare = UnresolvedRef::new(EntityKind::Layer, Mention::new("the layer"));

    let unclear = resolver().resolve(&bare, Some(&project), &empty_context());
    assert!(unclear.is_ambiguous());

    let focused = InteractionContext::new().with_focus(layer_id("lead"));
    let by_focus = resolver().resolve(&bare, Some(&project), &focused);
    assert_eq!(by_focus.method(), Some(ResolutionMethod::Salience));
    assert_eq!(bound_id(&by_focus).as_deref(), Some("layer:lead"));

    let config = ResolverConfig::new().with_defaults(
        DefaultBindings::builtin().with_override(EntityKind::Layer, DefaultRule::Named("Drums".into())),
    );
    let by_default = Resolver::new(config).resolve(&bare, Some(&project), &empty_context());
    assert_eq!(by_default.method(), Some(ResolutionMethod::SystemDefault));
    assert_eq!(bound_id(&by_default).as_deref(), Some("layer:drums"));
}

#[test]
fn test_current_section_under_playhead() {
    let project = demo_project();
    let current = UnresolvedRef::new(
        EntityKind::Section,
        Mention::new("this section").with_relative(RelativePosition::Current),
    );
    let result = resolver().resolve(&current, Some(&project), &playhead_at(30));
    assert_eq!(bound_id(&result).as_deref(), Some("section:verse-2"));
}

#[test]
fn test_event_selector_within_layer() {
    let project = demo_project();
    let notes = UnresolvedRef::events(Selector::kind(EventKind::Note), Mention::new("the bass notes"))
        .within(named_layer("Bass"));
    let result = resolver().resolve(&notes, Some(&project), &empty_context());
    assert_eq!(result.method(), Some(ResolutionMethod::EventSelector));

    let Some(Binding::Events(events)) = result.binding() else {
        panic!("expected events, got {result:?}");
    };
    let selection = resolver().select(&events.selector, &project, &empty_context()).unwrap();
    let ids: Vec<String> = selection.ids().iter().map(|id| id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["event:bass-1", "event:bass-2", "event:bass-3"]);
}

#[test]
fn test_invalid_event_selector_rejected() {
    let project = demo_project();
    let bad = UnresolvedRef::events(Selector::pitch(70, 60), Mention::new("those notes"));
    let result = resolver().resolve(&bad, Some(&project), &empty_context());
    assert_eq!(result.failure_reason(), Some(FailureReason::InvalidType));
}

#[test]
fn test_resolve_scope_qualifies_lower_levels() {
    let project = demo_project();
    let scope = Scope::new()
        .with_unresolved(named_layer("Keys"))
        .with_unresolved(UnresolvedRef::section_of_type(
            "chorus",
            Mention::new("the second chorus").with_ordinal(2),
        ))
        .with_unresolved(UnresolvedRef::card_of_type("reverb", Mention::new("the reverb")));

    let outcome = resolver().resolve_scope(&scope, Some(&project), &empty_context());
    let resolved = outcome.scope().expect("scope should resolve");
    assert!(resolved.is_resolved());

    let card = resolved
        .get(ScopeSlot::Card)
        .and_then(|level| level.binding())
        .and_then(Binding::as_entity)
        .map(|r| r.id.clone());
    assert_eq!(card, Some(card_id("keys-reverb")));

    assert_eq!(
        resolved.base_selector().unwrap(),
        Selector::and_all([
            Selector::layer(LayerId::make(["keys"]).unwrap()),
            Selector::section(SectionId::make(["chorus-2"]).unwrap()),
        ])
    );
}

#[test]
fn test_resolve_scope_blocks_on_ambiguity() {
    let project = demo_project();
    let scope = Scope::new().with_unresolved(UnresolvedRef::card_of_type(
        "reverb",
        Mention::new("the reverb"),
    ));
    let outcome = resolver().resolve_scope(&scope, Some(&project), &empty_context());
    let ScopeResolution::Blocked { slot, result } = outcome else {
        panic!("expected a blocked scope");
    };
    assert_eq!(slot, ScopeSlot::Card);
    assert!(result.is_ambiguous());
}

#[test]
fn test_result_json_shape() {
    let project = demo_project();
    let result = resolver().resolve(
        &UnresolvedRef::new(EntityKind::Deck, Mention::new("the deck")),
        Some(&project),
        &empty_context(),
    );
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["outcome"], "resolved");
    assert_eq!(json["binding"]["id"], "deck:arrangement");
    assert_eq!(json["method"], "salience");
}

proptest! {
    #[test]
    fn exact_id_beats_any_fuzzy_scores(scores in prop::collection::vec(0.0f64..=1.0, 0..6)) {
        let exact = layer_candidate("target", 99, 1.0);
        let store = FixedStore {
            exact: Some(exact),
            fuzzy: scores
                .iter()
                .enumerate()
                .map(|(i, s)| layer_candidate(&format!("other-{i}"), i, *s))
                .collect(),
        };
        let reference = UnresolvedRef::new(
            EntityKind::Layer,
            Mention::new("target").with_id(layer_id("target")).with_name("other-0"),
        );
        let result = resolver().resolve(&reference, Some(&store), &empty_context());
        prop_assert_eq!(result.method(), Some(ResolutionMethod::ExactId));
        prop_assert_eq!(bound_id(&result), Some("layer:target".to_string()));
    }

    #[test]
    fn ambiguity_follows_gap(top in 0.80f64..=1.0, drop in 0.0f64..=0.5) {
        let second = (top - drop).max(0.0);
        let store = fuzzy_store(&[("pad-a", top), ("pad-b", second)]);
        let result = resolver().resolve(&named_layer("pads"), Some(&store), &empty_context());
        if top - second < 0.15 - 1e-6 {
            prop_assert!(result.is_ambiguous());
        } else if top - second > 0.15 + 1e-6 {
            prop_assert!(result.is_resolved());
        }
    }
}

//! Resolution engine
//!
//! Binds one [`UnresolvedRef`] at a time against a [`ProjectStore`]. A
//! `within` qualifier is resolved first; the reference itself then goes
//! through these steps, and the first one that applies decides the outcome:
//!
//! 1. exact identifier
//! 2. exact name
//! 3. type and ordinal
//! 4. relative position
//! 5. explicit bar range
//! 6. event selector
//! 7. deictic (UI selection)
//! 8. anaphoric (discourse history)
//! 9. salience
//! 10. fuzzy name
//! 11. system default
//!
//! Deictic and anaphoric failures are final. Salience with no contextual
//! signal leaves an ambiguity pending, which a fuzzy or default match may
//! still settle.

use gofai_entity::{
    BarSpan, Binding, Deixis, EntityKind, RelativePosition, ResolvedEvents, ResolvedRef, Scope,
    ScopeLevel, UnresolvedRef,
};
use gofai_ident::{Category, EventId, Identifier};
use gofai_select::{
    evaluate_with_limit, validate_with_limit, EvalError, EventSource, Selection,
    SelectionContext, Selector, ValidationError,
};

use crate::config::{DefaultRule, ResolverConfig};
use crate::context::{InteractionContext, Referent};
use crate::result::{
    FailureReason, NearMatch, ResolutionMethod, ResolutionResult, ScopeResolution, ScoredBinding,
};
use crate::store::{Candidate, EntityQuery, Matcher, ProjectStore, StoreError};

const EXACT: f64 = 1.0;
const ANAPHORIC: f64 = 0.9;
const SOLE_CANDIDATE: f64 = 0.9;
const EPSILON: f64 = 1e-9;

/// `Ok(None)`: step does not apply. `Ok(Some)` or `Err`: final outcome.
type Step = Result<Option<ResolutionResult>, ResolutionResult>;

type StepFn = fn(&Resolver, &Lookup<'_>, &mut Pending) -> Step;

/// State carried between steps
#[derive(Debug, Default)]
struct Pending {
    ambiguity: Option<ResolutionResult>,
    near_matches: Vec<NearMatch>,
}

/// Reference resolver
///
/// Stateless across calls; every call takes the project and interaction
/// context it should read.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver
    #[inline]
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve one reference
    ///
    /// Never panics and never guesses: absence and ambiguity come back as
    /// [`ResolutionResult::Failed`] and [`ResolutionResult::Ambiguous`].
    #[tracing::instrument(skip(self, store, ctx), fields(kind = %reference.kind(), text = %reference))]
    pub fn resolve(
        &self,
        reference: &UnresolvedRef,
        store: Option<&dyn ProjectStore>,
        ctx: &InteractionContext,
    ) -> ResolutionResult {
        let result = self.resolve_in(reference, None, store, ctx);
        log_outcome(&result);
        result
    }

    /// Resolve a reference inside an already bound container
    ///
    /// An explicit `within` on the reference takes precedence over `container`.
    #[tracing::instrument(skip(self, container, store, ctx), fields(kind = %reference.kind(), text = %reference))]
    pub fn resolve_within(
        &self,
        reference: &UnresolvedRef,
        container: &Binding,
        store: Option<&dyn ProjectStore>,
        ctx: &InteractionContext,
    ) -> ResolutionResult {
        let result = self.resolve_in(reference, Some(container), store, ctx);
        log_outcome(&result);
        result
    }

    /// Resolve every level of a scope, top-down
    ///
    /// Each unresolved level is qualified by the nearest bound level above it
    /// that may contain it. Resolution stops at the first level that does not
    /// resolve.
    #[tracing::instrument(skip_all)]
    pub fn resolve_scope(
        &self,
        scope: &Scope,
        store: Option<&dyn ProjectStore>,
        ctx: &InteractionContext,
    ) -> ScopeResolution {
        let mut resolved = Scope::new();
        let mut bound: Vec<Binding> = Vec::new();

        for (slot, level) in scope.levels() {
            let binding = match level {
                ScopeLevel::Resolved(binding) => binding.clone(),
                ScopeLevel::Unresolved(reference) => {
                    let parent = if reference.container().is_some() {
                        None
                    } else {
                        bound
                            .iter()
                            .rev()
                            .find(|b| reference.kind().can_be_contained_by(b.kind()))
                    };
                    tracing::debug!(%slot, parent = ?parent.map(Binding::display_name), "resolving scope level");
                    match self.resolve_in(reference, parent, store, ctx) {
                        ResolutionResult::Resolved { binding, .. } => binding,
                        other => {
                            tracing::info!(%slot, "scope blocked");
                            return ScopeResolution::Blocked {
                                slot,
                                result: other,
                            };
                        }
                    }
                }
            };
            resolved = resolved.with_binding(binding.clone());
            bound.push(binding);
        }

        ScopeResolution::Resolved { scope: resolved }
    }

    /// Evaluate a selector against project events with this resolver's depth limit
    ///
    /// # Errors
    /// See [`gofai_select::evaluate_with_limit`].
    #[tracing::instrument(skip_all)]
    pub fn select<S>(
        &self,
        selector: &Selector,
        source: &S,
        ctx: &InteractionContext,
    ) -> Result<Selection, EvalError>
    where
        S: EventSource + ?Sized,
    {
        let context: &dyn SelectionContext = ctx;
        let selection =
            evaluate_with_limit(selector, source, Some(context), self.config.max_selector_depth)?;
        tracing::info!(matched = selection.len(), "selection evaluated");
        Ok(selection)
    }

    fn resolve_in(
        &self,
        reference: &UnresolvedRef,
        inherited: Option<&Binding>,
        store: Option<&dyn ProjectStore>,
        ctx: &InteractionContext,
    ) -> ResolutionResult {
        let Some(store) = store else {
            tracing::warn!("no project loaded");
            return ResolutionResult::failed(FailureReason::NoProject, "no project is open")
                .with_suggestion("open a project first");
        };

        let kind = reference.kind();
        let container_binding = match reference.container() {
            Some(parent) => {
                if !kind.can_be_contained_by(parent.kind()) {
                    return ResolutionResult::failed(
                        FailureReason::InvalidType,
                        format!(
                            "a {} cannot contain a {}",
                            parent.kind().info().display_name,
                            kind.info().display_name
                        ),
                    );
                }
                tracing::debug!(container = %parent, "resolving container");
                match self.resolve_in(parent, None, Some(store), ctx) {
                    ResolutionResult::Resolved { binding, .. } => Some(binding),
                    other => return other,
                }
            }
            None => inherited.cloned(),
        };
        let container = match &container_binding {
            Some(Binding::Entity(r)) => Some(r),
            Some(Binding::Events(_)) => {
                return ResolutionResult::failed(
                    FailureReason::InvalidType,
                    "events cannot contain other entities",
                )
            }
            None => None,
        };

        let lookup = Lookup {
            reference,
            kind,
            store,
            ctx,
            container,
        };

        let steps: [(&str, StepFn); 11] = [
            ("exact_id", Self::exact_id),
            ("exact_name", Self::exact_name),
            ("ordinal", Self::ordinal),
            ("relative_position", Self::relative),
            ("explicit_range", Self::explicit_range),
            ("event_selector", Self::event_selector),
            ("deictic", Self::deictic),
            ("anaphoric", Self::anaphoric),
            ("salience", Self::salience),
            ("fuzzy_name", Self::fuzzy),
            ("system_default", Self::system_default),
        ];

        let mut pending = Pending::default();
        for (name, step) in steps {
            match step(self, &lookup, &mut pending) {
                Ok(None) => tracing::debug!(step = name, "not applicable"),
                Ok(Some(result)) | Err(result) => {
                    tracing::debug!(step = name, "decided");
                    return result;
                }
            }
        }

        pending
            .ambiguity
            .unwrap_or_else(|| lookup.not_found(pending.near_matches))
    }

    fn exact_id(&self, lookup: &Lookup<'_>, _: &mut Pending) -> Step {
        let Some(id) = &lookup.reference.mention().id else {
            return Ok(None);
        };
        if EntityKind::from_category(id.category()) != Some(lookup.kind) {
            return Err(ResolutionResult::failed(
                FailureReason::TypeMismatch,
                format!("'{id}' is not a {}", lookup.kind.info().display_name),
            ));
        }
        match lookup.find(Matcher::Id(id.clone()))?.first() {
            Some(c) => Ok(Some(lookup.resolved(
                lookup.bind(c),
                EXACT,
                ResolutionMethod::ExactId,
            ))),
            None => Err(ResolutionResult::failed(
                FailureReason::NotFound,
                format!(
                    "no {} with id '{id}'{}",
                    lookup.kind.info().display_name,
                    lookup.within_text()
                ),
            )),
        }
    }

    fn exact_name(&self, lookup: &Lookup<'_>, _: &mut Pending) -> Step {
        let Some(name) = &lookup.reference.mention().name else {
            return Ok(None);
        };
        let found = lookup.find(Matcher::Name(name.clone()))?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(Some(lookup.resolved(
                lookup.bind(&found[0]),
                EXACT,
                ResolutionMethod::ExactName,
            ))),
            _ => {
                let (scored, _) = self.score_salience(lookup, found);
                Ok(Some(self.decide(lookup, scored, ResolutionMethod::ExactName)))
            }
        }
    }

    fn ordinal(&self, lookup: &Lookup<'_>, _: &mut Pending) -> Step {
        let Some(n) = lookup.reference.mention().ordinal else {
            return Ok(None);
        };
        let info = lookup.kind.info();
        if !info.supports_ordinal {
            return Err(ResolutionResult::failed(
                FailureReason::InvalidType,
                format!("{} cannot be referred to by position", info.plural),
            ));
        }

        let found = lookup.find(lookup.typed())?;
        let index = usize::try_from(n).ok().and_then(|n| n.checked_sub(1));
        let Some(c) = index.and_then(|i| found.get(i)) else {
            let failure = ResolutionResult::failed(
                FailureReason::OutOfRange,
                format!(
                    "there is no {} {n}{}; found {}",
                    lookup.noun(),
                    lookup.within_text(),
                    found.len()
                ),
            );
            return Err(if found.is_empty() {
                failure
            } else {
                failure.with_suggestion(format!("choose a number from 1 to {}", found.len()))
            });
        };

        let (display_name, method) = match lookup.reference.type_hint() {
            Some(hint) => (
                numbered_name(hint, n, c.span),
                ResolutionMethod::TypeAndOrdinal,
            ),
            None => (c.display_name(), ResolutionMethod::Ordinal),
        };
        Ok(Some(lookup.resolved(
            lookup.bind_as(c, display_name),
            EXACT,
            method,
        )))
    }

    fn relative(&self, lookup: &Lookup<'_>, _: &mut Pending) -> Step {
        let Some(position) = lookup.reference.mention().relative else {
            return Ok(None);
        };
        let info = lookup.kind.info();
        if !info.supports_relative {
            return Err(ResolutionResult::failed(
                FailureReason::InvalidType,
                format!("{} have no order to move through", info.plural),
            ));
        }

        let found = lookup.find(lookup.typed())?;
        if found.is_empty() {
            return Err(lookup.not_found(Vec::new()));
        }

        let (picked, anchor) = if position.needs_playhead() {
            match (lookup.ctx.playhead_bar, lookup.focus_index(&found)) {
                (Some(bar), _) => (by_bar(&found, position, bar), format!("bar {bar}")),
                (None, Some(i)) => (
                    by_index(&found, position, i),
                    found[i].display_name(),
                ),
                (None, None) => {
                    tracing::warn!(position = position.as_str(), "no playhead or focus");
                    return Err(ResolutionResult::failed(
                        FailureReason::NoSelection,
                        format!(
                            "'{}' needs a playhead position or a focused {}",
                            lookup.reference,
                            lookup.noun()
                        ),
                    )
                    .with_suggestion("move the playhead or select something first"));
                }
            }
        } else {
            let picked = match position {
                RelativePosition::Last => found.last(),
                _ => found.first(),
            };
            (picked, String::new())
        };

        match picked {
            Some(c) => Ok(Some(lookup.resolved(
                lookup.bind(c),
                EXACT,
                ResolutionMethod::RelativePosition,
            ))),
            None => Err(ResolutionResult::failed(
                FailureReason::OutOfRange,
                format!(
                    "there is no {} {} relative to {anchor}",
                    position.as_str(),
                    lookup.noun()
                ),
            )),
        }
    }

    fn explicit_range(&self, lookup: &Lookup<'_>, _: &mut Pending) -> Step {
        let UnresolvedRef::Range {
            bars: Some(span), ..
        } = lookup.reference
        else {
            return Ok(None);
        };
        if let Some(length) = lookup.store.length_bars() {
            if span.end() > length {
                return Err(ResolutionResult::failed(
                    FailureReason::OutOfRange,
                    format!("the song ends at bar {length}; {span} is out of range"),
                )
                .with_suggestion(format!("choose bars between 1 and {length}")));
            }
        }
        if let Some(outer) = lookup.container {
            if outer.span.is_some_and(|o| !o.covers(span)) {
                return Err(ResolutionResult::failed(
                    FailureReason::OutOfRange,
                    format!("{span} lies outside {}", outer.display_name),
                ));
            }
        }
        let binding = lookup.range_binding(*span)?;
        Ok(Some(lookup.resolved(
            binding,
            EXACT,
            ResolutionMethod::ExplicitRange,
        )))
    }

    fn event_selector(&self, lookup: &Lookup<'_>, _: &mut Pending) -> Step {
        let UnresolvedRef::Events {
            selector: Some(selector),
            ..
        } = lookup.reference
        else {
            return Ok(None);
        };
        if lookup.reference.mention().deixis.is_some() {
            return Ok(None);
        }
        self.check_selector(selector)?;
        Ok(Some(lookup.resolved(
            lookup.events_binding(selector.clone()),
            EXACT,
            ResolutionMethod::EventSelector,
        )))
    }

    fn deictic(&self, lookup: &Lookup<'_>, _: &mut Pending) -> Step {
        if lookup.reference.mention().deixis != Some(Deixis::Deictic) {
            return Ok(None);
        }
        let selection = match &lookup.ctx.selection {
            Some(selection) if !selection.is_empty() => selection,
            _ => {
                tracing::warn!("deictic reference without a selection");
                return Err(ResolutionResult::failed(
                    FailureReason::NoSelection,
                    format!(
                        "'{}' points at the selection, but nothing is selected",
                        lookup.reference
                    ),
                )
                .with_suggestion(format!("select the {} first", lookup.noun())));
            }
        };
        if selection.stale {
            tracing::warn!("deictic reference against a stale selection");
            return Err(ResolutionResult::failed(
                FailureReason::StaleSelection,
                "the selection no longer matches the project",
            )
            .with_suggestion("select again"));
        }

        if lookup.kind == EntityKind::Event {
            if selection.events.is_empty() {
                return Err(ResolutionResult::failed(
                    FailureReason::TypeMismatch,
                    "the selection holds no events",
                ));
            }
            let selector = self.narrowed(
                lookup,
                Selector::events(selection.events.iter().cloned()),
            )?;
            return Ok(Some(lookup.resolved(
                lookup.events_binding(selector),
                EXACT,
                ResolutionMethod::Deictic,
            )));
        }

        let selected: Vec<&Identifier> = selection
            .items
            .iter()
            .filter(|id| EntityKind::from_category(id.category()) == Some(lookup.kind))
            .collect();
        if selected.is_empty() {
            return Err(ResolutionResult::failed(
                FailureReason::TypeMismatch,
                format!("the selection holds no {}", lookup.kind.info().plural),
            ));
        }

        let mut found = Vec::new();
        for id in selected {
            found.extend(lookup.find(Matcher::Id(id.clone()))?);
        }
        match found.len() {
            0 => Err(ResolutionResult::failed(
                FailureReason::NotFound,
                format!(
                    "the selected {} is not{}",
                    lookup.kind.info().display_name,
                    lookup.within_text()
                ),
            )),
            1 => Ok(Some(lookup.resolved(
                lookup.bind(&found[0]),
                EXACT,
                ResolutionMethod::Deictic,
            ))),
            _ => Ok(Some(lookup.ambiguous(found))),
        }
    }

    fn anaphoric(&self, lookup: &Lookup<'_>, _: &mut Pending) -> Step {
        if lookup.reference.mention().deixis != Some(Deixis::Anaphoric) {
            return Ok(None);
        }
        if lookup.ctx.discourse.is_empty() {
            tracing::warn!("anaphoric reference without discourse history");
            return Err(ResolutionResult::failed(
                FailureReason::NoDiscourse,
                format!(
                    "nothing has been mentioned yet for '{}' to refer to",
                    lookup.reference
                ),
            ));
        }

        let same_kind = lookup
            .ctx
            .discourse
            .iter()
            .filter(|r| r.kind() == Some(lookup.kind));
        for referent in same_kind {
            match referent {
                Referent::Events { ids } => {
                    let selector = self.narrowed(lookup, Selector::events(ids.iter().cloned()))?;
                    return Ok(Some(lookup.resolved(
                        lookup.events_binding(selector),
                        ANAPHORIC,
                        ResolutionMethod::Anaphoric,
                    )));
                }
                Referent::Entity { id } => {
                    let found = lookup.find(Matcher::Id(id.clone()))?;
                    if let Some(c) = found.iter().find(|c| lookup.has_hinted_type(c)) {
                        return Ok(Some(lookup.resolved(
                            lookup.bind(c),
                            ANAPHORIC,
                            ResolutionMethod::Anaphoric,
                        )));
                    }
                }
            }
        }

        Err(ResolutionResult::failed(
            FailureReason::NoDiscourse,
            format!(
                "no {} has been mentioned{}",
                lookup.noun(),
                lookup.within_text()
            ),
        ))
    }

    fn salience(&self, lookup: &Lookup<'_>, pending: &mut Pending) -> Step {
        if lookup.reference.mention().name.is_some()
            || matches!(lookup.kind, EntityKind::Event | EntityKind::Range)
        {
            return Ok(None);
        }
        let found = lookup.find(lookup.typed())?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(Some(lookup.resolved(
                lookup.bind(&found[0]),
                SOLE_CANDIDATE,
                ResolutionMethod::Salience,
            ))),
            _ => {
                let (scored, signal) = self.score_salience(lookup, found);
                if signal {
                    Ok(Some(self.decide(lookup, scored, ResolutionMethod::Salience)))
                } else {
                    tracing::debug!(candidates = scored.len(), "no salience signal");
                    pending.ambiguity = Some(lookup.ambiguous(scored));
                    Ok(None)
                }
            }
        }
    }

    fn fuzzy(&self, lookup: &Lookup<'_>, pending: &mut Pending) -> Step {
        let Some(name) = &lookup.reference.mention().name else {
            return Ok(None);
        };
        let mut found = lookup.find(Matcher::Fuzzy(name.clone()))?;
        found.sort_by(by_score);

        if found
            .first()
            .is_some_and(|c| c.confidence + EPSILON >= self.config.fuzzy_threshold)
        {
            return Ok(Some(self.decide(lookup, found, ResolutionMethod::FuzzyName)));
        }

        pending.near_matches = found
            .iter()
            .filter(|c| c.confidence > 0.0)
            .take(self.config.near_match_limit)
            .map(|c| NearMatch {
                id: c.id.clone(),
                display_name: c.display_name(),
                score: c.confidence,
            })
            .collect();
        Ok(None)
    }

    fn system_default(&self, lookup: &Lookup<'_>, _: &mut Pending) -> Step {
        if !lookup.reference.is_bare() {
            return Ok(None);
        }
        let binding = match self.config.defaults.rule_for(lookup.kind) {
            DefaultRule::Ask => None,
            DefaultRule::First => lookup.find(Matcher::Any)?.first().map(|c| lookup.bind(c)),
            DefaultRule::Last => lookup.find(Matcher::Any)?.last().map(|c| lookup.bind(c)),
            DefaultRule::Named(name) => lookup
                .find(Matcher::Name(name))?
                .first()
                .map(|c| lookup.bind(c)),
            DefaultRule::WholeSong if lookup.kind == EntityKind::Range => {
                let span = lookup.container.and_then(|c| c.span).or_else(|| {
                    lookup
                        .store
                        .length_bars()
                        .and_then(|n| BarSpan::new(1, n).ok())
                });
                match span {
                    Some(span) => Some(lookup.range_binding(span)?),
                    None => None,
                }
            }
            DefaultRule::AllEvents if lookup.kind == EntityKind::Event => {
                Some(lookup.events_binding(Selector::All))
            }
            DefaultRule::WholeSong | DefaultRule::AllEvents => None,
        };

        Ok(binding.map(|b| {
            lookup.resolved(
                b,
                self.config.default_confidence,
                ResolutionMethod::SystemDefault,
            )
        }))
    }

    /// Replace candidate confidence with a salience score
    ///
    /// The flag is true when any candidate scored above the base weight.
    #[allow(clippy::cast_precision_loss)]
    fn score_salience(&self, lookup: &Lookup<'_>, candidates: Vec<Candidate>) -> (Vec<Candidate>, bool) {
        let weights = &self.config.salience;
        let ctx = lookup.ctx;
        let mut signal = false;
        let scored = candidates
            .into_iter()
            .map(|c| {
                let mut score = weights.base;
                if ctx.prior_focus.as_ref() == Some(&c.id) {
                    score += weights.focus;
                }
                if let Some(recency) = ctx.recency_of(&c.id) {
                    score += weights.discourse / (1.0 + recency as f64);
                }
                if let (Some(bar), Some(span)) = (ctx.playhead_bar, c.span) {
                    if span.contains(bar) {
                        score += weights.playhead;
                    }
                }
                signal |= score > weights.base + EPSILON;
                c.with_confidence(score.min(1.0))
            })
            .collect();
        (scored, signal)
    }

    /// Apply the ambiguity gap to scored candidates
    fn decide(
        &self,
        lookup: &Lookup<'_>,
        mut scored: Vec<Candidate>,
        method: ResolutionMethod,
    ) -> ResolutionResult {
        scored.sort_by(by_score);
        let Some(top) = scored.first().map(|c| c.confidence) else {
            return lookup.not_found(Vec::new());
        };
        let gap = self.config.ambiguity_gap;
        let mut competing: Vec<Candidate> = scored
            .into_iter()
            .take_while(|c| top - c.confidence < gap - EPSILON)
            .collect();

        if competing.len() == 1 {
            let winner = competing.remove(0);
            lookup.resolved(lookup.bind(&winner), top, method)
        } else {
            lookup.ambiguous(competing)
        }
    }

    fn check_selector(&self, selector: &Selector) -> Result<(), ResolutionResult> {
        let errors: Vec<String> = validate_with_limit(selector, self.config.max_selector_depth)
            .iter()
            .filter(|e| ValidationError::is_error(e))
            .map(ToString::to_string)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ResolutionResult::failed(
                FailureReason::InvalidType,
                format!("invalid event selector: {}", errors.join("; ")),
            ))
        }
    }

    /// Intersect a deictic or anaphoric event set with the spoken selector
    fn narrowed(&self, lookup: &Lookup<'_>, events: Selector) -> Result<Selector, ResolutionResult> {
        match lookup.reference {
            UnresolvedRef::Events {
                selector: Some(spoken),
                ..
            } => {
                self.check_selector(spoken)?;
                Ok(events.and(spoken.clone()))
            }
            _ => Ok(events),
        }
    }
}

/// One reference being resolved, with everything the steps read
struct Lookup<'a> {
    reference: &'a UnresolvedRef,
    kind: EntityKind,
    store: &'a dyn ProjectStore,
    ctx: &'a InteractionContext,
    container: Option<&'a ResolvedRef>,
}

impl Lookup<'_> {
    /// Query the store, honoring the container
    ///
    /// Ranges are not store containers; for them candidates are kept when the
    /// range covers their span.
    fn find(&self, matcher: Matcher) -> Result<Vec<Candidate>, ResolutionResult> {
        let scoped = self
            .container
            .filter(|c| c.kind != EntityKind::Range)
            .map(|c| c.id.clone());
        let query = EntityQuery::new(self.kind, matcher).within(scoped);
        let mut found = self.store.find(&query).map_err(store_failure)?;
        if let Some(ResolvedRef {
            kind: EntityKind::Range,
            span: Some(outer),
            ..
        }) = self.container
        {
            found.retain(|c| c.span.is_some_and(|inner| outer.covers(&inner)));
        }
        found.sort_by_key(|c| c.order);
        Ok(found)
    }

    fn typed(&self) -> Matcher {
        self.reference
            .type_hint()
            .map_or(Matcher::Any, |hint| Matcher::Type(hint.to_string()))
    }

    /// Word for what is being looked for ("chorus", "layer")
    fn noun(&self) -> &str {
        self.reference
            .type_hint()
            .unwrap_or(self.kind.info().display_name)
    }

    fn within_text(&self) -> String {
        self.container
            .map(|c| format!(" in {}", c.display_name))
            .unwrap_or_default()
    }

    fn has_hinted_type(&self, c: &Candidate) -> bool {
        self.reference.type_hint().map_or(true, |hint| {
            c.type_tag
                .as_deref()
                .is_some_and(|tag| tag.eq_ignore_ascii_case(hint))
        })
    }

    fn focus_index(&self, found: &[Candidate]) -> Option<usize> {
        let focus = self.ctx.prior_focus.as_ref()?;
        found.iter().position(|c| &c.id == focus)
    }

    fn bind(&self, c: &Candidate) -> Binding {
        self.bind_as(c, c.display_name())
    }

    fn bind_as(&self, c: &Candidate, display_name: String) -> Binding {
        if self.kind == EntityKind::Event {
            if let Ok(id) = EventId::try_from(c.id.clone()) {
                return Binding::Events(ResolvedEvents {
                    selector: Selector::events([id]),
                    display_name,
                });
            }
        }
        Binding::Entity(ResolvedRef {
            kind: c.kind,
            id: c.id.clone(),
            display_name,
            span: c.span,
            container: self.container.map(|r| r.id.clone()),
        })
    }

    /// Events binding restricted to the container
    fn events_binding(&self, selector: Selector) -> Binding {
        let selector = match (self.container.and_then(container_selector), selector) {
            (Some(outer), Selector::All) => outer,
            (Some(outer), inner) => outer.and(inner),
            (None, inner) => inner,
        };
        Binding::Events(ResolvedEvents::from_selector(selector))
    }

    fn range_binding(&self, span: BarSpan) -> Result<Binding, ResolutionResult> {
        let id = Identifier::make(
            Category::Range,
            [format!("bars-{}-{}", span.start(), span.end())],
        )
        .map_err(|e| ResolutionResult::failed(FailureReason::InvalidType, e.to_string()))?;
        Ok(Binding::Entity(ResolvedRef {
            kind: EntityKind::Range,
            id,
            display_name: span.to_string(),
            span: Some(span),
            container: self.container.map(|r| r.id.clone()),
        }))
    }

    fn resolved(
        &self,
        binding: Binding,
        confidence: f64,
        method: ResolutionMethod,
    ) -> ResolutionResult {
        let explanation = format!("'{}' → {}", self.reference, binding.display_name());
        ResolutionResult::Resolved {
            binding,
            confidence,
            method,
            explanation,
        }
    }

    fn ambiguous(&self, competing: Vec<Candidate>) -> ResolutionResult {
        let suggested_default = match competing.as_slice() {
            [first, second, ..] if first.confidence > second.confidence + EPSILON => {
                Some(first.id.clone())
            }
            _ => None,
        };
        let names: Vec<String> = competing.iter().map(Candidate::display_name).collect();
        let question = format!("Which {} do you mean: {}?", self.noun(), choices(&names));
        let candidates = competing
            .iter()
            .map(|c| ScoredBinding {
                binding: self.bind(c),
                confidence: c.confidence,
            })
            .collect();
        ResolutionResult::Ambiguous {
            candidates,
            question,
            suggested_default,
        }
    }

    fn not_found(&self, near_matches: Vec<NearMatch>) -> ResolutionResult {
        let message = match &self.reference.mention().name {
            Some(name) => format!("no {} named '{name}'{}", self.noun(), self.within_text()),
            None => format!(
                "no {} matches '{}'{}",
                self.noun(),
                self.reference,
                self.within_text()
            ),
        };
        let suggestion = near_matches
            .first()
            .map(|m| format!("did you mean {}?", m.display_name));
        let failure = ResolutionResult::failed(FailureReason::NotFound, message)
            .with_near_matches(near_matches);
        match suggestion {
            Some(text) => failure.with_suggestion(text),
            None => failure,
        }
    }
}

fn store_failure(err: StoreError) -> ResolutionResult {
    tracing::warn!(error = %err, "project lookup failed");
    match err {
        StoreError::AccessDenied(id) => ResolutionResult::failed(
            FailureReason::AccessDenied,
            format!("'{id}' is not accessible"),
        ),
        StoreError::Backend(detail) => ResolutionResult::failed(
            FailureReason::NotFound,
            format!("the project could not be searched: {detail}"),
        )
        .with_suggestion("try again once the project store is reachable"),
    }
}

fn container_selector(container: &ResolvedRef) -> Option<Selector> {
    match container.kind {
        EntityKind::Layer => container.as_layer().map(Selector::layer),
        EntityKind::Section => container.as_section().map(Selector::section),
        _ => container.span.map(|span| span.to_selector()),
    }
}

fn by_score(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then(a.order.cmp(&b.order))
}

fn by_bar(found: &[Candidate], position: RelativePosition, bar: u32) -> Option<&Candidate> {
    match position {
        RelativePosition::Next => found
            .iter()
            .find(|c| c.span.is_some_and(|s| s.start() > bar)),
        RelativePosition::Previous => found
            .iter()
            .rev()
            .find(|c| c.span.is_some_and(|s| s.end() < bar)),
        RelativePosition::Current => found
            .iter()
            .find(|c| c.span.is_some_and(|s| s.contains(bar))),
        RelativePosition::First => found.first(),
        RelativePosition::Last => found.last(),
    }
}

fn by_index(found: &[Candidate], position: RelativePosition, index: usize) -> Option<&Candidate> {
    match position {
        RelativePosition::Next => found.get(index + 1),
        RelativePosition::Previous => index.checked_sub(1).and_then(|i| found.get(i)),
        RelativePosition::Current => found.get(index),
        RelativePosition::First => found.first(),
        RelativePosition::Last => found.last(),
    }
}

/// "Chorus 2 (bars 49–65)"
fn numbered_name(type_hint: &str, n: u32, span: Option<BarSpan>) -> String {
    let mut chars = type_hint.chars();
    let title: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    match span {
        Some(span) => format!("{title} {n} ({span})"),
        None => format!("{title} {n}"),
    }
}

/// "A or B", "A, B or C"
fn choices(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}

fn log_outcome(result: &ResolutionResult) {
    match result {
        ResolutionResult::Resolved {
            binding,
            confidence,
            method,
            ..
        } => tracing::info!(%method, confidence, binding = %binding, "resolved"),
        ResolutionResult::Ambiguous { candidates, .. } => {
            tracing::info!(candidates = candidates.len(), "ambiguous");
        }
        ResolutionResult::Failed {
            reason, message, ..
        } => tracing::info!(%reason, detail = %message, "resolution failed"),
    }
}

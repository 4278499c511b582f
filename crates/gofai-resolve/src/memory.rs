//! In-memory project
//!
//! A [`ProjectStore`] and [`EventSource`] over plain data, loadable from JSON
//! or YAML fixtures. Entities keep insertion order; time-based entities are
//! additionally ordered by their first bar.

use gofai_entity::{BarSpan, EntityKind};
use gofai_ident::Identifier;
use gofai_select::{Event, EventSource};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::ResolveError;
use crate::store::{Candidate, EntityQuery, Matcher, ProjectStore, StoreError};

/// One entity in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Identifier; its category decides the entity kind
    pub id: Identifier,
    /// Display name
    pub name: String,
    /// Type tag ("chorus", "reverb")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    /// Bars covered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<BarSpan>,
    /// Direct containers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Identifier>,
    /// Hidden from name and type lookups; id lookups are denied
    #[serde(default)]
    pub restricted: bool,
}

impl EntityRecord {
    /// Record with just an id and name
    #[must_use]
    pub fn new(id: Identifier, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            type_tag: None,
            span: None,
            containers: Vec::new(),
            restricted: false,
        }
    }

    /// With type tag
    #[must_use]
    pub fn with_type(mut self, type_tag: impl Into<String>) -> Self {
        self.type_tag = Some(type_tag.into());
        self
    }

    /// With bar span
    #[must_use]
    pub fn with_span(mut self, span: BarSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Add a direct container
    #[must_use]
    pub fn within(mut self, container: Identifier) -> Self {
        self.containers.push(container);
        self
    }

    /// Mark as restricted
    #[must_use]
    pub fn restricted(mut self) -> Self {
        self.restricted = true;
        self
    }
}

/// Serialized project layout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectData {
    /// Song length in bars
    #[serde(default)]
    pub length_bars: Option<u32>,
    /// Entities, in project order
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    /// Musical events
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone)]
struct Entry {
    kind: EntityKind,
    order: usize,
    record: EntityRecord,
}

/// In-memory project store
#[derive(Debug, Clone, Default)]
pub struct MemoryProject {
    length_bars: Option<u32>,
    entities: IndexMap<Identifier, Entry>,
    events: Vec<Event>,
}

impl MemoryProject {
    /// Build from plain data
    ///
    /// # Errors
    /// Fails when a record id is not an entity category or is duplicated.
    pub fn from_data(data: ProjectData) -> Result<Self, ResolveError> {
        let mut entities: IndexMap<Identifier, Entry> = IndexMap::with_capacity(data.entities.len());
        for record in data.entities {
            let kind = EntityKind::from_category(record.id.category())
                .ok_or_else(|| ResolveError::NotAnEntity(record.id.to_string()))?;
            if entities.contains_key(&record.id) {
                return Err(ResolveError::DuplicateEntity(record.id.to_string()));
            }
            entities.insert(
                record.id.clone(),
                Entry {
                    kind,
                    order: 0,
                    record,
                },
            );
        }

        let mut project = Self {
            length_bars: data.length_bars,
            entities,
            events: data.events,
        };
        project.renumber();
        debug!(
            entities = project.entities.len(),
            events = project.events.len(),
            "loaded project"
        );
        Ok(project)
    }

    /// Parse a JSON project
    ///
    /// # Errors
    /// Fails on malformed JSON or invalid records.
    pub fn from_json_str(s: &str) -> Result<Self, ResolveError> {
        Self::from_data(serde_json::from_str(s)?)
    }

    /// Parse a YAML project
    ///
    /// # Errors
    /// Fails on malformed YAML or invalid records.
    pub fn from_yaml_str(s: &str) -> Result<Self, ResolveError> {
        Self::from_data(serde_yaml::from_str(s)?)
    }

    /// Plain-data view
    #[must_use]
    pub fn to_data(&self) -> ProjectData {
        ProjectData {
            length_bars: self.length_bars,
            entities: self.entities.values().map(|e| e.record.clone()).collect(),
            events: self.events.clone(),
        }
    }

    /// Number of entities
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Record for `id`
    #[must_use]
    pub fn entity(&self, id: &Identifier) -> Option<&EntityRecord> {
        self.entities.get(id).map(|e| &e.record)
    }

    /// Assign per-kind order: by first bar when spans exist, otherwise insertion order
    fn renumber(&mut self) {
        for kind in EntityKind::ALL {
            let mut ids: Vec<(Option<u32>, usize, Identifier)> = self
                .entities
                .iter()
                .enumerate()
                .filter(|(_, (_, e))| e.kind == kind)
                .map(|(i, (id, e))| (e.record.span.map(|s| s.start()), i, id.clone()))
                .collect();
            ids.sort();
            for (order, (_, _, id)) in ids.into_iter().enumerate() {
                if let Some(entry) = self.entities.get_mut(&id) {
                    entry.order = order;
                }
            }
        }
    }

    fn entity_candidates(&self, query: &EntityQuery) -> Result<Vec<Candidate>, StoreError> {
        if let Matcher::Id(id) = &query.matcher {
            return match self.entities.get(id) {
                Some(e) if e.kind != query.kind => Ok(Vec::new()),
                Some(e) if e.record.restricted => Err(StoreError::AccessDenied(id.to_string())),
                Some(e) if self.in_container(&e.record.containers, query) => {
                    Ok(vec![Self::candidate(e, 1.0)])
                }
                _ => Ok(Vec::new()),
            };
        }

        let mut out: Vec<Candidate> = self
            .entities
            .values()
            .filter(|e| e.kind == query.kind && !e.record.restricted)
            .filter(|e| self.in_container(&e.record.containers, query))
            .filter_map(|e| {
                let r = &e.record;
                let score = match &query.matcher {
                    Matcher::Name(name) => r.name.eq_ignore_ascii_case(name).then_some(1.0),
                    Matcher::Type(t) => r
                        .type_tag
                        .as_deref()
                        .is_some_and(|tag| tag.eq_ignore_ascii_case(t))
                        .then_some(1.0),
                    Matcher::Fuzzy(text) => Some(similarity(text, &r.name)),
                    Matcher::Any => Some(1.0),
                    Matcher::Id(_) => None,
                };
                score.map(|s| Self::candidate(e, s))
            })
            .collect();
        out.sort_by_key(|c| c.order);
        Ok(out)
    }

    fn event_candidates(&self, query: &EntityQuery) -> Vec<Candidate> {
        let mut ordered: Vec<&Event> = self.events.iter().collect();
        ordered.sort_by(|a, b| a.canonical_cmp(b));

        ordered
            .into_iter()
            .enumerate()
            .filter_map(|(order, ev)| {
                let mut containers: Vec<Identifier> = vec![ev.layer.as_identifier().clone()];
                if let Some(section) = &ev.section {
                    containers.push(section.as_identifier().clone());
                }
                if !self.in_container(&containers, query) {
                    return None;
                }
                let id = ev.id.as_identifier();
                let name = id.leaf().to_string();
                let score = match &query.matcher {
                    Matcher::Id(want) => (want == id).then_some(1.0),
                    Matcher::Name(n) => name.eq_ignore_ascii_case(n).then_some(1.0),
                    Matcher::Type(t) => ev.kind.as_str().eq_ignore_ascii_case(t).then_some(1.0),
                    Matcher::Fuzzy(text) => Some(similarity(text, &name)),
                    Matcher::Any => Some(1.0),
                }?;
                Some(Candidate {
                    id: id.clone(),
                    kind: EntityKind::Event,
                    name,
                    type_tag: Some(ev.kind.as_str().to_string()),
                    span: BarSpan::bar(ev.bar).ok(),
                    order,
                    containers,
                    confidence: score,
                })
            })
            .collect()
    }

    /// True when the queried container holds `direct` or any of its ancestors
    fn in_container(&self, direct: &[Identifier], query: &EntityQuery) -> bool {
        let Some(wanted) = query.container.as_ref() else {
            return true;
        };
        let mut seen: HashSet<&Identifier> = HashSet::new();
        let mut pending: Vec<&Identifier> = direct.iter().collect();
        while let Some(id) = pending.pop() {
            if id == wanted {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(entry) = self.entities.get(id) {
                pending.extend(entry.record.containers.iter());
            }
        }
        false
    }

    fn candidate(entry: &Entry, confidence: f64) -> Candidate {
        let r = &entry.record;
        Candidate {
            id: r.id.clone(),
            kind: entry.kind,
            name: r.name.clone(),
            type_tag: r.type_tag.clone(),
            span: r.span,
            order: entry.order,
            containers: r.containers.clone(),
            confidence,
        }
    }
}

/// Case-insensitive Jaro-Winkler similarity
fn similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(&a.to_lowercase(), &b.to_lowercase())
}

impl ProjectStore for MemoryProject {
    fn find(&self, query: &EntityQuery) -> Result<Vec<Candidate>, StoreError> {
        if query.kind == EntityKind::Event {
            Ok(self.event_candidates(query))
        } else {
            self.entity_candidates(query)
        }
    }

    fn length_bars(&self) -> Option<u32> {
        self.length_bars
    }
}

impl EventSource for MemoryProject {
    fn events(&self) -> &[Event] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gofai_ident::Category;
    use pretty_assertions::assert_eq;

    fn id(category: Category, leaf: &str) -> Identifier {
        Identifier::make(category, [leaf]).unwrap()
    }

    fn project() -> MemoryProject {
        let keys = id(Category::Layer, "keys");
        MemoryProject::from_data(ProjectData {
            length_bars: Some(32),
            entities: vec![
                EntityRecord::new(id(Category::Section, "chorus-b"), "Chorus")
                    .with_type("chorus")
                    .with_span(BarSpan::new(17, 24).unwrap()),
                EntityRecord::new(id(Category::Section, "intro"), "Intro")
                    .with_type("intro")
                    .with_span(BarSpan::new(1, 8).unwrap()),
                EntityRecord::new(keys.clone(), "Keys"),
                EntityRecord::new(id(Category::Card, "reverb"), "Reverb")
                    .with_type("reverb")
                    .within(keys),
                EntityRecord::new(id(Category::Card, "secret"), "Secret").restricted(),
            ],
            events: Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn sections_ordered_by_time() {
        let found = project()
            .find(&EntityQuery::new(EntityKind::Section, Matcher::Any))
            .unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Intro", "Chorus"]);
        assert_eq!(found[1].display_name(), "Chorus (bars 17–24)");
    }

    #[test]
    fn container_filter() {
        let p = project();
        let in_keys = EntityQuery::new(EntityKind::Card, Matcher::Name("reverb".into()))
            .within(Some(id(Category::Layer, "keys")));
        assert_eq!(p.find(&in_keys).unwrap().len(), 1);

        let in_bass = in_keys.within(Some(id(Category::Layer, "bass")));
        assert!(p.find(&in_bass).unwrap().is_empty());
    }

    #[test]
    fn container_filter_follows_ancestors() {
        let board = id(Category::Board, "main");
        let deck = id(Category::Deck, "arrangement");
        let bass = id(Category::Layer, "bass");
        let p = MemoryProject::from_data(ProjectData {
            entities: vec![
                EntityRecord::new(board.clone(), "Main"),
                EntityRecord::new(deck.clone(), "Arrangement").within(board.clone()),
                EntityRecord::new(bass.clone(), "Bass").within(deck.clone()),
                EntityRecord::new(id(Category::Card, "eq"), "EQ").within(bass),
                EntityRecord::new(id(Category::Layer, "loose"), "Loose"),
            ],
            ..ProjectData::default()
        })
        .unwrap();

        let layers = EntityQuery::new(EntityKind::Layer, Matcher::Any).within(Some(board.clone()));
        let names: Vec<String> = p.find(&layers).unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Bass".to_string()]);

        let cards = EntityQuery::new(EntityKind::Card, Matcher::Name("eq".into())).within(Some(deck));
        assert_eq!(p.find(&cards).unwrap().len(), 1);
    }

    #[test]
    fn container_cycle_terminates() {
        let a = id(Category::Deck, "a");
        let b = id(Category::Deck, "b");
        let p = MemoryProject::from_data(ProjectData {
            entities: vec![
                EntityRecord::new(a.clone(), "A").within(b.clone()),
                EntityRecord::new(b.clone(), "B").within(a.clone()),
                EntityRecord::new(id(Category::Layer, "bass"), "Bass").within(a),
            ],
            ..ProjectData::default()
        })
        .unwrap();
        let elsewhere = EntityQuery::new(EntityKind::Layer, Matcher::Any)
            .within(Some(id(Category::Board, "main")));
        assert!(p.find(&elsewhere).unwrap().is_empty());
        let via_cycle = EntityQuery::new(EntityKind::Layer, Matcher::Any).within(Some(b));
        assert_eq!(p.find(&via_cycle).unwrap().len(), 1);
    }

    #[test]
    fn restricted_entities() {
        let p = project();
        let by_id = EntityQuery::new(EntityKind::Card, Matcher::Id(id(Category::Card, "secret")));
        assert_eq!(
            p.find(&by_id).unwrap_err(),
            StoreError::AccessDenied("card:secret".into())
        );
        let by_name = EntityQuery::new(EntityKind::Card, Matcher::Name("Secret".into()));
        assert!(p.find(&by_name).unwrap().is_empty());
    }

    #[test]
    fn fuzzy_scores() {
        let found = project()
            .find(&EntityQuery::new(EntityKind::Layer, Matcher::Fuzzy("kees".into())))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].confidence > 0.8);
    }

    #[test]
    fn rejects_duplicates_and_non_entities() {
        let dup = ProjectData {
            entities: vec![
                EntityRecord::new(id(Category::Layer, "a"), "A"),
                EntityRecord::new(id(Category::Layer, "a"), "A again"),
            ],
            ..ProjectData::default()
        };
        assert!(matches!(
            MemoryProject::from_data(dup),
            Err(ResolveError::DuplicateEntity(_))
        ));

        let lex = ProjectData {
            entities: vec![EntityRecord::new(id(Category::Lex, "bright"), "Bright")],
            ..ProjectData::default()
        };
        assert!(matches!(
            MemoryProject::from_data(lex),
            Err(ResolveError::NotAnEntity(_))
        ));
    }

    #[test]
    fn yaml_fixture() {
        let yaml = "
length_bars: 16
entities:
  - id: layer:bass
    name: Bass
  - id: section:verse-1
    name: Verse 1
    type_tag: verse
    span: { start: 1, end: 8 }
events:
  - id: event:n1
    kind: note
    layer: layer:bass
    bar: 1
    pitch: 36
";
        let p = MemoryProject::from_yaml_str(yaml).unwrap();
        assert_eq!(p.entity_count(), 2);
        assert_eq!(p.events().len(), 1);
        assert_eq!(p.length_bars(), Some(16));
    }
}

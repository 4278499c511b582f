//! Subcommand implementations
//!
//! Each command returns a [`Report`]: the text to print and whether the run
//! counts as a success for the exit code.

use gofai_entity::UnresolvedRef;
use gofai_resolve::{InteractionContext, MemoryProject, Resolver};
use gofai_select::{describe as describe_selector, validate_with_limit, Selection, Selector};
use serde_json::json;

/// Command output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Text for stdout
    pub text: String,
    /// False when the process should exit with status 1
    pub success: bool,
}

impl Report {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
        }
    }
}

/// Describe a selector in words
#[must_use]
pub fn describe(selector: &Selector) -> Report {
    let mut text = describe_selector(selector);
    if selector.requires_context() {
        text.push_str("\n(needs selection or discourse context)");
    }
    Report::ok(text)
}

/// Validate a selector
///
/// Warnings are listed but do not fail the run.
#[must_use]
pub fn validate(selector: &Selector, max_depth: usize) -> Report {
    let findings = validate_with_limit(selector, max_depth);
    if findings.is_empty() {
        return Report::ok(format!("valid: {}", describe_selector(selector)));
    }
    let text = findings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    if findings.iter().any(|f| f.is_error()) {
        Report::failed(text)
    } else {
        Report::ok(text)
    }
}

/// Resolve a reference and print the result as JSON
///
/// # Errors
/// Fails only if the result cannot be serialized.
pub fn resolve(
    resolver: &Resolver,
    project: &MemoryProject,
    reference: &UnresolvedRef,
    ctx: &InteractionContext,
) -> anyhow::Result<Report> {
    let result = resolver.resolve(reference, Some(project), ctx);
    let text = serde_json::to_string_pretty(&result)?;
    Ok(if result.is_resolved() {
        Report::ok(text)
    } else {
        Report::failed(text)
    })
}

/// Evaluate a selector and list the matching events
///
/// An empty match fails the run: the caller should ask for clarification
/// rather than apply an edit to nothing.
///
/// # Errors
/// Fails only if the output cannot be serialized.
pub fn select(
    resolver: &Resolver,
    project: &MemoryProject,
    selector: &Selector,
    ctx: &InteractionContext,
) -> anyhow::Result<Report> {
    match resolver
        .select(selector, project, ctx)
        .and_then(Selection::require_matches)
    {
        Ok(selection) => {
            let events: Vec<&str> = selection.ids().into_iter().map(|id| id.as_str()).collect();
            let body = json!({
                "description": selection.description,
                "events": events,
            });
            Ok(Report::ok(serde_json::to_string_pretty(&body)?))
        }
        Err(err) => Ok(Report::failed(err.to_string())),
    }
}

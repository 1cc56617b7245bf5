//! Search and filtering over in-memory project entities.
//!
//! Pure functions: each takes an already-fetched collection plus a
//! [`SearchFilters`], and produces ranked, highlighted [`SearchResult`]s.
//! Nothing here touches persistence or shared state, so the functions are
//! safely callable concurrently.
//!
//! # Ranking
//!
//! Free-text relevance is cumulative per matched field (see
//! [`scoring`](self)), weighted by field importance: name/title matches
//! count double, descriptions and notes count single, and incidental text
//! such as ticket comments counts half. All non-text filters are pure
//! predicates ANDed with the text predicate. Results sort by score
//! descending with a stable sort, so equal scores keep input order.

mod saved;
mod scoring;

pub use saved::{EntityKind, SavedSearch, SavedSearchStore, SearchHistoryEntry};

use crate::domain::{Deliverable, Milestone, Ticket};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filter criteria for a search. All fields optional; an absent filter means
/// "no constraint", not "must be empty".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    /// Free-text query, matched case-insensitively against type-specific
    /// fields. An empty or whitespace-only query is treated as absent.
    pub query: Option<String>,

    /// Accepted status values.
    pub status: Option<Vec<String>>,

    /// Accepted assignee user ids.
    pub assigned_to: Option<Vec<String>>,

    /// Inclusive lower bound on the item's relevant date field.
    pub date_from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on the item's relevant date field.
    pub date_to: Option<DateTime<Utc>>,

    /// Accepted kind values (deliverables).
    #[serde(rename = "type")]
    pub kind: Option<Vec<String>>,

    /// Accepted priority values (tickets).
    pub priority: Option<Vec<String>>,

    /// Accepted category values (tickets).
    pub category: Option<Vec<String>>,
}

impl SearchFilters {
    /// The free-text query, if it contains anything to match. A query that
    /// is absent, empty, or whitespace-only imposes no text constraint.
    fn active_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    fn date_in_range(&self, date: DateTime<Utc>) -> bool {
        if let Some(from) = self.date_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if date > to {
                return false;
            }
        }
        true
    }
}

/// Membership test for an optional list filter; an absent or empty list
/// accepts everything.
fn list_accepts(filter: Option<&Vec<String>>, value: &str) -> bool {
    match filter {
        Some(list) if !list.is_empty() => list.iter().any(|v| v == value),
        _ => true,
    }
}

/// A per-field match within a search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMatch {
    /// The matched field name (e.g. `name`, `description`, `comment_2`).
    pub field: String,

    /// Context snippet around the first occurrence.
    pub snippet: String,

    /// Full field text with every occurrence wrapped in `<mark>...</mark>`.
    pub highlighted: String,
}

/// A search hit: the item, its relevance score, and its field matches.
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    /// The matched item.
    pub item: T,

    /// Cumulative relevance score; 0 when no query was supplied.
    pub score: u32,

    /// Field-level matches; empty when no query was supplied.
    pub matches: Vec<FieldMatch>,
}

/// Score one field, applying an importance weight expressed as a fraction.
///
/// Returns the weighted score and match entry if the field matched.
fn match_field(
    field: &str,
    text: &str,
    query: &str,
    weight_num: u32,
    weight_div: u32,
) -> Option<(u32, FieldMatch)> {
    let raw = scoring::score(text, query);
    if raw == 0 {
        return None;
    }
    Some((
        raw * weight_num / weight_div,
        FieldMatch {
            field: field.to_string(),
            snippet: scoring::snippet(text, query),
            highlighted: scoring::highlight(text, query),
        },
    ))
}

fn sort_by_score<T>(mut results: Vec<SearchResult<T>>) -> Vec<SearchResult<T>> {
    // Stable sort: equal scores retain relative input order.
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

/// Search milestones by name and description; the relevant date field is the
/// due date.
pub fn search_milestones(
    items: &[Milestone],
    filters: &SearchFilters,
) -> Vec<SearchResult<Milestone>> {
    let query = filters.active_query();
    let mut results: Vec<SearchResult<Milestone>> = items
        .iter()
        .filter(|m| {
            list_accepts(filters.status.as_ref(), m.status.as_str())
                && match filters.assigned_to.as_ref() {
                    Some(ids) if !ids.is_empty() => {
                        m.assigned_to.iter().any(|id| ids.contains(id))
                    }
                    _ => true,
                }
                && filters.date_in_range(m.due_date)
        })
        .map(|m| {
            let mut score = 0;
            let mut matches = Vec::new();
            if let Some(query) = query {
                for (field, text, num) in [
                    ("name", m.name.as_str(), 2),
                    ("description", m.description.as_str(), 1),
                ] {
                    if let Some((s, entry)) = match_field(field, text, query, num, 1) {
                        score += s;
                        matches.push(entry);
                    }
                }
            }
            SearchResult {
                item: m.clone(),
                score,
                matches,
            }
        })
        .collect();

    if query.is_some() {
        results.retain(|r| r.score > 0);
    }
    sort_by_score(results)
}

/// Search deliverables by name, description, and notes; the relevant date
/// field is the due date.
pub fn search_deliverables(
    items: &[Deliverable],
    filters: &SearchFilters,
) -> Vec<SearchResult<Deliverable>> {
    let query = filters.active_query();
    let mut results: Vec<SearchResult<Deliverable>> = items
        .iter()
        .filter(|d| {
            list_accepts(filters.status.as_ref(), &d.status)
                && list_accepts(filters.kind.as_ref(), &d.kind)
                && match (filters.assigned_to.as_ref(), d.assigned_to.as_deref()) {
                    (Some(ids), assignee) if !ids.is_empty() => {
                        assignee.is_some_and(|a| ids.iter().any(|id| id == a))
                    }
                    _ => true,
                }
                && filters.date_in_range(d.due_date)
        })
        .map(|d| {
            let mut score = 0;
            let mut matches = Vec::new();
            if let Some(query) = query {
                if let Some((s, entry)) = match_field("name", &d.name, query, 2, 1) {
                    score += s;
                    matches.push(entry);
                }
                if let Some((s, entry)) = match_field("description", &d.description, query, 1, 1) {
                    score += s;
                    matches.push(entry);
                }
                if let Some(notes) = d.notes.as_deref() {
                    if let Some((s, entry)) = match_field("notes", notes, query, 1, 1) {
                        score += s;
                        matches.push(entry);
                    }
                }
            }
            SearchResult {
                item: d.clone(),
                score,
                matches,
            }
        })
        .collect();

    if query.is_some() {
        results.retain(|r| r.score > 0);
    }
    sort_by_score(results)
}

/// Search tickets by title, description, and every comment body; the
/// relevant date field is the creation date. Comment matches report fields
/// named `comment_{index}` and score at half weight.
pub fn search_tickets(items: &[Ticket], filters: &SearchFilters) -> Vec<SearchResult<Ticket>> {
    let query = filters.active_query();
    let mut results: Vec<SearchResult<Ticket>> = items
        .iter()
        .filter(|t| {
            list_accepts(filters.status.as_ref(), &t.status)
                && list_accepts(filters.priority.as_ref(), &t.priority)
                && list_accepts(filters.category.as_ref(), &t.category)
                && match (filters.assigned_to.as_ref(), t.assigned_to.as_deref()) {
                    (Some(ids), assignee) if !ids.is_empty() => {
                        assignee.is_some_and(|a| ids.iter().any(|id| id == a))
                    }
                    _ => true,
                }
                && filters.date_in_range(t.created_at)
        })
        .map(|t| {
            let mut score = 0;
            let mut matches = Vec::new();
            if let Some(query) = query {
                if let Some((s, entry)) = match_field("title", &t.title, query, 2, 1) {
                    score += s;
                    matches.push(entry);
                }
                if let Some((s, entry)) = match_field("description", &t.description, query, 1, 1) {
                    score += s;
                    matches.push(entry);
                }
                for (index, comment) in t.comments.iter().enumerate() {
                    let field = format!("comment_{index}");
                    if let Some((s, entry)) = match_field(&field, &comment.body, query, 1, 2) {
                        score += s;
                        matches.push(entry);
                    }
                }
            }
            SearchResult {
                item: t.clone(),
                score,
                matches,
            }
        })
        .collect();

    if query.is_some() {
        results.retain(|r| r.score > 0);
    }
    sort_by_score(results)
}

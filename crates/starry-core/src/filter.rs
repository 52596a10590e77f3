//! Client-side filtering of ticket and application lists.
//!
//! Visibility is a pure function of (row, query):
//! - the status filter is "all" or equals the row's status, and
//! - the search text is empty or is a case-insensitive substring of one of
//!   the row's id, user id, thread id or claimer id.
//!
//! Row order is never changed; the server order is what the operator sees.

use std::fmt;

use crate::constants::STATUS_FILTER_ALL;
use crate::models::{Application, Ticket};

/// Status part of a query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(String),
}

impl StatusFilter {
    /// `"all"` (or blank) disables status filtering, anything else must match exactly
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(STATUS_FILTER_ALL) {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }

    pub fn matches(&self, status: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(STATUS_FILTER_ALL),
            Self::Only(status) => f.write_str(status),
        }
    }
}

/// Search text plus status filter. Never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterQuery {
    pub text: String,
    pub status: StatusFilter,
}

impl FilterQuery {
    pub fn new(text: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            text: text.into(),
            status,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, StatusFilter::All)
    }

    pub fn status(status: &str) -> Self {
        Self::new(String::new(), StatusFilter::parse(status))
    }

    /// Search text as matched (input whitespace is not significant)
    pub fn term(&self) -> &str {
        self.text.trim()
    }

    pub fn is_identity(&self) -> bool {
        self.term().is_empty() && self.status == StatusFilter::All
    }
}

/// Rows that can be filtered by [`FilterQuery`]
pub trait Filterable {
    fn status_key(&self) -> &str;

    /// id, user id, thread id, claimer id (empty when absent)
    fn search_fields(&self) -> [&str; 4];
}

impl Filterable for Ticket {
    fn status_key(&self) -> &str {
        self.status.as_str()
    }

    fn search_fields(&self) -> [&str; 4] {
        [
            self.id.as_str(),
            self.user_id.as_str(),
            self.thread_id.as_str(),
            self.claimed_by.as_ref().map(|c| c.as_str()).unwrap_or(""),
        ]
    }
}

impl Filterable for Application {
    fn status_key(&self) -> &str {
        &self.status
    }

    fn search_fields(&self) -> [&str; 4] {
        [
            self.id.as_str(),
            self.user_id.as_str(),
            self.thread_id.as_str(),
            "",
        ]
    }
}

/// Check if text contains a search term (case-insensitive)
pub fn text_contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    if text.len() < term.len() && text.is_ascii() && term.is_ascii() {
        return false;
    }
    text.to_lowercase().contains(&term.to_lowercase())
}

pub fn is_visible<T: Filterable>(row: &T, query: &FilterQuery) -> bool {
    if !query.status.matches(row.status_key()) {
        return false;
    }
    let term = query.term();
    term.is_empty()
        || row
            .search_fields()
            .iter()
            .any(|field| text_contains_term(field, term))
}

/// Visible subset of `rows`, in collection order
pub fn visible_rows<'a, T: Filterable>(rows: &'a [T], query: &FilterQuery) -> Vec<&'a T> {
    rows.iter().filter(|row| is_visible(*row, query)).collect()
}

/// Something a filtered list is drawn into.
pub trait RenderTarget<T> {
    /// Replace everything currently shown with `rows`
    fn replace_rows(&mut self, rows: Vec<T>);
}

/// Plain in-memory render target
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedList<T> {
    rows: Vec<T>,
}

impl<T> RenderedList<T> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T> Default for RenderedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RenderTarget<T> for RenderedList<T> {
    fn replace_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
    }
}

/// Filter `rows` and fully replace the target's contents with the result.
/// Returns how many rows are visible.
pub fn render_into<T, R>(target: &mut R, rows: &[T], query: &FilterQuery) -> usize
where
    T: Filterable + Clone,
    R: RenderTarget<T>,
{
    let visible: Vec<T> = visible_rows(rows, query).into_iter().cloned().collect();
    let count = visible.len();
    target.replace_rows(visible);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordId, TicketStatus};

    fn ticket(id: &str, status: TicketStatus) -> Ticket {
        Ticket {
            id: RecordId::from(id),
            user_id: RecordId::from(format!("u{}", id).as_str()),
            thread_id: RecordId::from(format!("t{}", id).as_str()),
            status,
            claimed_by: None,
            rating: None,
            created_at: None,
            closed_at: None,
        }
    }

    fn sample() -> Vec<Ticket> {
        vec![
            ticket("1", TicketStatus::Open),
            ticket("2", TicketStatus::Closed),
        ]
    }

    fn ids(rows: &[&Ticket]) -> Vec<String> {
        rows.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn test_text_contains_term() {
        assert!(text_contains_term("ab12", "AB"));
        assert!(text_contains_term("Hello World", "lo wo"));
        assert!(!text_contains_term("Hello", "xyz"));
        assert!(text_contains_term("Hello", ""));
        assert!(!text_contains_term("Hi", "Hello"));
        assert!(text_contains_term("Grüße", "GRÜ"));
    }

    #[test]
    fn test_text_query_scenario() {
        let rows = sample();
        assert_eq!(ids(&visible_rows(&rows, &FilterQuery::text("2"))), vec!["2"]);
    }

    #[test]
    fn test_status_query_scenario() {
        let rows = sample();
        assert_eq!(
            ids(&visible_rows(&rows, &FilterQuery::status("closed"))),
            vec!["2"]
        );
    }

    #[test]
    fn test_identity_query_shows_everything_in_order() {
        let rows = sample();
        let query = FilterQuery::default();
        assert!(query.is_identity());
        let visible = visible_rows(&rows, &query);
        assert_eq!(visible.len(), rows.len());
        assert!(visible.iter().zip(rows.iter()).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_status_filter_implies_equal_status() {
        let mut rows = sample();
        rows.push(ticket("3", TicketStatus::Claimed));
        rows.push(ticket("4", TicketStatus::Open));
        for status in ["open", "claimed", "closed", "bogus"] {
            let query = FilterQuery::status(status);
            for row in visible_rows(&rows, &query) {
                assert_eq!(row.status.as_str(), status);
            }
        }
        assert_eq!(visible_rows(&rows, &FilterQuery::status("open")).len(), 2);
        assert!(visible_rows(&rows, &FilterQuery::status("bogus")).is_empty());
    }

    #[test]
    fn test_case_insensitive_id_match() {
        let rows = vec![ticket("ab12", TicketStatus::Open)];
        assert_eq!(visible_rows(&rows, &FilterQuery::text("AB")).len(), 1);
    }

    #[test]
    fn test_claimed_by_is_searched() {
        let mut claimed = ticket("5", TicketStatus::Claimed);
        claimed.claimed_by = Some(RecordId::from(9911));
        let rows = vec![claimed, ticket("6", TicketStatus::Open)];
        assert_eq!(ids(&visible_rows(&rows, &FilterQuery::text("991"))), vec!["5"]);
    }

    #[test]
    fn test_search_fields_and_status_combine() {
        let rows = sample();
        let query = FilterQuery::new("1", StatusFilter::parse("closed"));
        assert!(visible_rows(&rows, &query).is_empty());
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let rows = sample();
        assert_eq!(ids(&visible_rows(&rows, &FilterQuery::text("  2 "))), vec!["2"]);
        assert_eq!(visible_rows(&rows, &FilterQuery::text("   ")).len(), 2);
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(StatusFilter::parse("ALL"), StatusFilter::All);
        assert_eq!(StatusFilter::parse(""), StatusFilter::All);
        assert_eq!(
            StatusFilter::parse(" open "),
            StatusFilter::Only("open".to_string())
        );
        assert_eq!(StatusFilter::Only("open".into()).to_string(), "open");
    }

    #[test]
    fn test_render_is_idempotent() {
        let rows = sample();
        let query = FilterQuery::text("2");
        let mut target = RenderedList::new();

        assert_eq!(render_into(&mut target, &rows, &query), 1);
        let first = target.clone();
        assert_eq!(render_into(&mut target, &rows, &query), 1);
        assert_eq!(target, first);
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn test_render_replaces_previous_contents() {
        let rows = sample();
        let mut target = RenderedList::new();
        render_into(&mut target, &rows, &FilterQuery::default());
        assert_eq!(target.len(), 2);
        render_into(&mut target, &rows, &FilterQuery::status("open"));
        assert_eq!(target.len(), 1);
        assert_eq!(target.rows()[0].id.as_str(), "1");
    }

    #[test]
    fn test_application_rows_filter_on_free_form_status() {
        let app = Application {
            id: RecordId::from(10),
            user_id: RecordId::from(20),
            thread_id: RecordId::from(30),
            status: "pending".to_string(),
            created_at: None,
            closed_at: None,
        };
        let rows = vec![app];
        assert_eq!(visible_rows(&rows, &FilterQuery::status("pending")).len(), 1);
        assert_eq!(visible_rows(&rows, &FilterQuery::text("30")).len(), 1);
        assert!(visible_rows(&rows, &FilterQuery::text("40")).is_empty());
    }
}

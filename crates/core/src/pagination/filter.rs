//! Resolution of listing/search query parameters into a query plan.

use serde::Deserialize;

use super::cursor::{select_token, Cursor, CursorError};
use super::{clamp_page_size, BoundaryValue, Comparison, SortColumn, SortDirection};
use crate::search::keyword_terms;

/// Raw query parameters shared by the listing and search endpoints.
///
/// Every field is kept as an unparsed string so a malformed value degrades
/// to its default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
    pub count: Option<String>,
    pub next_token: Option<String>,
    #[serde(alias = "prevToken")]
    pub previous_token: Option<String>,
    pub keyword: Option<String>,
}

/// Fully resolved pagination plan for one request.
///
/// The inner query scans from the boundary in `inner_direction` and is
/// limited to `count` rows; the outer query re-sorts those rows in
/// `order_direction`.
#[derive(Debug, Clone)]
pub struct QueryFilter {
    pub order_by: SortColumn,
    pub order_direction: SortDirection,
    pub count: i64,
    pub keyword: Option<String>,
    inner_direction: SortDirection,
    operator: Comparison,
    boundary: Option<BoundaryValue>,
    cursor_error: Option<CursorError>,
}

impl QueryFilter {
    /// Resolve raw parameters. `default_count` is the endpoint's page size.
    pub fn build(params: &ListParams, default_count: i64) -> Self {
        let order_by = SortColumn::parse(params.order_by.as_deref());
        let order_direction = SortDirection::parse(params.order_direction.as_deref());
        let requested = params
            .count
            .as_deref()
            .and_then(|c| c.trim().parse::<i64>().ok());
        let count = clamp_page_size(requested, default_count);

        let token = select_token(params.previous_token.as_deref(), params.next_token.as_deref());
        let (cursor, cursor_error) = match token.map(|t| Cursor::decode_for(t, order_by)) {
            None => (None, None),
            Some(Ok(cursor)) => (Some(cursor), None),
            Some(Err(e)) => (None, Some(e)),
        };

        let mut filter = Self::first_page(order_by, order_direction, count);
        filter.cursor_error = cursor_error;
        if let Some(cursor) = cursor {
            filter = filter.with_cursor(cursor);
        }
        filter.keyword = params.keyword.clone();
        filter
    }

    /// Plan for the first page: no boundary, inner order equals outer order.
    pub fn first_page(order_by: SortColumn, order_direction: SortDirection, count: i64) -> Self {
        Self {
            order_by,
            order_direction,
            count,
            keyword: None,
            inner_direction: order_direction,
            operator: Comparison::beyond(order_direction),
            boundary: None,
            cursor_error: None,
        }
    }

    /// Attach a decoded cursor.
    ///
    /// A "next" cursor keeps scanning in the outer direction past the
    /// boundary. A "previous" cursor must collect the rows immediately
    /// *before* the boundary, so the inner scan runs in the opposite
    /// direction and the operator flips with it.
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.inner_direction = if cursor.is_next {
            self.order_direction
        } else {
            self.order_direction.reversed()
        };
        self.operator = Comparison::beyond(self.inner_direction);
        self.boundary = Some(cursor.boundary);
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn inner_direction(&self) -> SortDirection {
        self.inner_direction
    }

    pub fn operator(&self) -> Comparison {
        self.operator
    }

    /// Boundary value of the decoded cursor, if any.
    pub fn boundary(&self) -> Option<&BoundaryValue> {
        self.boundary.as_ref()
    }

    /// Why a supplied cursor was ignored, if it was.
    pub fn cursor_error(&self) -> Option<&CursorError> {
        self.cursor_error.as_ref()
    }

    /// Search terms that take part in the keyword predicate.
    pub fn keyword_terms(&self) -> Vec<&str> {
        self.keyword.as_deref().map(keyword_terms).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut p = ListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "orderBy" => p.order_by = value,
                "orderDirection" => p.order_direction = value,
                "count" => p.count = value,
                "nextToken" => p.next_token = value,
                "previousToken" => p.previous_token = value,
                "keyword" => p.keyword = value,
                other => panic!("unknown param {other}"),
            }
        }
        p
    }

    fn idiom_token(value: &str, is_next: bool) -> String {
        Cursor::new(BoundaryValue::Idiom(value.into()), is_next).encode()
    }

    #[test]
    fn defaults_without_parameters() {
        let filter = QueryFilter::build(&ListParams::default(), 20);
        assert_eq!(filter.order_by, SortColumn::CreatedAt);
        assert_eq!(filter.order_direction, SortDirection::Desc);
        assert_eq!(filter.count, 20);
        assert!(filter.boundary().is_none());
        assert!(filter.keyword.is_none());
    }

    #[test]
    fn first_page_ascending_by_idiom_has_no_boundary() {
        let filter = QueryFilter::build(&params(&[("orderBy", "idiom"), ("orderDirection", "asc")]), 20);
        assert_eq!(filter.order_by, SortColumn::Idiom);
        assert_eq!(filter.order_direction, SortDirection::Asc);
        assert_eq!(filter.inner_direction(), SortDirection::Asc);
        assert!(filter.boundary().is_none());
    }

    #[test]
    fn unparseable_count_uses_endpoint_default() {
        assert_eq!(QueryFilter::build(&params(&[("count", "lots")]), 10).count, 10);
        assert_eq!(QueryFilter::build(&params(&[("count", "24")]), 10).count, 24);
        assert_eq!(QueryFilter::build(&params(&[]), 24).count, 24);
    }

    #[test]
    fn next_cursor_descending_keeps_direction() {
        let token = idiom_token("m", true);
        let filter = QueryFilter::build(&params(&[("orderBy", "idiom"), ("nextToken", &token)]), 20);
        assert_eq!(filter.inner_direction(), SortDirection::Desc);
        assert_eq!(filter.operator(), Comparison::LessThan);
        assert_eq!(filter.boundary(), Some(&BoundaryValue::Idiom("m".into())));
    }

    #[test]
    fn next_cursor_ascending_keeps_direction() {
        let token = idiom_token("m", true);
        let filter = QueryFilter::build(
            &params(&[("orderBy", "idiom"), ("orderDirection", "asc"), ("nextToken", &token)]),
            20,
        );
        assert_eq!(filter.inner_direction(), SortDirection::Asc);
        assert_eq!(filter.operator(), Comparison::GreaterThan);
    }

    #[test]
    fn previous_cursor_descending_reverses_inner_scan() {
        let token = idiom_token("m", false);
        let filter = QueryFilter::build(
            &params(&[("orderBy", "idiom"), ("orderDirection", "desc"), ("previousToken", &token)]),
            20,
        );
        assert_eq!(filter.order_direction, SortDirection::Desc);
        assert_eq!(filter.inner_direction(), SortDirection::Asc);
        assert_eq!(filter.operator(), Comparison::GreaterThan);
    }

    #[test]
    fn previous_cursor_ascending_reverses_inner_scan() {
        let token = idiom_token("m", false);
        let filter = QueryFilter::build(
            &params(&[("orderBy", "idiom"), ("orderDirection", "asc"), ("previousToken", &token)]),
            20,
        );
        assert_eq!(filter.inner_direction(), SortDirection::Desc);
        assert_eq!(filter.operator(), Comparison::LessThan);
    }

    #[test]
    fn previous_token_wins_over_next_token() {
        let previous = idiom_token("p", false);
        let next = idiom_token("n", true);
        let filter = QueryFilter::build(
            &params(&[("orderBy", "idiom"), ("previousToken", &previous), ("nextToken", &next)]),
            20,
        );
        assert_eq!(filter.boundary(), Some(&BoundaryValue::Idiom("p".into())));
        assert_eq!(filter.inner_direction(), SortDirection::Asc);
    }

    #[test]
    fn malformed_token_degrades_to_first_page() {
        let filter = QueryFilter::build(&params(&[("nextToken", "not-a-token!")]), 20);
        assert!(filter.boundary().is_none());
        assert_eq!(filter.inner_direction(), filter.order_direction);
        assert_matches!(filter.cursor_error(), Some(CursorError::InvalidBase64));
    }

    #[test]
    fn cloned_filter_keeps_cursor_error() {
        let filter = QueryFilter::build(&params(&[("previousToken", "%%%")]), 20);
        let copy = filter.clone();
        assert_eq!(copy.cursor_error(), filter.cursor_error());
        assert_matches!(copy.cursor_error(), Some(CursorError::InvalidBase64));
    }

    #[test]
    fn token_for_other_sort_column_is_ignored() {
        let token = idiom_token("m", true);
        let filter = QueryFilter::build(&params(&[("orderBy", "createdAt"), ("nextToken", &token)]), 20);
        assert!(filter.boundary().is_none());
        assert_matches!(filter.cursor_error(), Some(CursorError::ColumnMismatch));
    }

    #[test]
    fn created_at_cursor_is_accepted_for_default_column() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let token = Cursor::new(BoundaryValue::CreatedAt(at), true).encode();
        let filter = QueryFilter::build(&params(&[("nextToken", &token)]), 20);
        assert_eq!(filter.boundary(), Some(&BoundaryValue::CreatedAt(at)));
        assert_eq!(filter.operator(), Comparison::LessThan);
    }

    #[test]
    fn keyword_is_attached_verbatim() {
        let filter = QueryFilter::build(&params(&[("keyword", "  spill the  beans ")]), 10);
        assert_eq!(filter.keyword.as_deref(), Some("  spill the  beans "));
        assert_eq!(filter.keyword_terms(), vec!["spill", "the", "beans"]);
    }
}

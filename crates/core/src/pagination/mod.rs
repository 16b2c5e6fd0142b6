//! Keyset pagination over the idiom table.
//!
//! A page request is resolved in two steps: [`filter::QueryFilter::build`]
//! turns raw query parameters into a resolved plan (sort column, outer and
//! inner direction, comparison operator, boundary value), and
//! [`cursor::encode_page`] turns the first/last rows of the returned page
//! into the opaque `previous`/`next` tokens for the following request.

pub mod cursor;
pub mod filter;

use crate::types::Timestamp;

/// Hard upper bound on any page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a requested page size to `1..=MAX_PAGE_SIZE`, using `default` when absent.
pub fn clamp_page_size(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

// ---------------------------------------------------------------------------
// Sort column / direction
// ---------------------------------------------------------------------------

/// Column a listing is ordered by. Only these two columns can seed a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Idiom,
    #[default]
    CreatedAt,
}

impl SortColumn {
    /// Parse the `orderBy` query parameter. Unknown or absent values fall back
    /// to [`SortColumn::CreatedAt`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("idiom") => Self::Idiom,
            Some("createdAt") | Some("created_at") => Self::CreatedAt,
            _ => Self::default(),
        }
    }

    /// Column name as it appears in SQL. Never derived from user input.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Idiom => "idiom",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse the `orderDirection` query parameter case-insensitively.
    /// Anything other than `asc` resolves to [`SortDirection::Desc`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Boundary predicate operator: `sort_column <op> boundary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessThan,
    GreaterThan,
}

impl Comparison {
    /// The operator that walks *away* from the boundary when scanning in `direction`.
    pub fn beyond(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Desc => Self::LessThan,
            SortDirection::Asc => Self::GreaterThan,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::GreaterThan => ">",
        }
    }
}

// ---------------------------------------------------------------------------
// Boundary values
// ---------------------------------------------------------------------------

/// Sort-key value of the edge row of a page. Always typed to match exactly
/// one [`SortColumn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryValue {
    Idiom(String),
    CreatedAt(Timestamp),
}

impl BoundaryValue {
    pub fn column(&self) -> SortColumn {
        match self {
            Self::Idiom(_) => SortColumn::Idiom,
            Self::CreatedAt(_) => SortColumn::CreatedAt,
        }
    }
}

/// Rows that can seed a pagination cursor.
pub trait Keyset {
    fn idiom_text(&self) -> &str;
    fn created_at(&self) -> Timestamp;

    /// The value of `column` for this row.
    fn boundary(&self, column: SortColumn) -> BoundaryValue {
        match column {
            SortColumn::Idiom => BoundaryValue::Idiom(self.idiom_text().to_string()),
            SortColumn::CreatedAt => BoundaryValue::CreatedAt(self.created_at()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_column_accepts_both_created_at_spellings() {
        assert_eq!(SortColumn::parse(Some("createdAt")), SortColumn::CreatedAt);
        assert_eq!(SortColumn::parse(Some("created_at")), SortColumn::CreatedAt);
        assert_eq!(SortColumn::parse(Some("idiom")), SortColumn::Idiom);
    }

    #[test]
    fn sort_column_falls_back_to_default() {
        assert_eq!(SortColumn::parse(None), SortColumn::CreatedAt);
        assert_eq!(SortColumn::parse(Some("thumbnail; DROP TABLE idioms")), SortColumn::CreatedAt);
        assert_eq!(SortColumn::parse(Some("IDIOM")), SortColumn::CreatedAt);
    }

    #[test]
    fn direction_is_case_insensitive_and_defaults_to_desc() {
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("Desc")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
    }

    #[test]
    fn comparison_walks_away_from_boundary() {
        assert_eq!(Comparison::beyond(SortDirection::Desc), Comparison::LessThan);
        assert_eq!(Comparison::beyond(SortDirection::Asc), Comparison::GreaterThan);
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_page_size(None, 20), 20);
        assert_eq!(clamp_page_size(Some(0), 20), 1);
        assert_eq!(clamp_page_size(Some(-5), 20), 1);
        assert_eq!(clamp_page_size(Some(5000), 20), MAX_PAGE_SIZE);
    }
}

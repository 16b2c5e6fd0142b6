//! Opaque pagination tokens.
//!
//! A token is base64-encoded JSON carrying the sort-key value of a page's
//! edge row and whether it points at the next or the previous page:
//!
//! ```text
//! {"idiom":"Break a leg","isNext":true}
//! {"createdAt":"2024-03-01T10:00:00.123456Z","isNext":false}
//! ```
//!
//! Tokens are not signed. Decoding only guarantees the value is well-typed;
//! it is always bound as a query parameter, never interpolated.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{BoundaryValue, Keyset, SortColumn};
use crate::types::Timestamp;

/// Tokens larger than this are rejected before base64 decoding.
const MAX_TOKEN_LEN: usize = 4 * 1024;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("page is empty, no boundary row available")]
    EmptyPage,

    #[error("cursor token exceeds {MAX_TOKEN_LEN} bytes")]
    TooLarge,

    #[error("cursor token is not valid base64")]
    InvalidBase64,

    #[error("cursor token is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("cursor must carry exactly one boundary value")]
    InvalidBoundary,

    #[error("cursor boundary does not match the active sort column")]
    ColumnMismatch,
}

/// Decoded pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub boundary: BoundaryValue,
    /// `true` for a "next page" token, `false` for a "previous page" token.
    pub is_next: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idiom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<Timestamp>,
    is_next: bool,
}

impl Cursor {
    pub fn new(boundary: BoundaryValue, is_next: bool) -> Self {
        Self { boundary, is_next }
    }

    /// Cursor pointing past `row` for the given sort column.
    pub fn from_row<T: Keyset>(row: &T, column: SortColumn, is_next: bool) -> Self {
        Self::new(row.boundary(column), is_next)
    }

    pub fn encode(&self) -> String {
        let payload = match &self.boundary {
            BoundaryValue::Idiom(idiom) => CursorPayload {
                idiom: Some(idiom.clone()),
                created_at: None,
                is_next: self.is_next,
            },
            BoundaryValue::CreatedAt(created_at) => CursorPayload {
                idiom: None,
                created_at: Some(*created_at),
                is_next: self.is_next,
            },
        };
        // Serializing a struct of strings, timestamps and bools cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        STANDARD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self, CursorError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(CursorError::TooLarge);
        }
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|_| CursorError::InvalidBase64)?;
        let payload: CursorPayload =
            serde_json::from_slice(&bytes).map_err(|e| CursorError::InvalidJson(e.to_string()))?;

        let boundary = match (payload.idiom, payload.created_at) {
            (Some(idiom), None) => BoundaryValue::Idiom(idiom),
            (None, Some(created_at)) => BoundaryValue::CreatedAt(created_at),
            _ => return Err(CursorError::InvalidBoundary),
        };
        Ok(Self::new(boundary, payload.is_next))
    }

    /// Decode a token and check it belongs to a listing sorted by `column`.
    pub fn decode_for(token: &str, column: SortColumn) -> Result<Self, CursorError> {
        let cursor = Self::decode(token)?;
        if cursor.boundary.column() != column {
            return Err(CursorError::ColumnMismatch);
        }
        Ok(cursor)
    }
}

/// Pick the token to honour when a request carries `previousToken` and/or
/// `nextToken`. A non-empty previous token always wins.
pub fn select_token<'a>(previous: Option<&'a str>, next: Option<&'a str>) -> Option<&'a str> {
    let non_empty = |t: &&str| !t.trim().is_empty();
    previous.filter(non_empty).or_else(|| next.filter(non_empty))
}

/// Encoded tokens for the pages surrounding a result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTokens {
    pub previous: String,
    pub next: String,
}

/// Build the previous/next tokens from the first and last rows of `rows`.
///
/// Fails with [`CursorError::EmptyPage`] when there is no boundary row;
/// callers treat that as "no further page".
pub fn encode_page<T: Keyset>(rows: &[T], column: SortColumn) -> Result<PageTokens, CursorError> {
    let (first, last) = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(CursorError::EmptyPage),
    };
    Ok(PageTokens {
        previous: Cursor::from_row(first, column, false).encode(),
        next: Cursor::from_row(last, column, true).encode(),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    struct Row {
        idiom: &'static str,
        created_at: Timestamp,
    }

    impl Keyset for Row {
        fn idiom_text(&self) -> &str {
            self.idiom
        }

        fn created_at(&self) -> Timestamp {
            self.created_at
        }
    }

    fn row(idiom: &'static str, secs: i64) -> Row {
        Row {
            idiom,
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 123_456_000).unwrap(),
        }
    }

    #[test]
    fn idiom_cursor_recovers_boundary_and_direction() {
        let source = row("Break a leg", 0);
        let token = Cursor::from_row(&source, SortColumn::Idiom, true).encode();

        let decoded = Cursor::decode_for(&token, SortColumn::Idiom).unwrap();
        assert_eq!(decoded.boundary, BoundaryValue::Idiom("Break a leg".into()));
        assert!(decoded.is_next);
    }

    #[test]
    fn created_at_cursor_keeps_sub_second_precision() {
        let source = row("Break a leg", 42);
        let token = Cursor::from_row(&source, SortColumn::CreatedAt, false).encode();

        let decoded = Cursor::decode_for(&token, SortColumn::CreatedAt).unwrap();
        assert_eq!(decoded.boundary, BoundaryValue::CreatedAt(source.created_at));
        assert!(!decoded.is_next);
    }

    #[test]
    fn token_carries_only_the_active_column() {
        let token = Cursor::from_row(&row("Spill the beans", 0), SortColumn::Idiom, true).encode();
        let json = String::from_utf8(STANDARD.decode(token).unwrap()).unwrap();
        assert_eq!(json, r#"{"idiom":"Spill the beans","isNext":true}"#);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert_matches!(Cursor::decode("%%%"), Err(CursorError::InvalidBase64));
        let not_json = STANDARD.encode("hello");
        assert_matches!(Cursor::decode(&not_json), Err(CursorError::InvalidJson(_)));
    }

    #[test]
    fn cursor_with_both_or_no_boundary_is_rejected() {
        let both = STANDARD
            .encode(r#"{"idiom":"x","createdAt":"2024-01-01T00:00:00Z","isNext":true}"#);
        assert_matches!(Cursor::decode(&both), Err(CursorError::InvalidBoundary));

        let none = STANDARD.encode(r#"{"isNext":true}"#);
        assert_matches!(Cursor::decode(&none), Err(CursorError::InvalidBoundary));
    }

    #[test]
    fn wrongly_typed_boundary_is_rejected() {
        let numeric = STANDARD.encode(r#"{"idiom":42,"isNext":true}"#);
        assert_matches!(Cursor::decode(&numeric), Err(CursorError::InvalidJson(_)));

        let bad_time = STANDARD.encode(r#"{"createdAt":"yesterday","isNext":true}"#);
        assert_matches!(Cursor::decode(&bad_time), Err(CursorError::InvalidJson(_)));
    }

    #[test]
    fn oversized_token_is_rejected_before_decoding() {
        let token = "A".repeat(MAX_TOKEN_LEN + 1);
        assert_matches!(Cursor::decode(&token), Err(CursorError::TooLarge));
    }

    #[test]
    fn cursor_for_other_column_is_a_mismatch() {
        let token = Cursor::from_row(&row("x", 0), SortColumn::Idiom, true).encode();
        assert_matches!(
            Cursor::decode_for(&token, SortColumn::CreatedAt),
            Err(CursorError::ColumnMismatch)
        );
    }

    #[test]
    fn previous_token_takes_precedence() {
        assert_eq!(select_token(Some("p"), Some("n")), Some("p"));
        assert_eq!(select_token(None, Some("n")), Some("n"));
        assert_eq!(select_token(Some(""), Some("n")), Some("n"));
        assert_eq!(select_token(Some("  "), None), None);
        assert_eq!(select_token(None, None), None);
    }

    #[test]
    fn page_tokens_use_first_and_last_rows() {
        let rows = vec![row("c", 3), row("b", 2), row("a", 1)];
        let tokens = encode_page(&rows, SortColumn::Idiom).unwrap();

        let previous = Cursor::decode(&tokens.previous).unwrap();
        let next = Cursor::decode(&tokens.next).unwrap();
        assert_eq!(previous, Cursor::new(BoundaryValue::Idiom("c".into()), false));
        assert_eq!(next, Cursor::new(BoundaryValue::Idiom("a".into()), true));
    }

    #[test]
    fn empty_page_has_no_tokens() {
        let rows: Vec<Row> = Vec::new();
        assert_eq!(encode_page(&rows, SortColumn::CreatedAt), Err(CursorError::EmptyPage));
    }
}

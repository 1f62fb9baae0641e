//! Wire protocol: request/response shapes and frame extraction.
//!
//! The socket carries bare JSON objects with no length prefix. Framing is
//! brace-balanced: a complete top-level `{...}` is consumed at a time, with
//! string and escape state tracked so braces inside string literals are
//! ignored. Responses are newline-terminated JSON.

use crate::error::Result;
use crate::matcher::MatchResult;
use serde::{Deserialize, Serialize};

/// An incoming request. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub queries: Option<Vec<String>>,
}

impl Request {
    /// The query list: a lone `query` becomes a one-element list.
    pub fn queries(&self) -> Vec<String> {
        match (&self.query, &self.queries) {
            (Some(single), _) => vec![single.clone()],
            (None, Some(many)) => many.clone(),
            (None, None) => Vec::new(),
        }
    }

    /// Whether any query field was present at all.
    pub fn has_query_field(&self) -> bool {
        self.query.is_some() || self.queries.is_some()
    }
}

/// One match in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchOutput {
    pub category: String,
    pub id: String,
    pub pattern: String,
    #[serde(rename = "match")]
    pub matched: String,
}

impl MatchOutput {
    /// Project a matcher result into its wire shape.
    pub fn from_result(result: &MatchResult) -> Self {
        let (id, category) = split_xref(&result.xref);
        Self {
            category: category.to_string(),
            id: id.to_string(),
            pattern: result.text.clone(),
            matched: result.matched.clone(),
        }
    }
}

/// Per-query results inside a batch response.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub index: usize,
    pub matches: Vec<MatchOutput>,
}

#[derive(Serialize)]
struct SingleResponse<'a> {
    id: &'a str,
    status: u16,
    results: &'a [MatchOutput],
}

#[derive(Serialize)]
struct BatchResponse<'a> {
    id: &'a str,
    status: u16,
    results: &'a [BatchEntry],
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    id: &'a str,
    status: u16,
    error: &'a str,
}

/// Split a cross-reference into `(id, category)`.
///
/// `id` is the substring before the first tab, `category` the substring
/// between the first and second tab (empty when absent).
pub fn split_xref(xref: &str) -> (&str, &str) {
    match xref.split_once('\t') {
        Some((id, rest)) => match rest.split_once('\t') {
            Some((category, _)) => (id, category),
            None => (id, rest),
        },
        None => (xref, ""),
    }
}

pub fn build_response(id: &str, status: u16, results: &[MatchOutput]) -> Result<String> {
    Ok(serde_json::to_string(&SingleResponse { id, status, results })?)
}

pub fn build_batch_response(id: &str, status: u16, results: &[BatchEntry]) -> Result<String> {
    Ok(serde_json::to_string(&BatchResponse { id, status, results })?)
}

pub fn build_error_response(id: &str, status: u16, error: &str) -> Result<String> {
    Ok(serde_json::to_string(&ErrorResponse { id, status, error })?)
}

/// Outcome of scanning the receive buffer for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameScan {
    /// A complete object occupies `[start, end)`.
    Complete { start: usize, end: usize },
    /// An object starts at `start` but its closing brace has not arrived.
    Partial { start: usize },
    /// No object start in the buffer; the whole buffer is garbage.
    Empty,
}

/// Locate the first complete top-level JSON object in the buffer.
///
/// Data before the first `{` is skipped. Brace depth is tracked outside of
/// string literals, honoring backslash escapes.
pub fn scan_frame(buffer: &[u8]) -> FrameScan {
    let start = match buffer.iter().position(|&b| b == b'{') {
        Some(at) => at,
        None => return FrameScan::Empty,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in buffer.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return FrameScan::Complete {
                        start,
                        end: i + 1,
                    };
                }
            }
            _ => {}
        }
    }

    FrameScan::Partial { start }
}

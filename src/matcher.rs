//! Request matching logic.
//!
//! Matches an incoming (method, path) pair against registered canned
//! responses. Entries are scanned in order and the first hit wins. A literal
//! hit needs both endpoint and method to be equal; a pattern hit only needs
//! the leftmost regex match in the path to be non-empty, whatever the request
//! method is.

use crate::config::CannedResponse;
use crate::error::CannedError;
use regex::Regex;

/// How a request matched a canned response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Endpoint and method are equal to the request's.
    Literal,
    /// The leftmost regex match in the request path is non-empty.
    Pattern,
}

/// A stored canned response with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledResponse {
    pub response: CannedResponse,
    pattern: Option<Regex>,
}

impl CompiledResponse {
    /// Validate a response and compile its pattern.
    pub fn compile(response: CannedResponse) -> Result<Self, CannedError> {
        response.validate()?;
        let pattern = response.compile_pattern()?;
        Ok(Self { response, pattern })
    }

    /// Check whether this response answers the given request.
    pub fn matches(&self, method: &str, path: &str) -> Option<MatchKind> {
        if self.response.endpoint == path && self.response.method == method {
            return Some(MatchKind::Literal);
        }
        match &self.pattern {
            Some(regex) if regex.find(path).is_some_and(|m| !m.as_str().is_empty()) => {
                Some(MatchKind::Pattern)
            }
            _ => None,
        }
    }
}

/// Result of matching a request against the registry.
#[derive(Debug)]
pub struct MatchResult<'a> {
    /// Position of the matched entry
    pub index: usize,
    pub entry: &'a CompiledResponse,
    pub kind: MatchKind,
}

/// Find the first entry answering the request.
pub fn find_match<'a>(
    entries: &'a [CompiledResponse],
    method: &str,
    path: &str,
) -> Option<MatchResult<'a>> {
    entries.iter().enumerate().find_map(|(index, entry)| {
        entry
            .matches(method, path)
            .map(|kind| MatchResult { index, entry, kind })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(endpoint: &str, pattern: &str, method: &str, body: &str) -> CompiledResponse {
        CompiledResponse::compile(CannedResponse {
            endpoint: endpoint.to_string(),
            pattern: pattern.to_string(),
            method: method.to_string(),
            code: "200".to_string(),
            body: body.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_literal_matching() {
        let entries = vec![make_entry("/api/users", "", "GET", "users")];

        let result = find_match(&entries, "GET", "/api/users").unwrap();
        assert_eq!(result.kind, MatchKind::Literal);
        assert_eq!(result.index, 0);

        assert!(find_match(&entries, "GET", "/api/posts").is_none());
        assert!(find_match(&entries, "GET", "/api/users/1").is_none());
    }

    #[test]
    fn test_method_is_case_sensitive() {
        let entries = vec![make_entry("/api/users", "", "GET", "users")];

        assert!(find_match(&entries, "get", "/api/users").is_none());
        assert!(find_match(&entries, "POST", "/api/users").is_none());
    }

    #[test]
    fn test_pattern_matching() {
        let entries = vec![make_entry("/re", "/re/[0-9]+", "GET", "r")];

        let result = find_match(&entries, "GET", "/re/42").unwrap();
        assert_eq!(result.kind, MatchKind::Pattern);

        // Unanchored: matches anywhere in the path
        assert!(find_match(&entries, "GET", "/prefix/re/7/suffix").is_some());
        assert!(find_match(&entries, "GET", "/re/abc").is_none());
    }

    #[test]
    fn test_pattern_ignores_method() {
        let entries = vec![make_entry("/re", "/re/[0-9]+", "GET", "r")];

        let result = find_match(&entries, "DELETE", "/re/42").unwrap();
        assert_eq!(result.kind, MatchKind::Pattern);
        assert_eq!(result.entry.response.method, "GET");
    }

    #[test]
    fn test_empty_pattern_match_is_not_a_hit() {
        let entries = vec![make_entry("/x", "z*", "GET", "x")];
        assert!(find_match(&entries, "GET", "/abc").is_none());

        // Only the leftmost match counts, and here it is empty
        assert!(find_match(&entries, "GET", "/abz").is_none());

        let entries = vec![make_entry("/x", "z+", "GET", "x")];
        assert!(find_match(&entries, "GET", "/abz").is_some());
    }

    #[test]
    fn test_first_entry_wins() {
        let entries = vec![
            make_entry("/other", "/items/.*", "GET", "pattern"),
            make_entry("/items/1", "", "GET", "literal"),
        ];

        let result = find_match(&entries, "GET", "/items/1").unwrap();
        assert_eq!(result.index, 0);
        assert_eq!(result.entry.response.body, "pattern");
    }

    #[test]
    fn test_literal_before_pattern_in_same_entry() {
        let entries = vec![
            make_entry("/items/1", "", "GET", "literal"),
            make_entry("/other", "/items/.*", "GET", "pattern"),
        ];

        let result = find_match(&entries, "GET", "/items/1").unwrap();
        assert_eq!(result.kind, MatchKind::Literal);
        assert_eq!(result.entry.response.body, "literal");

        let result = find_match(&entries, "POST", "/items/1").unwrap();
        assert_eq!(result.kind, MatchKind::Pattern);
        assert_eq!(result.entry.response.body, "pattern");
    }

    #[test]
    fn test_empty_entries() {
        assert!(find_match(&[], "GET", "/missing").is_none());
    }

    #[test]
    fn test_compile_rejects_invalid_pattern() {
        let err = CompiledResponse::compile(CannedResponse {
            endpoint: "/a".to_string(),
            pattern: "[".to_string(),
            method: "GET".to_string(),
            code: "200".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, CannedError::InvalidPattern { .. }));
    }
}

use std::{borrow::Cow, ops::Deref, sync::Arc, time::Instant};

use cynic_parser::ExecutableDocument;

use super::{Cache, CacheConfig};
use crate::{Error, Result, ValidationResult};

const PUNCTUATION: [char; 6] = ['{', '}', '(', ')', ':', ','];
const BLOCK_QUOTE: &str = "\"\"\"";

/// Parsed documents keyed by their normalized query text.
pub struct SyntaxCache {
    cache: Cache<Arc<ExecutableDocument>>,
}

impl SyntaxCache {
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(SyntaxCache {
            cache: Cache::new(config, normalize_query)?,
        })
    }

    pub fn with_clock(self, now: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        SyntaxCache {
            cache: self.cache.with_clock(now),
        }
    }

    /// Parses `query`, reusing a previous parse of any whitespace variant of it.
    /// Failures are returned as messages and are never cached.
    pub fn parse(&self, query: &str) -> Result<Arc<ExecutableDocument>, Vec<String>> {
        if let Some(document) = self.cache.get(query) {
            return Ok(document);
        }

        let errors = match cynic_parser::parse_executable_document(query) {
            Ok(document) if document.operations().next().is_some() => {
                let document = Arc::new(document);
                self.cache.set(query, Arc::clone(&document));
                return Ok(document);
            }
            Ok(_) => vec!["The document does not contain any operation".to_string()],
            Err(err) => vec![err.to_string()],
        };

        self.cache.record_parse_error();
        tracing::debug!(errors = errors.len(), "query could not be parsed");

        Err(errors)
    }

    pub fn validate(&self, query: &str) -> ValidationResult {
        match self.parse(query) {
            Ok(_) => ValidationResult::from_errors(Vec::new()),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    pub fn parse_or_error(&self, query: &str) -> Result<Arc<ExecutableDocument>> {
        self.parse(query).map_err(|errors| Error::Syntax { errors })
    }
}

impl Default for SyntaxCache {
    fn default() -> Self {
        SyntaxCache {
            cache: Cache::with_default_config(normalize_query),
        }
    }
}

impl Deref for SyntaxCache {
    type Target = Cache<Arc<ExecutableDocument>>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}

/// Collapses whitespace runs into a single space and drops whitespace around braces, parentheses,
/// colons and commas. Comments are dropped up to the end of their line, string and block string
/// literals are kept verbatim.
pub fn normalize_query(query: &str) -> Cow<'_, str> {
    let mut normalized = String::with_capacity(query.len());
    let mut pending_space = false;
    let mut rest = query;

    while let Some(c) = rest.chars().next() {
        if c == '#' {
            let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
            rest = &rest[end..];
            pending_space = true;
            continue;
        }

        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            pending_space = true;
            continue;
        }

        if PUNCTUATION.contains(&c) {
            rest = &rest[c.len_utf8()..];
            pending_space = false;
            normalized.push(c);
            continue;
        }

        if pending_space && !normalized.is_empty() && !normalized.ends_with(PUNCTUATION) {
            normalized.push(' ');
        }
        pending_space = false;

        let len = if c == '"' { string_len(rest) } else { c.len_utf8() };
        normalized.push_str(&rest[..len]);
        rest = &rest[len..];
    }

    if normalized == query {
        Cow::Borrowed(query)
    } else {
        Cow::Owned(normalized)
    }
}

/// Byte length of the string or block string literal `input` starts with. Unterminated literals
/// extend to the end of the line, or of the input for block strings.
fn string_len(input: &str) -> usize {
    if let Some(block) = input.strip_prefix(BLOCK_QUOTE) {
        let mut offset = 0;
        while let Some(index) = block[offset..].find(BLOCK_QUOTE) {
            let end = offset + index;
            // `\"""` is an escaped delimiter inside a block string
            if block[..end].ends_with('\\') {
                offset = end + BLOCK_QUOTE.len();
                continue;
            }
            return BLOCK_QUOTE.len() + end + BLOCK_QUOTE.len();
        }
        return input.len();
    }

    let mut escaped = false;
    for (index, c) in input.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return index + 1,
            '\n' | '\r' => return index,
            _ => {}
        }
    }

    input.len()
}

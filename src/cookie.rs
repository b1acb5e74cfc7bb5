//! Cookie-header parsing.

use std::collections::HashMap;

/// Parsed `Cookie` header: name → value.
///
/// Parsing is deliberately lenient: unrelated cookies on the same header may
/// be malformed, and a bad segment must not block extraction of the one we
/// care about.
#[derive(Debug, Default)]
pub struct CookieJar {
    entries: HashMap<String, String>,
}

impl CookieJar {
    /// Parse a raw `Cookie` header value.
    ///
    /// Segments are split on `;`, each segment on the *first* `=` only,
    /// since cookie values may legitimately contain `=` (base64 payloads). Names
    /// and values are whitespace-trimmed. A segment without `=` is skipped.
    /// Duplicate names are last-write-wins.
    pub fn parse(header: &str) -> Self {
        let mut entries = HashMap::new();

        for segment in header.split(';') {
            if let Some((name, value)) = segment.split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                entries.insert(name.to_string(), value.trim().to_string());
            }
        }

        Self { entries }
    }

    /// Look up a cookie by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of parsed cookies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no cookie parsed out of the header.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Compiled policy patterns.
//!
//! Patterns are operator-supplied and request-invariant, so each one is
//! compiled once per configuration and looked up by its source string.

use std::collections::HashMap;

use regex::Regex;

use crate::error::ProxyError;

/// Read-only map from pattern source to compiled regex.
#[derive(Debug, Default, Clone)]
pub struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    /// Compile every source. Duplicates are compiled once.
    pub fn compile<I, S>(sources: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = HashMap::new();
        for source in sources {
            let source = source.as_ref();
            if !compiled.contains_key(source) {
                compiled.insert(source.to_string(), Regex::new(source)?);
            }
        }
        Ok(Self { compiled })
    }

    /// Look up a compiled pattern.
    pub fn get(&self, source: &str) -> Result<&Regex, ProxyError> {
        self.compiled
            .get(source)
            .ok_or_else(|| ProxyError::MalformedPattern(source.to_string()))
    }

    pub fn is_match(&self, source: &str, haystack: &str) -> Result<bool, ProxyError> {
        Ok(self.get(source)?.is_match(haystack))
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiles_each_source_once() {
        let cache = PatternCache::compile(["^/v2/", "curl", "^/v2/"]).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.is_match("^/v2/", "/v2/library/alpine").unwrap());
        assert!(!cache.is_match("curl", "docker/24.0").unwrap());
    }

    #[test]
    fn test_unknown_source_is_an_error() {
        let cache = PatternCache::default();
        assert!(matches!(
            cache.get("^10\\."),
            Err(ProxyError::MalformedPattern(_))
        ));
    }

    #[test]
    fn test_invalid_source_fails_compile() {
        assert!(PatternCache::compile(["("]).is_err());
    }
}

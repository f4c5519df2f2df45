//! Token normalization
//!
//! Replaces slang and common misspellings with their canonical forms using
//! a correction table loaded once at startup.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::errors::SentiStreamError;
use crate::models::Token;
use crate::Result;

/// Raw-token -> canonical-form correction table.
///
/// Loaded once at startup and never mutated; concurrent readers need no
/// locking.
#[derive(Debug, Default)]
pub struct SlangTable {
    entries: HashMap<String, String>,
}

impl SlangTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load correction tables from mapping files, applied in order.
    ///
    /// Each non-blank, non-comment line holds `raw<TAB>canonical` (a `:`
    /// separator is accepted as well). The first file to define a key wins;
    /// later duplicates are ignored.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut table = Self::new();
        for path in paths {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path).map_err(|e| {
                SentiStreamError::ResourceLoad(format!(
                    "slang table {}: {}",
                    path.display(),
                    e
                ))
            })?;
            table.merge_content(&content);
        }
        Ok(table)
    }

    fn merge_content(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((raw, canonical)) = line.split_once('\t').or_else(|| line.split_once(':'))
            else {
                debug!("skipping malformed slang line: {}", line);
                continue;
            };
            let raw = raw.trim().to_lowercase();
            let canonical = canonical.trim().to_string();
            if raw.is_empty() || canonical.is_empty() {
                continue;
            }
            if self.entries.contains_key(&raw) {
                debug!("duplicate slang key ignored: {}", raw);
                continue;
            }
            self.entries.insert(raw, canonical);
        }
    }

    /// Look up the canonical form of a token, if one exists.
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut table = Self::new();
        for (raw, canonical) in pairs {
            table
                .entries
                .insert((*raw).to_lowercase(), (*canonical).to_string());
        }
        table
    }
}

/// Order-preserving, one-to-one token normalizer.
pub struct Preprocessor {
    slang: SlangTable,
}

impl Preprocessor {
    pub fn new(slang: SlangTable) -> Self {
        Self { slang }
    }

    /// Normalize a token sequence.
    ///
    /// Each token is looked up in the correction table by its lower-cased
    /// surface; on a hit the surface is replaced with the canonical form.
    /// Unknown tokens pass through unchanged. No tokens are inserted or
    /// removed.
    pub fn preprocess(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .map(|mut token| {
                let lowered = token.surface.to_lowercase();
                if let Some(canonical) = self.slang.lookup(&lowered) {
                    token.surface = canonical.to_string();
                }
                token
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::tokenizer::Tokenizer;

    #[test]
    fn test_lookup_replaces_surface() {
        let slang = SlangTable::from_pairs(&[("u", "you"), ("gr8", "great")]);
        let preprocessor = Preprocessor::new(slang);

        let tokens = vec![Token::new("U"), Token::new("gr8"), Token::new("code")];
        let out = preprocessor.preprocess(tokens);
        let surfaces: Vec<&str> = out.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["you", "great", "code"]);
    }

    #[test]
    fn test_one_to_one_and_order_preserving() {
        let slang = SlangTable::from_pairs(&[("b4", "before")]);
        let preprocessor = Preprocessor::new(slang);

        let tokens = vec![Token::new("a"), Token::new("b4"), Token::new("c")];
        let out = preprocessor.preprocess(tokens);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].surface, "a");
        assert_eq!(out[1].surface, "before");
        assert_eq!(out[2].surface, "c");
    }

    #[test]
    fn test_preprocess_is_idempotent_over_tokenize() {
        let slang = SlangTable::from_pairs(&[("u", "you"), ("luv", "love")]);
        let preprocessor = Preprocessor::new(slang);
        let tokenizer = Tokenizer::new();

        let tokens = tokenizer.tokenize("u luv rust");
        let once = preprocessor.preprocess(tokens);
        let twice = preprocessor.preprocess(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_load_from_files_first_key_wins() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        writeln!(first, "# comment\nu\tyou\nlol\tlaughing").unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        writeln!(second, "u\tyour\nbtw\tby the way").unwrap();

        let table = SlangTable::load(&[first.path(), second.path()]).unwrap();
        assert_eq!(table.lookup("u"), Some("you"));
        assert_eq!(table.lookup("btw"), Some("by the way"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = SlangTable::load(&["/nonexistent/slang.tsv"]);
        assert!(result.is_err());
    }
}

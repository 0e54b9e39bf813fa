//! Name-based entry filtering for tree walking

use std::ffi::OsStr;

use glob::Pattern;

use crate::error::{Error, Result};

/// Compiled ignore patterns, matched against entry names only.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    patterns: Vec<Pattern>,
}

impl EntryFilter {
    /// Compile `patterns`. An invalid glob is a configuration error rather
    /// than a pattern that silently never matches.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p)
                    .map_err(|e| Error::InvalidConfig(format!("bad ignore pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_ignored(&self, name: &OsStr) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let name = name.to_string_lossy();
        self.patterns
            .iter()
            .any(|p| p.as_str() == name || p.matches(&name))
    }
}

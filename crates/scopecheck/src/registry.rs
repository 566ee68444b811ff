// registry.rs
//
// Pattern sources live outside the harness (a name -> pattern-source table).
// The registry compiles them once at setup and hands out typed handles; a
// miss is a found/not-found result, never a panic.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;


#[derive(Debug, Default)]
pub struct PatternRegistry {
    patterns: HashMap<String, Regex>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register a pattern source under `name`. Re-inserting a
    /// name replaces the previous pattern.
    pub fn insert(&mut self, name: &str, source: &str) -> Result<()> {
        let compiled = Regex::new(source)
            .with_context(|| format!("Invalid pattern source for '{}'", name))?;
        self.patterns.insert(name.to_string(), compiled);
        Ok(())
    }

    /// Typed accessor: the compiled pattern, or None for an unknown name.
    pub fn lookup(&self, name: &str) -> Option<&Regex> {
        self.patterns.get(name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Build a registry from a JSON object of `{ "name": "pattern-source" }`.
    pub fn from_json(content: &str) -> Result<Self> {
        let sources: HashMap<String, String> =
            serde_json::from_str(content).context("Failed to parse pattern table JSON")?;
        let mut registry = Self::new();
        for (name, source) in &sources {
            registry.insert(name, source)?;
        }
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pattern table: {}", path.display()))?;
        Self::from_json(&content)
    }
}

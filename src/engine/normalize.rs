//! Text normalizer: an ordered, data-driven rule table applied to each extracted block.
//!
//! Rule file format (TOML), applied top to bottom:
//!
//! ```toml
//! [[rule]]
//! kind = "strip_prefix"
//! prefix = "thumb"
//!
//! [[rule]]
//! kind = "replace"
//! from = " ( or )"
//! to = ""
//!
//! [[rule]]
//! kind = "regex"
//! pattern = "\\s{2,}"
//! replacement = " "
//! ```

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Pure `text -> text` cleanup called once per raw block by the extractor.
pub trait Normalize: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// Leaves text untouched. Used when no rule file is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Normalize for Identity {
    fn normalize(&self, text: &str) -> String {
        text.to_string()
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RuleSpec {
    Replace { from: String, to: String },
    StripPrefix { prefix: String },
    Regex { pattern: String, replacement: String },
}

#[derive(Debug, Default, Deserialize)]
struct RuleFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleSpec>,
}

/// One compiled rule.
#[derive(Clone, Debug)]
pub enum Rule {
    /// Literal substitution of every occurrence.
    Replace { from: String, to: String },
    /// Remove `prefix` once if the text starts with it.
    StripPrefix(String),
    /// Regex substitution of every match; `replacement` may use `$1`-style groups.
    Regex { pattern: Regex, replacement: String },
}

impl Rule {
    fn apply(&self, text: String) -> String {
        match self {
            Rule::Replace { from, to } => {
                if from.is_empty() {
                    text
                } else {
                    text.replace(from.as_str(), to)
                }
            }
            Rule::StripPrefix(prefix) => match text.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.to_string(),
                None => text,
            },
            Rule::Regex {
                pattern,
                replacement,
            } => pattern.replace_all(&text, replacement.as_str()).into_owned(),
        }
    }
}

impl TryFrom<RuleSpec> for Rule {
    type Error = anyhow::Error;

    fn try_from(spec: RuleSpec) -> Result<Self> {
        Ok(match spec {
            RuleSpec::Replace { from, to } => Rule::Replace { from, to },
            RuleSpec::StripPrefix { prefix } => Rule::StripPrefix(prefix),
            RuleSpec::Regex {
                pattern,
                replacement,
            } => Rule::Regex {
                pattern: Regex::new(&pattern)
                    .with_context(|| format!("invalid rule pattern {pattern:?}"))?,
                replacement,
            },
        })
    }
}

/// Ordered rule list, loaded once at startup. An empty table behaves like [`Identity`].
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: RuleFile = toml::from_str(s).context("parse rule table")?;
        let rules = file
            .rules
            .into_iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read rule table {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("load rule table {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Normalize for RuleTable {
    fn normalize(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(acc))
    }
}

/// Normalizer for a run: the rule table at `rules_path`, or [`Identity`] when none is configured.
pub fn load_normalizer(rules_path: Option<&Path>) -> Result<Arc<dyn Normalize>> {
    match rules_path {
        Some(path) => {
            let table = RuleTable::load(path)?;
            log::debug!("Loaded {} normalizer rules from {}", table.len(), path.display());
            Ok(Arc::new(table))
        }
        None => Ok(Arc::new(Identity)),
    }
}

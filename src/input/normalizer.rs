//! Caller-side skill label normalization
//!
//! The matcher compares labels verbatim. Hosts that want "Node.js" and
//! "nodejs" treated as one skill canonicalize both lists with this first.

use regex::Regex;
use std::collections::{HashMap, HashSet};

const ALIASES: &[(&str, &[&str])] = &[
    ("mongodb", &["mongo db", "mongo-db", "mongo", "mongo dbms"]),
    ("node", &["nodejs", "node.js", "node js"]),
    ("c#", &["c sharp", "csharp"]),
    ("c++", &["cpp"]),
    ("react", &["reactjs", "react.js", "react js"]),
    ("fastapi", &["fast api"]),
    ("javascript", &["js", "java script"]),
    ("typescript", &["ts"]),
];

pub struct SkillNormalizer {
    disallowed: Regex,
    whitespace: Regex,
    aliases: HashMap<String, String>,
}

impl Default for SkillNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillNormalizer {
    pub fn new() -> Self {
        let mut aliases = HashMap::new();
        for (canonical, variants) in ALIASES {
            for variant in variants.iter() {
                aliases.insert(variant.to_string(), canonical.to_string());
            }
        }

        Self {
            // Keep characters that carry meaning in tech names: c++, c#, .net
            disallowed: Regex::new(r"[^a-z0-9.+#]").expect("Invalid label regex"),
            whitespace: Regex::new(r"\s+").expect("Invalid whitespace regex"),
            aliases,
        }
    }

    /// Add or override an alias
    pub fn with_alias(mut self, variant: &str, canonical: &str) -> Self {
        let variant = self.normalize(variant);
        let canonical = self.normalize(canonical);
        self.aliases.insert(variant, canonical);
        self
    }

    /// Lowercase, strip punctuation, collapse whitespace
    pub fn normalize(&self, label: &str) -> String {
        let lower = label.to_lowercase();
        let cleaned = self.disallowed.replace_all(&lower, " ");
        self.whitespace.replace_all(&cleaned, " ").trim().to_string()
    }

    /// Normalize, then map known aliases to their canonical label
    pub fn canonicalize(&self, label: &str) -> String {
        let normalized = self.normalize(label);
        match self.aliases.get(&normalized) {
            Some(canonical) => canonical.clone(),
            None => normalized,
        }
    }

    /// Canonicalize a list, dropping empties and later duplicates
    pub fn canonicalize_all(&self, labels: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        labels
            .iter()
            .map(|label| self.canonicalize(label))
            .filter(|label| !label.is_empty() && seen.insert(label.clone()))
            .collect()
    }
}

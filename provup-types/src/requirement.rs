use crate::addr::ProviderAddr;
use crate::diagnostics::SourcePos;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a requirement's source address came from, or why it has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "addr", rename_all = "snake_case")]
pub enum Provenance {
    /// Written by the operator in an explicit `source` attribute.
    Declared(ProviderAddr),
    /// Placeholder synthesized from a local name; still needs a lookup.
    Legacy(ProviderAddr),
    /// Filled in by a registry lookup.
    Resolved(ProviderAddr),
    /// The registry definitively does not know this provider.
    NotKnown,
}

impl Provenance {
    /// The address to write as `source`, if one is known.
    pub fn source(&self) -> Option<&ProviderAddr> {
        match self {
            Provenance::Declared(addr) | Provenance::Resolved(addr) => Some(addr),
            Provenance::Legacy(_) | Provenance::NotKnown => None,
        }
    }

    /// The legacy placeholder to look up, if this provenance still needs one.
    pub fn pending_lookup(&self) -> Option<&ProviderAddr> {
        match self {
            Provenance::Legacy(addr) => Some(addr),
            _ => None,
        }
    }
}

/// Everything known about one logical provider name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementFact {
    pub name: String,
    pub provenance: Provenance,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<SourcePos>,
}

impl RequirementFact {
    /// A fact derived only from a local name.
    pub fn legacy(name: impl Into<String>, origin: Option<SourcePos>) -> Self {
        let name = name.into();
        Self {
            provenance: Provenance::Legacy(ProviderAddr::legacy(&name)),
            name,
            version: None,
            origin,
        }
    }

    /// Non-empty version constraint, if any.
    pub fn version_constraint(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }
}

/// The collected requirement facts, keyed and iterated by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSet {
    facts: BTreeMap<String, RequirementFact>,

    /// Files that held at least one explicit `required_providers` block, in processing order.
    pub rewrite_candidates: Vec<Utf8PathBuf>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.facts.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&RequirementFact> {
        self.facts.get(name)
    }

    /// Inserts `fact` unless its name is already known. Returns the fact that
    /// holds the name afterwards and whether it was newly inserted.
    pub fn insert_if_absent(&mut self, fact: RequirementFact) -> (&RequirementFact, bool) {
        use std::collections::btree_map::Entry;
        match self.facts.entry(fact.name.clone()) {
            Entry::Occupied(o) => (o.into_mut(), false),
            Entry::Vacant(v) => (v.insert(fact), true),
        }
    }

    pub fn mark_candidate(&mut self, path: &camino::Utf8Path) {
        if !self.rewrite_candidates.iter().any(|p| p == path) {
            self.rewrite_candidates.push(path.to_path_buf());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequirementFact> {
        self.facts.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RequirementFact> {
        self.facts.values_mut()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Facts in emission order (lexicographic by name).
    pub fn sorted_facts(&self) -> Vec<RequirementFact> {
        self.facts.values().cloned().collect()
    }
}

/// Which file receives the consolidated block and which files get stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewritePlan {
    pub target: Utf8PathBuf,
    pub target_exists: bool,
    pub strip: Vec<Utf8PathBuf>,
    pub facts: Vec<RequirementFact>,
}

#![deny(warnings)]

//! Tactic and wildcard catalogs loaded from YAML, plus seeded wildcard draws.
//!
//! The catalogs are static data consumed by the campaign state machine.
//! Selection randomness lives here, outside the core, behind a seed.

use mix_core::{
    validate_tactic, validate_wildcard, Tactic, TacticId, ValidationError, WildcardEvent,
    WildcardId,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const BUILTIN_TACTICS: &str = include_str!("../../../assets/catalog/tactics.yaml");
const BUILTIN_WILDCARDS: &str = include_str!("../../../assets/catalog/wildcards.yaml");

/// File names looked up by [`Catalog::load_dir`].
pub const TACTICS_FILE: &str = "tactics.yaml";
pub const WILDCARDS_FILE: &str = "wildcards.yaml";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid catalog yaml: {0}")]
    Yaml(String),
    #[error("invalid entry {id}: {source}")]
    Invalid {
        id: String,
        source: ValidationError,
    },
    #[error("duplicate catalog id: {0}")]
    DuplicateId(String),
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(e: serde_yaml::Error) -> Self {
        CatalogError::Yaml(e.to_string())
    }
}

/// Validated tactic and wildcard catalogs.
#[derive(Debug, Clone)]
pub struct Catalog {
    tactics: Vec<Tactic>,
    wildcards: Vec<WildcardEvent>,
}

impl Catalog {
    /// Build from parsed entries, validating each and checking id uniqueness.
    pub fn new(tactics: Vec<Tactic>, wildcards: Vec<WildcardEvent>) -> Result<Self, CatalogError> {
        let mut ids = BTreeSet::new();
        for t in &tactics {
            validate_tactic(t).map_err(|source| CatalogError::Invalid {
                id: t.id.0.clone(),
                source,
            })?;
            if !ids.insert(t.id.0.clone()) {
                return Err(CatalogError::DuplicateId(t.id.0.clone()));
            }
        }
        ids.clear();
        for w in &wildcards {
            validate_wildcard(w).map_err(|source| CatalogError::Invalid {
                id: w.id.0.clone(),
                source,
            })?;
            if !ids.insert(w.id.0.clone()) {
                return Err(CatalogError::DuplicateId(w.id.0.clone()));
            }
        }
        Ok(Self { tactics, wildcards })
    }

    /// Parse catalogs from YAML text.
    pub fn from_yaml(tactics: &str, wildcards: &str) -> Result<Self, CatalogError> {
        let tactics: Vec<Tactic> = serde_yaml::from_str(tactics)?;
        let wildcards: Vec<WildcardEvent> = serde_yaml::from_str(wildcards)?;
        Self::new(tactics, wildcards)
    }

    /// The catalogs shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_TACTICS, BUILTIN_WILDCARDS)
    }

    /// Load `tactics.yaml` and `wildcards.yaml` from a directory.
    ///
    /// A missing file falls back to the built-in catalog for that half.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let read = |name: &str, fallback: &str| -> Result<String, CatalogError> {
            let path = dir.join(name);
            if path.exists() {
                info!("Loading catalog file: {}", path.display());
                Ok(fs::read_to_string(path)?)
            } else {
                Ok(fallback.to_string())
            }
        };
        let tactics = read(TACTICS_FILE, BUILTIN_TACTICS)?;
        let wildcards = read(WILDCARDS_FILE, BUILTIN_WILDCARDS)?;
        Self::from_yaml(&tactics, &wildcards)
    }

    pub fn tactics(&self) -> &[Tactic] {
        &self.tactics
    }

    pub fn wildcards(&self) -> &[WildcardEvent] {
        &self.wildcards
    }

    pub fn tactic(&self, id: &TacticId) -> Option<&Tactic> {
        self.tactics.iter().find(|t| &t.id == id)
    }

    pub fn wildcard(&self, id: &WildcardId) -> Option<&WildcardEvent> {
        self.wildcards.iter().find(|w| &w.id == id)
    }

    /// A seeded deck over this catalog's wildcards.
    pub fn deck(&self, seed: u64) -> WildcardDeck {
        WildcardDeck::new(&self.wildcards, seed)
    }
}

/// Shuffled wildcard draw pile; every event is drawn at most once.
#[derive(Debug, Clone)]
pub struct WildcardDeck {
    pile: Vec<WildcardEvent>,
}

impl WildcardDeck {
    pub fn new(events: &[WildcardEvent], seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut pile = events.to_vec();
        pile.shuffle(&mut rng);
        Self { pile }
    }

    /// Next event, or `None` once the deck is exhausted.
    pub fn draw(&mut self) -> Option<WildcardEvent> {
        self.pile.pop()
    }

    pub fn remaining(&self) -> usize {
        self.pile.len()
    }
}

#![deny(warnings)]

//! Persistence layer: campaign snapshots and leaderboard entries on disk.
//!
//! Nothing here is called by the simulation core. Callers hand over a
//! finished [`Campaign`] or its [`FinalResults`] and this crate serializes,
//! fingerprints and stores them.

use chrono::NaiveDate;
use mix_campaign::Campaign;
use mix_scoring::{FinalResults, Grade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const LEADERBOARD_FILE: &str = "leaderboard.jsonl";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("invalid save name: {0:?}")]
    InvalidName(String),
    #[error("campaign has no final results yet")]
    NotFinished,
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Serde(e.to_string())
    }
}

/// Returns the default directory used for local saves.
pub fn default_save_dir() -> &'static str {
    "./saves"
}

/// blake3 hex digest of the canonical JSON form of `results`.
pub fn fingerprint(results: &FinalResults) -> Result<String, PersistError> {
    let bytes = serde_json::to_vec(results)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Flattened, submittable summary of a finished campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: String,
    pub submitted_on: NaiveDate,
    pub score: f64,
    pub grade: Grade,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub market_share: f64,
    pub customer_satisfaction: f64,
    pub brand_awareness: f64,
    /// Digest of the full results the entry was built from.
    pub fingerprint: String,
}

impl LeaderboardEntry {
    pub fn new(
        player: &str,
        submitted_on: NaiveDate,
        results: &FinalResults,
    ) -> Result<Self, PersistError> {
        let player = player.trim();
        if player.is_empty() {
            return Err(PersistError::InvalidName(player.to_string()));
        }
        Ok(Self {
            player: player.to_string(),
            submitted_on,
            score: results.score,
            grade: results.grade,
            revenue: results.kpis.revenue,
            profit: results.kpis.profit,
            market_share: results.kpis.market_share,
            customer_satisfaction: results.kpis.customer_satisfaction,
            brand_awareness: results.kpis.brand_awareness,
            fingerprint: fingerprint(results)?,
        })
    }

    /// Whether the entry was built from exactly these results.
    pub fn matches(&self, results: &FinalResults) -> bool {
        fingerprint(results).is_ok_and(|f| f == self.fingerprint)
    }
}

/// Directory-backed store for snapshots and the local leaderboard.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, name: &str) -> Result<PathBuf, PersistError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Write a campaign snapshot as pretty JSON.
    pub fn save(&self, name: &str, campaign: &Campaign) -> Result<PathBuf, PersistError> {
        let path = self.snapshot_path(name)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, serde_json::to_string_pretty(campaign)?)?;
        info!("Saved campaign snapshot: {}", path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Campaign, PersistError> {
        let path = self.snapshot_path(name)?;
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Names of stored snapshots, sorted.
    pub fn list(&self) -> Result<Vec<String>, PersistError> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let mut names = Vec::new();
        for ent in fs::read_dir(&self.dir)? {
            let path = ent?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Build and append a leaderboard entry for a finished campaign.
    pub fn submit(
        &self,
        player: &str,
        submitted_on: NaiveDate,
        campaign: &Campaign,
    ) -> Result<LeaderboardEntry, PersistError> {
        let results = campaign.final_results().ok_or(PersistError::NotFinished)?;
        let entry = LeaderboardEntry::new(player, submitted_on, results)?;
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(LEADERBOARD_FILE))?;
        writeln!(file, "{}", serde_json::to_string(&entry)?)?;
        info!(player = %entry.player, score = entry.score, "leaderboard entry written");
        Ok(entry)
    }

    /// Local leaderboard, best score first.
    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, PersistError> {
        let path = self.dir.join(LEADERBOARD_FILE);
        if !path.exists() {
            return Ok(vec![]);
        }
        let mut entries = fs::read_to_string(path)?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str::<LeaderboardEntry>)
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(entries)
    }
}

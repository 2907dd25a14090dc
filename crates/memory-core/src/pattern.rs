use crate::clock::Clock;
use crate::error::{MemoryError, Result};
use crate::paths;
use crate::types::PatternType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub type PatternMap = BTreeMap<String, PatternRecord>;

// ---------------------------------------------------------------------------
// PatternData / PatternRecord
// ---------------------------------------------------------------------------

/// Fields supplied by a learn call. Unset fields leave the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

impl PatternData {
    /// Drop blank strings so they count as "not supplied".
    fn normalized(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            pattern: keep(self.pattern),
            description: keep(self.description),
            example: keep(self.example),
            usage: keep(self.usage),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.description.is_none()
            && self.example.is_none()
            && self.usage.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    pub learned_at: DateTime<Utc>,
}

impl PatternRecord {
    fn new(data: PatternData, learned_at: DateTime<Utc>) -> Self {
        Self {
            pattern: data.pattern,
            description: data.description,
            example: data.example,
            usage: data.usage,
            learned_at,
        }
    }

    fn merge(&mut self, data: PatternData) {
        if data.pattern.is_some() {
            self.pattern = data.pattern;
        }
        if data.description.is_some() {
            self.description = data.description;
        }
        if data.example.is_some() {
            self.example = data.example;
        }
        if data.usage.is_some() {
            self.usage = data.usage;
        }
    }
}

// ---------------------------------------------------------------------------
// PatternLibrary
// ---------------------------------------------------------------------------

/// One JSON map per pattern type under `.claude-memory/patterns/`.
pub struct PatternLibrary<'a> {
    root: &'a Path,
    clock: &'a dyn Clock,
}

impl<'a> PatternLibrary<'a> {
    pub fn new(root: &'a Path, clock: &'a dyn Clock) -> Self {
        Self { root, clock }
    }

    /// Create or merge the record at (`pattern_type`, `key`).
    ///
    /// `learnedAt` is stamped on first creation and kept on later merges.
    pub fn learn_pattern(
        &self,
        pattern_type: PatternType,
        key: &str,
        data: PatternData,
    ) -> Result<PatternRecord> {
        let key = key.trim();
        if key.is_empty() {
            return Err(MemoryError::EmptyPatternKey);
        }
        let data = data.normalized();
        if data.is_empty() {
            return Err(MemoryError::EmptyPattern);
        }

        let mut patterns = self.get_patterns(pattern_type)?;
        let record = match patterns.get_mut(key) {
            Some(existing) => {
                existing.merge(data);
                existing.clone()
            }
            None => {
                let record = PatternRecord::new(data, self.clock.now());
                patterns.insert(key.to_string(), record.clone());
                record
            }
        };
        crate::io::write_json(&paths::patterns_path(self.root, pattern_type), &patterns)?;
        info!(pattern_type = %pattern_type, key, "pattern learned");
        Ok(record)
    }

    /// All records of one type; empty when none were learned.
    pub fn get_patterns(&self, pattern_type: PatternType) -> Result<PatternMap> {
        Ok(crate::io::read_json(&paths::patterns_path(self.root, pattern_type))?.unwrap_or_default())
    }

    pub fn get_pattern(&self, pattern_type: PatternType, key: &str) -> Result<PatternRecord> {
        self.get_patterns(pattern_type)?
            .remove(key)
            .ok_or_else(|| MemoryError::PatternNotFound {
                pattern_type: pattern_type.to_string(),
                key: key.to_string(),
            })
    }

    pub fn all_patterns(&self) -> Result<Vec<(PatternType, PatternMap)>> {
        let mut all = Vec::with_capacity(PatternType::all().len());
        for t in PatternType::all() {
            all.push((*t, self.get_patterns(*t)?));
        }
        Ok(all)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::clock::Clock;
use crate::error::{MemoryError, Result};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Well-known fields, in display order. Anything else is a custom field.
pub const KNOWN_FIELDS: &[&str] = &[
    "framework",
    "language",
    "runtime",
    "database",
    "orm",
    "stateManagement",
    "styling",
    "testing",
    "buildTool",
    "packageManager",
    "deployment",
    "cicd",
];

const LAST_UPDATED: &str = "lastUpdated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStack {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl TechStack {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Known fields in their canonical order, then custom fields alphabetically.
    pub fn ordered_fields(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = KNOWN_FIELDS
            .iter()
            .filter_map(|k| self.fields.get_key_value(*k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        out.extend(
            self.fields
                .iter()
                .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        out
    }
}

/// `stateManagement` -> `State Management`.
pub fn display_label(field: &str) -> String {
    let mut label = String::with_capacity(field.len() + 4);
    for (i, c) in field.chars().enumerate() {
        if i == 0 {
            label.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            label.push(' ');
            label.push(c);
        } else {
            label.push(c);
        }
    }
    label
}

// ---------------------------------------------------------------------------
// TechStackRegistry
// ---------------------------------------------------------------------------

pub struct TechStackRegistry<'a> {
    root: &'a Path,
    clock: &'a dyn Clock,
}

impl<'a> TechStackRegistry<'a> {
    pub fn new(root: &'a Path, clock: &'a dyn Clock) -> Self {
        Self { root, clock }
    }

    pub fn get_tech_stack(&self) -> Result<Option<TechStack>> {
        crate::io::read_json(&paths::techstack_path(self.root))
    }

    /// Shallow merge: given fields overwrite, the rest persist.
    pub fn update_tech_stack(&self, fields: BTreeMap<String, String>) -> Result<TechStack> {
        if fields.is_empty() {
            return Err(MemoryError::EmptyTechStackUpdate);
        }
        if let Some(bad) = fields
            .keys()
            .find(|k| k.trim().is_empty() || k.as_str() == LAST_UPDATED)
        {
            return Err(MemoryError::InvalidTechStackField(bad.clone()));
        }

        let mut stack = self.get_tech_stack()?.unwrap_or(TechStack {
            fields: BTreeMap::new(),
            last_updated: None,
        });
        let changed: Vec<&str> = fields.keys().map(String::as_str).collect();
        info!(fields = ?changed, "tech stack updated");
        stack.fields.extend(fields);
        stack.last_updated = Some(self.clock.now());
        crate::io::write_json(&paths::techstack_path(self.root), &stack)?;
        Ok(stack)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

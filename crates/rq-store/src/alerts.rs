//! User-registered congestion alerts.
//!
//! The book is a JSON array of `{"from": .., "to": ..}` rules.  An alert
//! fires for every segment in the current batch that matches a rule and
//! whose weight is at or above the alert threshold.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use rq_core::Segment;

use crate::file::{load_or_default, save};
use crate::StoreResult;

pub const DEFAULT_ALERTS_FILE: &str = "alerts.json";

/// One watched directed edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertRule {
    pub from: String,
    pub to:   String,
}

impl AlertRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }

    pub fn matches(&self, segment: &Segment) -> bool {
        segment.from == self.from && segment.to == self.to
    }
}

impl fmt::Display for AlertRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A triggered alert.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertMessage {
    pub rule:   AlertRule,
    pub weight: f64,
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALERT: Congestion on {} (weight: {})", self.rule, self.weight)
    }
}

/// Alert rules persisted in one JSON file.
#[derive(Debug)]
pub struct AlertBook {
    path:  PathBuf,
    rules: Vec<AlertRule>,
}

impl AlertBook {
    /// Load the book at `path`.  A missing file is an empty book.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let rules: Vec<AlertRule> = load_or_default(&path)?;
        debug!(path = %path.display(), rules = rules.len(), "opened alert book");
        Ok(Self { path, rules })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register `from -> to`.  Returns `false` (and writes nothing) if the
    /// rule already exists.
    pub fn add(&mut self, from: &str, to: &str) -> StoreResult<bool> {
        let rule = AlertRule::new(from, to);
        if self.rules.contains(&rule) {
            return Ok(false);
        }
        self.rules.push(rule);
        save(&self.path, &self.rules)?;
        Ok(true)
    }

    /// Unregister `from -> to`.  Returns whether a rule was removed.
    pub fn remove(&mut self, from: &str, to: &str) -> StoreResult<bool> {
        let before = self.rules.len();
        self.rules.retain(|r| !(r.from == from && r.to == to));
        save(&self.path, &self.rules)?;
        Ok(self.rules.len() != before)
    }

    pub fn list(&self) -> &[AlertRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Alerts triggered by `segments`, grouped by rule in registration order.
    pub fn check(&self, segments: &[Segment], threshold: f64) -> Vec<AlertMessage> {
        self.rules
            .iter()
            .flat_map(|rule| {
                segments
                    .iter()
                    .filter(move |s| rule.matches(s) && s.weight >= threshold)
                    .map(move |s| AlertMessage { rule: rule.clone(), weight: s.weight })
            })
            .collect()
    }
}

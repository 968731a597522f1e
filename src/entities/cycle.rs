//! Cycle entity - a bounded reporting window with recorded measurements
//!
//! Measurement values are stored as an ordered list; when the same
//! acronym is recorded more than once in a cycle, resolution takes the
//! most recently added value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::plan::Metric;

/// A recorded measurement value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementValue {
    /// Acronym of the measurement definition
    pub acronym: String,

    /// Recorded numeric value
    pub value: f64,

    /// When the value was recorded
    pub recorded: DateTime<Utc>,
}

/// A cycle entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    /// Unique identifier (CYC-...)
    pub id: EntityId,

    /// Owning measurement plan
    pub plan: EntityId,

    /// Cycle title/name (e.g. "2026-Q1")
    pub title: String,

    /// First day of the window
    pub start_date: NaiveDate,

    /// Last day of the window; must be after start_date
    pub end_date: NaiveDate,

    /// Recorded measurement values, in recording order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measurements: Vec<MeasurementValue>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author name
    pub author: String,

    /// Revision counter
    #[serde(default = "default_revision")]
    pub revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Cycle {
    const PREFIX: &'static str = "CYC";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        match self.status {
            Status::Draft => "draft",
            Status::Review => "review",
            Status::Approved => "approved",
            Status::Released => "released",
            Status::Obsolete => "obsolete",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Cycle {
    /// Create a new cycle under a plan
    pub fn new(
        plan: EntityId,
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Cyc),
            plan,
            title: title.into(),
            start_date,
            end_date,
            measurements: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            revision: 1,
        }
    }

    /// Append a measurement value, stamped now
    pub fn record(&mut self, acronym: impl Into<String>, value: f64) {
        self.measurements.push(MeasurementValue {
            acronym: acronym.into(),
            value,
            recorded: Utc::now(),
        });
    }

    /// All recorded values as a lookup table.
    ///
    /// Later entries overwrite earlier ones, so the most recently added
    /// value per acronym wins.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        let mut table = BTreeMap::new();
        for measurement in &self.measurements {
            table.insert(measurement.acronym.clone(), measurement.value);
        }
        table
    }

    /// Lookup table restricted to the acronyms a metric defines
    pub fn snapshot_for(&self, metric: &Metric) -> BTreeMap<String, f64> {
        let mut table = BTreeMap::new();
        for measurement in &self.measurements {
            if metric.defines(&measurement.acronym) {
                table.insert(measurement.acronym.clone(), measurement.value);
            }
        }
        table
    }

    /// Structural issues, for `metria validate`
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.start_date >= self.end_date {
            issues.push(format!(
                "{}: start date {} must be before end date {}",
                self.id, self.start_date, self.end_date
            ));
        }
        for measurement in &self.measurements {
            if !measurement.value.is_finite() {
                issues.push(format!(
                    "{}: measurement '{}' has a non-finite value",
                    self.id, measurement.acronym
                ));
            }
        }

        issues
    }
}

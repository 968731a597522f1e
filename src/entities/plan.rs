//! Measurement plan entity - GQM objectives, questions and metrics
//!
//! The nesting is a concrete typed model: objectives own questions,
//! questions own metrics, metrics own measurement definitions. A metric's
//! formula references measurement acronyms that must be unique within
//! that metric's definition set (not globally).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::formula;

/// A measurement definition within a metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementDefinition {
    /// Short code used as the variable name inside formulas
    pub acronym: String,

    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Unit of measurement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A metric under a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name, unique within the plan
    pub name: String,

    /// What the metric expresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Arithmetic formula over the measurement acronyms, e.g. "HH / PF".
    /// Plan-scoped text, re-parsed at evaluation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Measurement definitions this metric draws on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measurements: Vec<MeasurementDefinition>,
}

impl Metric {
    /// Acronyms defined for this metric
    pub fn acronyms(&self) -> impl Iterator<Item = &str> {
        self.measurements.iter().map(|m| m.acronym.as_str())
    }

    /// True if the metric defines the given acronym
    pub fn defines(&self, acronym: &str) -> bool {
        self.measurements.iter().any(|m| m.acronym == acronym)
    }
}

/// A question under an objective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// The question text
    pub text: String,

    /// Metrics answering this question
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,
}

/// A measurement objective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    /// Objective title
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Questions refining this objective
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,
}

/// A measurement plan entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementPlan {
    /// Unique identifier (PLAN-...)
    pub id: EntityId,

    /// Plan title/name
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Measurement objectives
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objectives: Vec<Objective>,

    /// Classification tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

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

impl Entity for MeasurementPlan {
    const PREFIX: &'static str = "PLAN";

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

impl MeasurementPlan {
    /// Create a new empty plan
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Plan),
            title: title.into(),
            description: None,
            objectives: Vec::new(),
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            revision: 1,
        }
    }

    /// Iterate every metric in the plan, across objectives and questions
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.objectives
            .iter()
            .flat_map(|o| o.questions.iter())
            .flat_map(|q| q.metrics.iter())
    }

    /// Find a metric by name
    pub fn find_metric(&self, name: &str) -> Option<&Metric> {
        self.metrics().find(|m| m.name == name)
    }

    /// Structural issues, for `metria validate`
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let mut metric_names = HashSet::new();
        for metric in self.metrics() {
            if !metric_names.insert(metric.name.as_str()) {
                issues.push(format!(
                    "{}: duplicate metric name '{}'",
                    self.id, metric.name
                ));
            }

            let mut acronyms = HashSet::new();
            for definition in &metric.measurements {
                if !acronyms.insert(definition.acronym.as_str()) {
                    issues.push(format!(
                        "{}: metric '{}' defines acronym '{}' more than once",
                        self.id, metric.name, definition.acronym
                    ));
                }
            }

            if let Some(ref formula_text) = metric.formula {
                let validation = formula::validate(formula_text);
                if let Some(error) = validation.error {
                    issues.push(format!(
                        "{}: metric '{}' has an invalid formula: {}",
                        self.id, metric.name, error
                    ));
                }
            }
        }

        issues
    }
}

//! Estimate entity - one function point sizing exercise
//!
//! Carries the calculation configuration and the optional general system
//! characteristic scores. Calculation results are derived on demand and
//! never written back to the file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::fpa::calculation::ProjectConfig;
use crate::fpa::gsc::Gsc;

/// An estimate entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    /// Unique identifier (EST-...)
    pub id: EntityId,

    /// Estimate title/name
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Calculation configuration
    pub config: ProjectConfig,

    /// General system characteristic scores; absent means VAF 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gsc: Option<Gsc>,

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

impl Entity for Estimate {
    const PREFIX: &'static str = "EST";

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

impl Estimate {
    /// Create a new estimate with the given configuration
    pub fn new(title: impl Into<String>, config: ProjectConfig, author: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Est),
            title: title.into(),
            description: None,
            config,
            gsc: None,
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            revision: 1,
        }
    }

    /// Configuration issues, for `metria validate`
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.config.average_daily_working_hours < 0.0 {
            issues.push(format!(
                "{}: average daily working hours must not be negative",
                self.id
            ));
        }
        if self.config.hourly_rate_brl < 0.0 {
            issues.push(format!("{}: hourly rate must not be negative", self.id));
        }
        if let Some(factor) = self.config.productivity_factor {
            if factor <= 0.0 {
                issues.push(format!(
                    "{}: productivity factor must be positive when set",
                    self.id
                ));
            }
        }

        issues
    }
}

//! Component entity - a classified functional unit under an estimate
//!
//! Complexity and function points are never stored: they are pure
//! functions of the component type and the structural counts, recomputed
//! on every access so an edit can never leave a stale derived value
//! behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::EntityId;
use crate::fpa::calculation::ClassifiedComponent;
use crate::fpa::complexity::{
    classify_data_function, classify_input, classify_output, classify_special_query, weight,
    Complexity, ComponentType, QuerySide,
};

/// Separate input/output counts for a query measured on both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialQueryCounts {
    /// File types referenced on the input side
    pub input_ftr: u32,

    /// Data element types on the input side
    pub input_det: u32,

    /// File types referenced on the output side
    pub output_ftr: u32,

    /// Data element types on the output side
    pub output_det: u32,
}

/// A component entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Unique identifier
    pub id: EntityId,

    /// Owning estimate
    pub estimate: EntityId,

    /// Short name
    pub title: String,

    /// Functional category - fixed at creation
    #[serde(rename = "type")]
    pub component_type: ComponentType,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Record element types (data functions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_element_types: Option<u32>,

    /// File types referenced (transactional functions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_types_referenced: Option<u32>,

    /// Data element types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_element_types: Option<u32>,

    /// Separate input/output counts for a query measured on both sides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_query: Option<SpecialQueryCounts>,

    /// Tags for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this component)
    pub author: String,

    /// Revision number
    #[serde(default = "default_revision")]
    pub revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Component {
    const PREFIX: &'static str = "CMP";

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

impl Component {
    /// Create a new component under an estimate
    pub fn new(
        estimate: EntityId,
        component_type: ComponentType,
        title: String,
        author: String,
    ) -> Self {
        Self {
            id: EntityId::new(crate::core::EntityPrefix::Cmp),
            estimate,
            title,
            component_type,
            description: None,
            record_element_types: None,
            file_types_referenced: None,
            data_element_types: None,
            special_query: None,
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author,
            revision: 1,
        }
    }

    /// Derived complexity tier. Absent counts land in the lowest band.
    pub fn complexity(&self) -> Complexity {
        let det = self.data_element_types.unwrap_or(0);
        match self.component_type {
            ComponentType::Ali | ComponentType::Aie => {
                classify_data_function(self.record_element_types.unwrap_or(0), det)
            }
            ComponentType::Ei => classify_input(self.file_types_referenced.unwrap_or(0), det),
            ComponentType::Eo => classify_output(self.file_types_referenced.unwrap_or(0), det),
            ComponentType::Eq => match self.special_query {
                Some(counts) => {
                    classify_special_query(
                        counts.input_ftr,
                        counts.input_det,
                        counts.output_ftr,
                        counts.output_det,
                    )
                    .0
                }
                None => classify_output(self.file_types_referenced.unwrap_or(0), det),
            },
        }
    }

    /// For a two-sided query, which side decided the classification
    pub fn winning_side(&self) -> Option<QuerySide> {
        match (self.component_type, self.special_query) {
            (ComponentType::Eq, Some(counts)) => Some(
                classify_special_query(
                    counts.input_ftr,
                    counts.input_det,
                    counts.output_ftr,
                    counts.output_det,
                )
                .1,
            ),
            _ => None,
        }
    }

    /// Derived function point weight
    pub fn function_points(&self) -> u32 {
        weight(self.component_type, self.complexity())
    }

    /// View for the aggregation engine
    pub fn classified(&self) -> ClassifiedComponent {
        ClassifiedComponent {
            component_type: self.component_type,
            complexity: self.complexity(),
            function_points: self.function_points(),
        }
    }

    /// Structural consistency issues, for `metria validate`
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.special_query.is_some() && self.component_type != ComponentType::Eq {
            issues.push(format!(
                "{}: special query counts are only valid on EQ components",
                self.id
            ));
        }
        if self.component_type.is_data_function() && self.file_types_referenced.is_some() {
            issues.push(format!(
                "{}: data functions count record element types, not file types referenced",
                self.id
            ));
        }
        if !self.component_type.is_data_function() && self.record_element_types.is_some() {
            issues.push(format!(
                "{}: transactional functions count file types referenced, not record element types",
                self.id
            ));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityPrefix;

    fn new_component(component_type: ComponentType) -> Component {
        Component::new(
            EntityId::new(EntityPrefix::Est),
            component_type,
            "Customer file".to_string(),
            "test".to_string(),
        )
    }

    #[test]
    fn test_component_creation() {
        let cmp = new_component(ComponentType::Ali);
        assert!(cmp.id.to_string().starts_with("CMP-"));
        assert_eq!(cmp.title, "Customer file");
        assert_eq!(cmp.component_type, ComponentType::Ali);
        assert_eq!(cmp.status, Status::Draft);
    }

    #[test]
    fn test_derived_complexity_and_weight() {
        let mut cmp = new_component(ComponentType::Ali);
        cmp.record_element_types = Some(1);
        cmp.data_element_types = Some(15);
        assert_eq!(cmp.complexity(), Complexity::Low);
        assert_eq!(cmp.function_points(), 7);

        cmp.data_element_types = Some(25);
        assert_eq!(cmp.complexity(), Complexity::Average);
        assert_eq!(cmp.function_points(), 10);

        cmp.record_element_types = Some(6);
        cmp.data_element_types = Some(60);
        assert_eq!(cmp.complexity(), Complexity::High);
        assert_eq!(cmp.function_points(), 15);
    }

    #[test]
    fn test_edit_recomputes_derivation() {
        let mut cmp = new_component(ComponentType::Ei);
        cmp.file_types_referenced = Some(1);
        cmp.data_element_types = Some(4);
        assert_eq!(cmp.function_points(), 3);

        // A structural edit changes the derived values with it
        cmp.data_element_types = Some(20);
        assert_eq!(cmp.complexity(), Complexity::Average);
        assert_eq!(cmp.function_points(), 4);
    }

    #[test]
    fn test_absent_counts_default_to_lowest_band() {
        let cmp = new_component(ComponentType::Eo);
        assert_eq!(cmp.complexity(), Complexity::Low);
        assert_eq!(cmp.function_points(), 4);
    }

    #[test]
    fn test_special_query_uses_winning_side() {
        let mut cmp = new_component(ComponentType::Eq);
        cmp.special_query = Some(SpecialQueryCounts {
            input_ftr: 1,
            input_det: 4,
            output_ftr: 4,
            output_det: 20,
        });
        assert_eq!(cmp.complexity(), Complexity::High);
        assert_eq!(cmp.function_points(), 6);
        assert_eq!(cmp.winning_side(), Some(QuerySide::Output));
    }

    #[test]
    fn test_plain_query_without_special_counts() {
        let mut cmp = new_component(ComponentType::Eq);
        cmp.file_types_referenced = Some(2);
        cmp.data_element_types = Some(6);
        assert_eq!(cmp.complexity(), Complexity::Average);
        assert_eq!(cmp.function_points(), 4);
        assert_eq!(cmp.winning_side(), None);
    }

    #[test]
    fn test_validate_flags_special_counts_on_non_query() {
        let mut cmp = new_component(ComponentType::Ali);
        cmp.special_query = Some(SpecialQueryCounts {
            input_ftr: 1,
            input_det: 1,
            output_ftr: 1,
            output_det: 1,
        });
        let issues = cmp.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("EQ"));
    }

    #[test]
    fn test_validate_flags_wrong_count_kind() {
        let mut cmp = new_component(ComponentType::Ali);
        cmp.file_types_referenced = Some(2);
        assert_eq!(cmp.validate().len(), 1);

        let mut cmp = new_component(ComponentType::Ei);
        cmp.record_element_types = Some(2);
        assert_eq!(cmp.validate().len(), 1);
    }

    #[test]
    fn test_component_roundtrip() {
        let mut cmp = new_component(ComponentType::Aie);
        cmp.record_element_types = Some(3);
        cmp.data_element_types = Some(30);

        let yaml = serde_yml::to_string(&cmp).unwrap();
        let parsed: Component = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(cmp.id, parsed.id);
        assert_eq!(parsed.component_type, ComponentType::Aie);
        assert_eq!(parsed.complexity(), Complexity::Average);
        assert_eq!(parsed.function_points(), 7);
    }

    #[test]
    fn test_derived_fields_not_serialized() {
        let mut cmp = new_component(ComponentType::Ali);
        cmp.record_element_types = Some(1);
        cmp.data_element_types = Some(25);

        let yaml = serde_yml::to_string(&cmp).unwrap();
        assert!(!yaml.contains("complexity"));
        assert!(!yaml.contains("function_points"));
    }

    #[test]
    fn test_component_serializes_type_uppercase() {
        let cmp = new_component(ComponentType::Ali);
        let yaml = serde_yml::to_string(&cmp).unwrap();
        assert!(yaml.contains("type: ALI"));
    }
}

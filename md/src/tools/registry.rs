//! ToolRegistry - static table of tool handlers

use std::collections::HashMap;

use crate::llm::ToolDefinition;
use crate::phase::ToolId;

use super::catalog::{
    CreateGraduationProjectTool, CreateLearningMaterialTool, CreateQuizForGoalTool, CreateRoadmapSkeletonTool,
    EditRoadmapSkeletonTool, EvaluateGraduationAnswerTool,
};
use super::traits::Tool;

/// Maps each [`ToolId`] to its handler
///
/// Built once at startup; dispatch never goes through runtime reflection or
/// raw strings.
pub struct ToolRegistry {
    tools: HashMap<ToolId, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the full tool catalogue
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.add_tool(Box::new(CreateRoadmapSkeletonTool));
        registry.add_tool(Box::new(EditRoadmapSkeletonTool));
        registry.add_tool(Box::new(CreateLearningMaterialTool));
        registry.add_tool(Box::new(CreateQuizForGoalTool));
        registry.add_tool(Box::new(CreateGraduationProjectTool));
        registry.add_tool(Box::new(EvaluateGraduationAnswerTool));
        registry
    }

    /// Empty registry (for testing)
    pub fn empty() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Register a tool under its own id
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.id(), tool);
    }

    /// Look up a tool handler
    pub fn get(&self, id: ToolId) -> Option<&dyn Tool> {
        self.tools.get(&id).map(|t| t.as_ref())
    }

    /// Model-facing definitions for a subset of tools
    ///
    /// Only the eligible set ever reaches the model; a phase's catalogue is
    /// built from the phase decision, never from the full table.
    pub fn definitions_for(&self, ids: &[ToolId]) -> Vec<ToolDefinition> {
        ids.iter()
            .filter_map(|id| self.tools.get(id))
            .map(|t| ToolDefinition::new(t.id().name(), t.description(), t.input_schema()))
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_covers_all_tool_ids() {
        let registry = ToolRegistry::standard();
        for id in ToolId::ALL {
            assert!(registry.get(id).is_some(), "missing handler for {id}");
        }
    }

    #[test]
    fn test_definitions_for_subset() {
        let registry = ToolRegistry::standard();
        let defs = registry.definitions_for(&[ToolId::CreateRoadmapSkeleton, ToolId::EditRoadmapSkeleton]);

        assert_eq!(defs.len(), 2);
        assert!(defs.iter().any(|d| d.name == "createRoadmapSkeleton"));
        assert!(defs.iter().any(|d| d.name == "editRoadmapSkeleton"));
    }

    #[test]
    fn test_definitions_for_empty_set() {
        let registry = ToolRegistry::standard();
        assert!(registry.definitions_for(&[]).is_empty());
    }
}

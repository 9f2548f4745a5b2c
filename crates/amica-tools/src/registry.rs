// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of available tools, indexed by name.
//!
//! Single source of truth for "what tools exist". The registry provides tool
//! lookup for the executor and prompt-facing views for the LLM client.

use std::collections::HashMap;
use std::sync::Arc;

use amica_llm::{ArgumentPrompt, ToolSummary};

use crate::tool::Tool;

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool. The tool is indexed by its `name()`.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Looks up a tool by name.
    pub fn find(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names filtered by an optional allow-list
    /// (`None` = all), sorted alphabetically.
    pub fn list_names(&self, allowed: Option<&[String]>) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .keys()
            .filter(|name| match allowed {
                Some(list) => list.iter().any(|a| a == *name),
                None => true,
            })
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Prompt-facing name/description pairs, filtered like [`list_names`].
    ///
    /// [`list_names`]: ToolRegistry::list_names
    pub fn summaries(&self, allowed: Option<&[String]>) -> Vec<ToolSummary> {
        self.list_names(allowed)
            .into_iter()
            .filter_map(|name| self.tools.get(&name))
            .map(|tool| ToolSummary::new(tool.name(), tool.description()))
            .collect()
    }

    /// Everything the client needs to prompt for a tool's arguments.
    pub fn argument_prompt(&self, name: &str) -> Option<ArgumentPrompt> {
        self.tools.get(name).map(|tool| ArgumentPrompt {
            tool_name: tool.name().to_string(),
            instruction: tool.instruction().to_string(),
            schema: tool.parameters_schema(),
        })
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

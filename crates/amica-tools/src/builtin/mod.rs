// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools: time, file I/O, web search, and memory access.

pub mod file;
pub mod memory;
pub mod time;
pub mod web;

use std::sync::Arc;

use amica_core::AmicaError;
use amica_memory::MemoryService;

use crate::registry::ToolRegistry;

pub use file::{ReadFileTool, WriteFileTool};
pub use memory::{FetchMemoryTool, SaveMemoryTool, UpdateMemoryTool};
pub use time::CurrentTimeTool;
pub use web::WebSearchTool;

/// Tools that write to long-term memory. The orchestrator excludes these
/// from the main tool loop; they run only in the final memory step.
pub const MEMORY_WRITE_TOOLS: &[&str] = &["save_memory", "update_memory"];

/// Register all built-in tools.
///
/// Memory tools are always registered; when `memory` is `None` they report
/// the store as unavailable instead of being omitted.
pub fn register_builtins(
    registry: &mut ToolRegistry,
    memory: Option<Arc<MemoryService>>,
    fetch_limit: usize,
) -> Result<(), AmicaError> {
    registry.register(Arc::new(CurrentTimeTool));
    registry.register(Arc::new(ReadFileTool));
    registry.register(Arc::new(WriteFileTool));
    registry.register(Arc::new(WebSearchTool::new()?));
    registry.register(Arc::new(FetchMemoryTool::new(memory.clone(), fetch_limit)));
    registry.register(Arc::new(SaveMemoryTool::new(memory.clone())));
    registry.register(Arc::new(UpdateMemoryTool::new(memory)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_builtins() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry, None, 5).unwrap();

        assert_eq!(
            registry.list_names(None),
            vec![
                "fetch_memory",
                "get_current_time",
                "read_file",
                "save_memory",
                "search_web",
                "update_memory",
                "write_file",
            ]
        );
    }

    #[test]
    fn memory_write_tools_are_registered_names() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry, None, 5).unwrap();
        for name in MEMORY_WRITE_TOOLS {
            assert!(registry.find(name).is_some(), "{name} must be registered");
        }
    }
}

// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool system for the Amica companion agent.
//!
//! Declares the [`Tool`] trait, the registry of available tools, the
//! executor that validates arguments and translates every failure into the
//! `"Error: ..."` string convention, and the built-in tool set.

pub mod builtin;
pub mod executor;
pub mod registry;
pub mod tool;

pub use builtin::{MEMORY_WRITE_TOOLS, register_builtins};
pub use executor::ToolExecutor;
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolOutput};

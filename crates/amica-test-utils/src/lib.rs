// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Amica integration tests.

pub mod mock_backend;
pub mod mock_embedder;

pub use mock_backend::{MockBackend, ScriptedResponse};
pub use mock_embedder::MockEmbedder;

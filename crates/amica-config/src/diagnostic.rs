// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic error types for configuration loading and validation.
//!
//! Figment deserialization errors and post-load validation failures are
//! converted into miette diagnostics so the binary can render readable,
//! code-tagged error reports at startup.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error suitable for diagnostic rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A TOML parse or deserialization failure.
    #[error("failed to load configuration: {message}")]
    #[diagnostic(
        code(amica::config::parse),
        help("check amica.toml for unknown keys or mistyped values")
    )]
    Parse {
        /// Description of the deserialization failure.
        message: String,
    },

    /// A semantic validation failure for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(amica::config::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

/// Convert a figment error into diagnostic config errors.
///
/// Figment aggregates multiple failures into one error value; each is
/// surfaced as its own diagnostic.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Parse {
            message: e.to_string(),
        })
        .collect()
}

/// Render all config errors to stderr as miette reports.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        let report = miette::Report::msg(format!("{error}"));
        eprintln!("{report:?}");
    }
}

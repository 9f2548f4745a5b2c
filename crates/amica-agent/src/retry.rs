// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry budgets shared by the orchestrator's retry sites.

use std::time::Duration;

use amica_config::model::RetryConfig;

/// How many retries a step is granted after its initial attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBudget {
    /// The first failure is terminal for the step.
    Disabled,
    /// N retries after the initial attempt (N+1 attempts total).
    Limited(u32),
    /// Retry until something else stops the loop.
    Unbounded,
}

impl RetryBudget {
    /// Interpret a config value: `-1` unbounded, `0` disabled, positive N
    /// limited.
    pub fn from_config(value: i64) -> Self {
        match value {
            -1 => RetryBudget::Unbounded,
            n if n > 0 => RetryBudget::Limited(n as u32),
            _ => RetryBudget::Disabled,
        }
    }

    /// Whether the 0-based attempt index is within budget.
    ///
    /// The initial attempt (index 0) is always allowed.
    pub fn allows(self, attempt: u32) -> bool {
        match self {
            RetryBudget::Disabled => attempt == 0,
            RetryBudget::Limited(n) => attempt <= n,
            RetryBudget::Unbounded => true,
        }
    }
}

/// The orchestrator's full retry configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Budget for the tool-selection decision call.
    pub tool_select: RetryBudget,
    /// Budget for argument generation + execution of a chosen tool.
    pub tool_use: RetryBudget,
    /// Budget for the final memory-write step.
    pub final_memory: RetryBudget,
    /// Base delay between retry attempts.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            tool_select: RetryBudget::from_config(config.tool_select_retry),
            tool_use: RetryBudget::from_config(config.tool_use_retry),
            final_memory: RetryBudget::from_config(config.final_memory_retry),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }

    /// A policy with no delays, for tests and interactive use.
    pub fn without_delay(mut self) -> Self {
        self.retry_delay = Duration::ZERO;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_mapping() {
        assert_eq!(RetryBudget::from_config(-1), RetryBudget::Unbounded);
        assert_eq!(RetryBudget::from_config(0), RetryBudget::Disabled);
        assert_eq!(RetryBudget::from_config(5), RetryBudget::Limited(5));
    }

    #[test]
    fn disabled_allows_only_initial_attempt() {
        let budget = RetryBudget::Disabled;
        assert!(budget.allows(0));
        assert!(!budget.allows(1));
    }

    #[test]
    fn limited_allows_n_plus_one_attempts() {
        let budget = RetryBudget::Limited(2);
        assert!(budget.allows(0));
        assert!(budget.allows(1));
        assert!(budget.allows(2));
        assert!(!budget.allows(3));
    }

    #[test]
    fn unbounded_always_allows() {
        let budget = RetryBudget::Unbounded;
        assert!(budget.allows(0));
        assert!(budget.allows(10_000));
    }

    #[test]
    fn policy_defaults_match_config_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.tool_select, RetryBudget::Limited(5));
        assert_eq!(policy.tool_use, RetryBudget::Limited(10));
        assert_eq!(policy.final_memory, RetryBudget::Limited(10));
        assert_eq!(policy.retry_delay, Duration::from_secs(2));
    }
}

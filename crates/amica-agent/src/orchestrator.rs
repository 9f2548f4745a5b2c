// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-turn state machine.
//!
//! One turn runs, strictly in order: memory retrieval, history append, the
//! main tool loop, the optional final memory write, and final response
//! generation. Every failure mode resolves to a string: nothing errors
//! across the caller boundary, and the caller always receives the list of
//! tool calls that did succeed.

use std::sync::Arc;

use amica_core::{ChatMessage, ChatRole, RetrievedFact, ToolCallRecord};
use amica_llm::{LlmClient, ToolSummary};
use amica_memory::MemoryService;
use amica_tools::{MEMORY_WRITE_TOOLS, ToolExecutor, ToolRegistry};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::{ContextProfile, TurnContext};
use crate::error_analyzer::{ErrorAnalyzer, ErrorCategory};
use crate::history::HistoryManager;
use crate::retry::{RetryBudget, RetryPolicy};

/// Personality used when a profile supplies no system messages at all.
const FALLBACK_PERSONALITY: &str = "You are a helpful assistant.";

/// Guidance for the final memory decision.
const FINAL_MEMORY_GUIDANCE: &str =
    "Before finishing, decide whether anything from this conversation should be persisted \
     to long-term memory. Choose 'save_memory' for new information worth keeping, \
     'update_memory' only when correcting a fact whose id appears in previously retrieved \
     facts, or no tool when nothing needs to be persisted.";

/// Outcome of one tool call after all retries.
enum ToolRunOutcome {
    Success {
        arguments: serde_json::Map<String, Value>,
        result: String,
    },
    Failure {
        arguments: Option<serde_json::Map<String, Value>>,
        error: String,
    },
}

/// Drives a full conversation turn for one session.
///
/// One instance per session; the bounded history lives here. The memory
/// store is the only collaborator shared across sessions.
pub struct Orchestrator {
    llm: Arc<LlmClient>,
    registry: Arc<ToolRegistry>,
    executor: Arc<ToolExecutor>,
    memory: Option<Arc<MemoryService>>,
    profile: Box<dyn ContextProfile>,
    history: HistoryManager,
    analyzer: ErrorAnalyzer,
    retry: RetryPolicy,
    retrieval_limit: usize,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: Arc<LlmClient>,
        registry: Arc<ToolRegistry>,
        executor: Arc<ToolExecutor>,
        memory: Option<Arc<MemoryService>>,
        profile: Box<dyn ContextProfile>,
        max_history_messages: usize,
        retry: RetryPolicy,
        retrieval_limit: usize,
    ) -> Self {
        Self {
            llm,
            registry,
            executor,
            memory,
            profile,
            history: HistoryManager::new(max_history_messages),
            analyzer: ErrorAnalyzer::new(),
            retry,
            retrieval_limit,
        }
    }

    /// The session transcript.
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Clears the session transcript. Invoked by the caller, never
    /// internally.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Process one user message and return the final response text plus the
    /// tool calls that succeeded this turn.
    pub async fn process_turn(
        &mut self,
        user_message: &str,
        ctx: &TurnContext,
    ) -> (String, Vec<ToolCallRecord>) {
        let base_system = self.profile.base_system_messages(ctx);

        // Step 1: memory retrieval. Exactly once per turn, unconditional.
        let memory_context = self.retrieve_memory_context(user_message).await;

        // Step 2: the (possibly profile-transformed) user message enters
        // history before any tool activity.
        let prepared = self.profile.prepare_user_message(user_message, ctx);
        self.history.add_message(ChatRole::User, prepared);

        let mut tool_calls: Vec<ToolCallRecord> = Vec::new();

        // Step 3: main tool loop. Memory-write tools are reserved for the
        // final memory step.
        let allowed = self.profile.allowed_tools();
        let main_summaries: Vec<ToolSummary> = self
            .registry
            .summaries(allowed.as_deref())
            .into_iter()
            .filter(|t| !MEMORY_WRITE_TOOLS.contains(&t.name.as_str()))
            .collect();
        let max_tool_calls = self.profile.max_tool_calls();

        for iteration in 0..max_tool_calls {
            let Some(tool_name) = self.select_tool(&base_system, &main_summaries).await else {
                debug!(iteration, context = self.profile.name(), "no further tools needed");
                break;
            };
            info!(tool = %tool_name, iteration, "main loop chose tool");

            let outcome = self
                .run_tool(
                    &tool_name,
                    &base_system,
                    memory_context.as_deref(),
                    self.retry.tool_use,
                )
                .await;
            match outcome {
                ToolRunOutcome::Success { arguments, result } => {
                    self.push_tool_status(&tool_name, Some(&arguments), &result, true);
                    tool_calls.push(ToolCallRecord {
                        tool_name: tool_name.clone(),
                        arguments: Value::Object(arguments),
                        result,
                        timestamp: chrono::Utc::now(),
                    });
                }
                ToolRunOutcome::Failure { arguments, error } => {
                    warn!(tool = %tool_name, error = %error, "tool failed, ending main loop");
                    self.push_tool_status(&tool_name, arguments.as_ref(), &error, false);
                    break;
                }
            }
        }

        // Step 4: final memory write, after all information-gathering has
        // run and the model has full context of what was learned.
        if let Some(tool_name) = self
            .final_memory_choice(&base_system, allowed.as_deref(), memory_context.as_deref())
            .await
        {
            info!(tool = %tool_name, "final memory step chose tool");
            let outcome = self
                .run_tool(
                    &tool_name,
                    &base_system,
                    memory_context.as_deref(),
                    self.retry.final_memory,
                )
                .await;
            match outcome {
                ToolRunOutcome::Success { arguments, result } => {
                    self.push_tool_status(&tool_name, Some(&arguments), &result, true);
                    tool_calls.push(ToolCallRecord {
                        tool_name,
                        arguments: Value::Object(arguments),
                        result,
                        timestamp: chrono::Utc::now(),
                    });
                }
                ToolRunOutcome::Failure { arguments, error } => {
                    self.push_tool_status(&tool_name, arguments.as_ref(), &error, false);
                }
            }
        } else {
            debug!("no final memory write needed");
        }

        // Step 5: final response.
        self.generate_final(&base_system, memory_context.as_deref(), tool_calls)
            .await
    }

    /// Embed the raw user message and pull the most relevant facts.
    ///
    /// Failures are non-fatal; the turn proceeds without memory context.
    async fn retrieve_memory_context(&self, user_message: &str) -> Option<String> {
        let memory = self.memory.as_ref()?;
        match memory
            .retrieve_by_similarity(user_message, self.retrieval_limit)
            .await
        {
            Ok(facts) if !facts.is_empty() => {
                info!(count = facts.len(), "retrieved relevant facts from memory");
                Some(format_memory_context(&facts))
            }
            Ok(_) => {
                debug!("no relevant facts in memory");
                None
            }
            Err(e) => {
                warn!(error = %e, "memory retrieval failed (non-fatal)");
                None
            }
        }
    }

    /// Tool selection under the tool-select budget.
    ///
    /// Fresh history each attempt; a retry-context system message is added
    /// on attempts past the first. Exhausted retries read as a null choice.
    async fn select_tool(
        &mut self,
        base_system: &[ChatMessage],
        summaries: &[ToolSummary],
    ) -> Option<String> {
        let budget = self.retry.tool_select;
        let mut attempt: u32 = 0;

        loop {
            if !budget.allows(attempt) {
                warn!("tool selection retries exhausted, treating as null choice");
                return None;
            }
            if attempt > 0 && !self.retry.retry_delay.is_zero() {
                tokio::time::sleep(self.retry.retry_delay).await;
            }

            let mut messages = base_system.to_vec();
            messages.extend(self.history.get_history());
            if attempt > 0 {
                messages.push(ChatMessage::system(
                    "RETRY CONTEXT: The previous attempt to choose the next tool failed. \
                     Choose again, or respond with {\"tool_name\": null} if no tool is needed.",
                ));
            }

            match self.llm.decide_next_action(&messages, summaries, None).await {
                Ok(choice) => return choice,
                Err(e) => {
                    warn!(attempt, error = %e, "tool selection failed");
                    attempt += 1;
                }
            }
        }
    }

    /// Argument generation + execution under the given budget.
    ///
    /// Every retry regenerates arguments, informed by the analyzer's
    /// guidance for the previous failure. Argument-generation failures and
    /// execution failures share one failure signal.
    async fn run_tool(
        &mut self,
        tool_name: &str,
        base_system: &[ChatMessage],
        memory_context: Option<&str>,
        budget: RetryBudget,
    ) -> ToolRunOutcome {
        let Some(prompt) = self.registry.argument_prompt(tool_name) else {
            return ToolRunOutcome::Failure {
                arguments: None,
                error: format!("Error: Could not find definition for tool '{tool_name}'."),
            };
        };

        let mut attempt: u32 = 0;
        let mut retry_guidance: Option<String> = None;
        let mut delay_multiplier: f64 = 1.0;

        loop {
            if attempt > 0 {
                let delay = self.retry.retry_delay.mul_f64(delay_multiplier);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            let mut messages = base_system.to_vec();
            messages.extend(self.history.get_history());
            if let Some(guidance) = &retry_guidance {
                messages.push(ChatMessage::system(format!("RETRY CONTEXT: {guidance}")));
            }

            let arguments = match self.llm.generate_tool_arguments(&prompt, &messages).await {
                Ok(args) => args,
                Err(e) => {
                    warn!(tool = tool_name, attempt, error = %e, "argument generation failed");
                    attempt += 1;
                    if !budget.allows(attempt) {
                        return ToolRunOutcome::Failure {
                            arguments: None,
                            error: format!(
                                "Error: Failed to generate arguments for tool '{tool_name}'. {e}"
                            ),
                        };
                    }
                    retry_guidance = Some(format!(
                        "The previous attempt failed to produce valid arguments for \
                         '{tool_name}'. Respond with a valid JSON object only."
                    ));
                    delay_multiplier = 1.0;
                    continue;
                }
            };

            let result = self.executor.execute(tool_name, &arguments).await;
            debug!(tool = tool_name, attempt, "tool executed");

            if !result.starts_with("Error:") {
                return ToolRunOutcome::Success { arguments, result };
            }

            let (category, guidance) = self.analyzer.analyze(&result, tool_name, &arguments);
            warn!(tool = tool_name, category = %category, attempt, "tool returned an error");

            let strategy = self.analyzer.retry_strategy(category, attempt);
            attempt += 1;
            if !strategy.should_retry || !budget.allows(attempt) {
                return ToolRunOutcome::Failure {
                    arguments: Some(arguments),
                    error: result,
                };
            }

            let mut full_guidance = guidance;
            for note in &strategy.notes {
                full_guidance.push_str(&format!(" {note}."));
            }
            // Memory-id retries also carry the retrieved-facts block.
            if category == ErrorCategory::MemoryIdError
                && let Some(ctx) = memory_context
            {
                full_guidance.push_str(&format!("\n{ctx}"));
            }
            retry_guidance = Some(full_guidance);
            delay_multiplier = strategy.delay_multiplier;
        }
    }

    /// One decision forced to {save_memory, update_memory, null}.
    ///
    /// A decision failure reads as null: the turn proceeds to the final
    /// response without a memory write.
    async fn final_memory_choice(
        &mut self,
        base_system: &[ChatMessage],
        allowed: Option<&[String]>,
        memory_context: Option<&str>,
    ) -> Option<String> {
        let summaries = self.registry.summaries(allowed);

        let mut messages = base_system.to_vec();
        messages.extend(self.history.get_history());
        if let Some(ctx) = memory_context {
            messages.push(ChatMessage::system(ctx.to_string()));
        }
        messages.push(ChatMessage::system(FINAL_MEMORY_GUIDANCE));

        match self
            .llm
            .decide_next_action(&messages, &summaries, Some(MEMORY_WRITE_TOOLS))
            .await
        {
            Ok(choice) => choice,
            Err(e) => {
                warn!(error = %e, "final memory decision failed, skipping memory write");
                None
            }
        }
    }

    /// Assemble the final prompt and generate the response.
    ///
    /// On error the error string itself becomes the visible response; the
    /// accumulated tool calls are returned either way.
    async fn generate_final(
        &mut self,
        base_system: &[ChatMessage],
        memory_context: Option<&str>,
        tool_calls: Vec<ToolCallRecord>,
    ) -> (String, Vec<ToolCallRecord>) {
        let personality = base_system
            .first()
            .map(|m| m.content.clone())
            .unwrap_or_else(|| FALLBACK_PERSONALITY.to_string());

        let mut messages: Vec<ChatMessage> = Vec::new();
        if base_system.is_empty() {
            messages.push(ChatMessage::system(FALLBACK_PERSONALITY));
        } else {
            messages.extend_from_slice(base_system);
        }
        messages.extend(self.history.get_history());
        // Appended last so the retrieved facts carry the highest recency
        // weight in the final prompt.
        if let Some(ctx) = memory_context {
            messages.push(ChatMessage::system(ctx.to_string()));
        }

        match self.llm.generate_final_response(&messages, &personality).await {
            Ok(text) => {
                self.history.add_message(ChatRole::Assistant, text.clone());
                (text, tool_calls)
            }
            Err(e) => {
                warn!(error = %e, "final response generation failed");
                (format!("Error: {e}"), tool_calls)
            }
        }
    }

    /// Append a status-tagged tool result to history.
    fn push_tool_status(
        &mut self,
        tool_name: &str,
        arguments: Option<&serde_json::Map<String, Value>>,
        result: &str,
        ok: bool,
    ) {
        let arguments_value = match arguments {
            Some(map) => Value::Object(map.clone()),
            None => Value::String("N/A (argument generation failed)".to_string()),
        };
        let status = if ok { "ok" } else { "error" };
        let payload = serde_json::json!({
            "tool_used": tool_name,
            "arguments": arguments_value,
            "result": result,
            "status": status,
        });
        self.history.add_message(ChatRole::System, payload.to_string());
    }
}

/// Format retrieved facts into the prioritized memory context block.
///
/// Fact ids are included so a later update_memory call can reference them.
fn format_memory_context(facts: &[RetrievedFact]) -> String {
    let mut block = String::from(
        "CRITICAL INSTRUCTION: The following information was retrieved from memory and is \
         highly relevant to the user's query. Prioritize these facts in your response when \
         they directly answer the query.\n\nRelevant information from memory:\n",
    );
    for fact in facts {
        block.push_str(&format!("- [id: {}] {}\n", fact.id, fact.content));
    }
    block.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_context_block_lists_facts_with_ids() {
        let facts = vec![
            RetrievedFact {
                id: "f1".into(),
                content: "User likes coffee".into(),
            },
            RetrievedFact {
                id: "f2".into(),
                content: "User lives in Berlin".into(),
            },
        ];
        let block = format_memory_context(&facts);
        assert!(block.starts_with("CRITICAL INSTRUCTION:"));
        assert!(block.contains("- [id: f1] User likes coffee"));
        assert!(block.contains("- [id: f2] User lives in Berlin"));
    }
}

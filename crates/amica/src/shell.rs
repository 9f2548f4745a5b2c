// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive chat shell.
//!
//! Wires the real components together (SQLite fact store, HTTP embedder,
//! provider backend, tool registry, orchestrator) and runs a readline REPL
//! with a colored prompt. Creates a fresh session per invocation.

use std::sync::Arc;

use amica_agent::{ChatProfile, Orchestrator, RetryPolicy, TurnContext};
use amica_config::AmicaConfig;
use amica_core::{AmicaError, ChatBackend};
use amica_llm::{
    DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_MODEL, GeminiBackend, LlmClient, OpenAiBackend,
};
use amica_memory::{FactStore, HttpEmbedder, MemoryService};
use amica_tools::{ToolExecutor, ToolRegistry, register_builtins};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{info, warn};

/// Runs the interactive chat REPL.
pub async fn run_shell(config: AmicaConfig) -> Result<(), AmicaError> {
    let memory = initialize_memory(&config).await;

    let backend: Arc<dyn ChatBackend> = match config.llm.provider.as_str() {
        "gemini" => Arc::new(GeminiBackend::new(config.llm.gemini_base_url.clone())?),
        _ => Arc::new(OpenAiBackend::new(config.llm.openai_base_url.clone())?),
    };
    let model = config.llm.model.clone().unwrap_or_else(|| {
        match config.llm.provider.as_str() {
            "gemini" => DEFAULT_GEMINI_MODEL,
            _ => DEFAULT_OPENAI_MODEL,
        }
        .to_string()
    });
    let llm = Arc::new(
        LlmClient::new(backend, model, config.llm.api_keys().to_vec())?
            .with_token_limits(config.llm.max_tokens, config.llm.decision_max_tokens),
    );
    info!(provider = %config.llm.provider, model = llm.model(), "LLM client ready");

    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, memory.clone(), config.memory.fetch_limit)?;
    info!(tools = registry.len(), "tool registry initialized");
    let registry = Arc::new(registry);
    let executor = Arc::new(ToolExecutor::new(registry.clone(), llm.clone()));

    let profile = Box::new(ChatProfile::new(
        config.agent.personality.clone(),
        config.chat.allowed_tools.clone(),
        config.chat.max_tool_calls,
    ));

    let mut orchestrator = Orchestrator::new(
        llm,
        registry,
        executor,
        memory,
        profile,
        config.agent.max_history_messages,
        RetryPolicy::from_config(&config.retry),
        config.memory.retrieval_limit,
    );

    let mut editor = DefaultEditor::new()
        .map_err(|e| AmicaError::Internal(format!("failed to initialize readline: {e}")))?;

    println!(
        "{}",
        format!(
            "{} is listening. Type /quit to exit, /clear to reset the conversation.",
            config.agent.name
        )
        .dimmed()
    );

    loop {
        match editor.readline(&format!("{} ", "you>".cyan().bold())) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" || line == "/exit" {
                    break;
                }
                if line == "/clear" {
                    orchestrator.clear_history();
                    println!("{}", "conversation cleared".dimmed());
                    continue;
                }
                let _ = editor.add_history_entry(&line);

                let (response, tool_calls) =
                    orchestrator.process_turn(&line, &TurnContext::new()).await;
                for call in &tool_calls {
                    println!("{}", format!("[tool] {}", call.tool_name).dimmed());
                }
                println!(
                    "{} {}",
                    format!("{}>", config.agent.name).magenta().bold(),
                    response
                );
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                warn!(error = %e, "readline error");
                break;
            }
        }
    }

    Ok(())
}

/// Open the fact store and embedder, run the startup duplicate sweep.
///
/// All failures degrade to running without memory; the memory tools then
/// report the store as unavailable.
async fn initialize_memory(config: &AmicaConfig) -> Option<Arc<MemoryService>> {
    if !config.memory.enabled {
        info!("memory system disabled by configuration");
        return None;
    }

    let Some(api_key) = config
        .memory
        .embedding_api_key
        .clone()
        .or_else(|| config.llm.openai_api_keys.first().cloned())
    else {
        warn!("no embedding API key available, continuing without memory");
        return None;
    };

    let store = match FactStore::open(&config.memory.database_path).await {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "failed to open fact store, continuing without memory");
            return None;
        }
    };

    let embedder = match HttpEmbedder::new(
        config.memory.embedding_base_url.clone(),
        config.memory.embedding_model.clone(),
        api_key,
    ) {
        Ok(embedder) => embedder,
        Err(e) => {
            warn!(error = %e, "failed to build embedder, continuing without memory");
            return None;
        }
    };

    let service = Arc::new(MemoryService::new(
        store,
        Arc::new(embedder),
        config.memory.similarity_threshold,
    ));

    match service.cleanup_duplicates().await {
        Ok(removed) => info!(removed, "startup duplicate sweep complete"),
        Err(e) => warn!(error = %e, "startup duplicate sweep failed"),
    }

    Some(service)
}

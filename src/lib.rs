pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod sanitize;
pub mod server;

use agent::RelayAgent;
use cli::Args;
use config::prompt;
use error::RelayError;
use history::initialize_conversation_store;
use llm::chat::new_client as new_chat_client;
use llm::{ parse_llm_type, LlmConfig };
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Chat Timeout: {}s", args.chat_timeout_secs);
    info!("History Store Type: {}", args.history_type);
    info!("Conversation Capacity: {}", args.conversation_capacity);
    info!("Conversation Idle TTL: {}s", args.conversation_idle_secs);
    info!("Base Prompt Path: {}", args.base_prompt_path);
    info!("-------------------------");

    let chat_llm_type = parse_llm_type(&args.chat_llm_type)?;
    let chat_api_key = if !args.chat_api_key.is_empty() {
        Some(args.chat_api_key.clone())
    } else {
        None
    };
    let chat_config = LlmConfig {
        llm_type: chat_llm_type,
        api_key: chat_api_key,
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        timeout_secs: args.chat_timeout_secs,
    };
    let chat_client = new_chat_client(&chat_config)?;
    info!(
        "Chat client configured: Type={}, Model={:?}, BaseURL={:?}",
        args.chat_llm_type,
        chat_config.completion_model.as_deref().unwrap_or("adapter default"),
        chat_config.base_url.as_deref().unwrap_or("adapter default")
    );

    let base_prompt = prompt::load_base_prompt(&args.base_prompt_path)
        .map_err(|e| RelayError::Prompt(e.to_string()))?;
    let system_prompt = prompt::compose_system_prompt(&base_prompt);
    info!("System prompt composed ({} chars)", system_prompt.len());

    let conversation_store = initialize_conversation_store(&args, system_prompt)?;
    let agent = Arc::new(RelayAgent::new(chat_client, conversation_store));

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args.clone());
    server.run().await?;

    Ok(())
}

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Conversation Store Args ---
    /// Conversation history store type (memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// Maximum number of live conversations before the least recently
    /// used one is dropped. 0 disables the bound.
    #[arg(long, env = "CONVERSATION_CAPACITY", default_value = "1024")]
    pub conversation_capacity: usize,

    /// Seconds a conversation may sit idle before eviction. 0 disables
    /// the idle sweep.
    #[arg(long, env = "CONVERSATION_IDLE_SECS", default_value = "1800")]
    pub conversation_idle_secs: u64,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (groq, openai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "groq")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., https://api.groq.com)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (Groq, OpenAI)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., llama-3.3-70b-versatile)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Timeout in seconds for one completion round trip.
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "30")]
    pub chat_timeout_secs: u64,

    // --- Prompt Args ---
    /// Path to the base prompt file supplied by the prompt-assembly
    /// collaborator.
    #[arg(long, env = "BASE_PROMPT_PATH", default_value = "prompts/web3_prompt.txt")]
    pub base_prompt_path: String,

    // --- General App Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:5000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

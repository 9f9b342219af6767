//! Configuration for the Guru server
//!
//! CLI arguments with environment variable fallbacks. A `.env` file is
//! loaded by `main` before parsing.

use clap::Parser;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Longest session lifetime accepted from configuration.
pub const MAX_SESSION_TTL_DAYS: i64 = 365;

/// Guru - teaching assistant API for multi-grade classrooms
#[derive(Parser, Debug, Clone)]
#[command(name = "guru-server")]
#[command(about = "Teaching assistant API for multi-grade classrooms")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub llm_base_url: String,

    /// Model name sent with every completion
    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// API key for the LLM endpoint (optional for local servers)
    #[arg(long, env = "LLM_API_KEY")]
    pub llm_api_key: Option<String>,

    /// Google Cloud API key for Vision, Translate and Speech
    #[arg(long, env = "GOOGLE_API_KEY")]
    pub google_api_key: Option<String>,

    /// Comma-separated `user:token` pairs accepted as bearer tokens
    #[arg(long, env = "API_TOKENS")]
    pub api_tokens: Option<String>,

    /// Enable development mode (any caller is `dev-teacher`, mock Google services)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Timeout for outbound HTTP calls in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "60000")]
    pub request_timeout_ms: u64,

    /// Largest accepted upload in bytes
    #[arg(long, env = "MAX_IMAGE_BYTES", default_value = "10485760")]
    pub max_image_bytes: usize,

    /// Days a conversation session lives without activity
    #[arg(long, env = "SESSION_TTL_DAYS", default_value = "7")]
    pub session_ttl_days: i64,

    /// Per-agent timeout in milliseconds, replacing the estimate-based default
    #[arg(long, env = "CAPABILITY_TIMEOUT_MS")]
    pub capability_timeout_ms: Option<u64>,

    /// YAML file with extra concept differentiation rules
    #[arg(long, env = "CURRICULUM_FILE")]
    pub curriculum_file: Option<PathBuf>,
}

impl Args {
    /// Parse `API_TOKENS` into a token → user map.
    pub fn token_map(&self) -> Result<HashMap<String, String>, String> {
        let Some(raw) = self.api_tokens.as_deref() else {
            return Ok(HashMap::new());
        };

        let mut tokens = HashMap::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (user, token) = pair
                .split_once(':')
                .map(|(u, t)| (u.trim(), t.trim()))
                .filter(|(u, t)| !u.is_empty() && !t.is_empty())
                .ok_or_else(|| format!("API_TOKENS entry '{pair}' is not user:token"))?;
            tokens.insert(token.to_string(), user.to_string());
        }
        Ok(tokens)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let tokens = self.token_map()?;

        if !self.dev_mode {
            if tokens.is_empty() {
                return Err("API_TOKENS is required in production mode".to_string());
            }
            if self.google_api_key.is_none() {
                return Err("GOOGLE_API_KEY is required in production mode".to_string());
            }
        }

        if self.max_image_bytes == 0 {
            return Err("MAX_IMAGE_BYTES must be greater than zero".to_string());
        }
        if self.session_ttl_days <= 0 {
            return Err("SESSION_TTL_DAYS must be at least one day".to_string());
        }
        if self.session_ttl_days > MAX_SESSION_TTL_DAYS {
            return Err(format!("SESSION_TTL_DAYS must be at most {MAX_SESSION_TTL_DAYS}"));
        }
        if self.capability_timeout_ms == Some(0) {
            return Err("CAPABILITY_TIMEOUT_MS must be greater than zero".to_string());
        }
        if let Some(path) = &self.curriculum_file {
            if !path.is_file() {
                return Err(format!("CURRICULUM_FILE {} does not exist", path.display()));
            }
        }

        Ok(())
    }
}

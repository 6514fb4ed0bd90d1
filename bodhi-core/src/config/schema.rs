//! Configuration schema definitions

use crate::session::{Persona, SessionLimits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default persona instruction for the Bodhi Guide assistant
pub const DEFAULT_PERSONA_INSTRUCTION: &str = "You are Bodhi Guide, a knowledgeable and friendly AI assistant for Divine Destinations, specializing in Bodh Gaya and the Mahabodhi Temple. 

Your knowledge includes:
- Mahabodhi Temple: UNESCO World Heritage Site where Buddha attained enlightenment, 55m tall, built by Emperor Ashoka
- Buddha's Enlightenment: Occurred under the Bodhi Tree after 49 days of meditation, around 2500 years ago
- Visiting Hours: Temple 5AM-9PM, Meditation Park 5AM-6PM, Museum 10AM-5PM (closed Fridays)
- Best time to visit: October to March (15-25°C), December for Bodhi Day
- Nearby attractions: Thai Monastery, Great Buddha Statue (80ft), Royal Bhutan Monastery, Vietnamese Temple, Japanese Temple, Dungeshwari Cave, Archaeological Museum
- Getting there: Gaya Airport (12km), Gaya Junction (16km), then auto/taxi to Bodh Gaya
- Accommodation: Budget monasteries (free/donation), mid-range hotels, luxury options
- Etiquette: Modest dress, remove shoes, walk clockwise, no photography inside main temple
- Food: Mostly vegetarian, Thai Temple free lunch at 12PM
- Emergency contacts: 112 (emergency), Tourist Police: +91-631-2200795

Always be helpful, respectful, and provide accurate information. Use emojis appropriately. If unsure, admit it and suggest alternatives.";

/// Default persona acknowledgment
pub const DEFAULT_PERSONA_ACKNOWLEDGMENT: &str = "Understood. I am Bodhi Guide, ready to help visitors explore the sacred land of Bodh Gaya and the Mahabodhi Temple. 🙏";

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream model configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Assistant persona
    #[serde(default)]
    pub persona: PersonaConfig,
    /// Session registry bounds
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Upstream generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for the Generative Language API
    #[serde(default)]
    pub api_key: String,
    /// Override for the API base URL
    #[serde(default)]
    pub api_base: Option<String>,
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Nucleus sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Top-k sampling cutoff
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Maximum output length in tokens
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Whether an API key has been configured
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// API key masked for display
    pub fn masked_api_key(&self) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            return String::new();
        }
        let chars: Vec<char> = key.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("****{}", tail)
    }
}

/// Assistant persona seeded into every session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_instruction")]
    pub instruction: String,
    #[serde(default = "default_acknowledgment")]
    pub acknowledgment: String,
}

fn default_instruction() -> String {
    DEFAULT_PERSONA_INSTRUCTION.to_string()
}

fn default_acknowledgment() -> String {
    DEFAULT_PERSONA_ACKNOWLEDGMENT.to_string()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            instruction: default_instruction(),
            acknowledgment: default_acknowledgment(),
        }
    }
}

impl PersonaConfig {
    pub fn to_persona(&self) -> Persona {
        Persona::new(self.instruction.clone(), self.acknowledgment.clone())
    }
}

/// Bounds on the in-memory session registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Most sessions kept at once; the least recently used is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Sessions unused for this long are evicted
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_max_sessions() -> usize {
    1000
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl SessionsConfig {
    pub fn to_limits(&self) -> SessionLimits {
        SessionLimits {
            max_sessions: self.max_sessions,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}

use crate::emotion::{EmotionSpace, EmotionSpaceError, Regime};
use crate::prompt::PromptOverrides;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuraConfig {
    pub db_path: Option<String>,
    pub llm: LlmConfig,
    pub limbic: LimbicConfig,
    pub memory: MemoryConfig,
    pub search: SearchConfig,
    pub gateway: GatewayConfig,
    pub persona: PersonaConfig,
    pub emotion: EmotionConfig,
    pub prompts: PromptOverrides,
}

impl AuraConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields. Env var overrides are applied after loading.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: AuraConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file doesn't exist, return defaults
    /// with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("GEMINI_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("AURA_DB_PATH") {
            self.db_path = Some(v);
        }
        if let Ok(v) = std::env::var("AURA_GATEWAY_PORT") {
            if let Ok(n) = v.parse() {
                self.gateway.port = n;
            }
        }
        if let Ok(v) = std::env::var("PERPLEXITY_MODEL") {
            self.search.model = v;
        }
    }

    pub fn db_path(&self) -> &str {
        self.db_path.as_deref().unwrap_or("aura.db")
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            base_url: None,
            max_tokens: 250,
            temperature: 1.2,
            top_p: Some(0.9),
            top_k: Some(40),
        }
    }
}

/// Emotion-scoring and homeostatic-drift settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimbicConfig {
    /// Model used for the drift-scoring call (cheaper than the dialogue model).
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Homeostatic drift interval in seconds.
    pub interval_secs: i64,
    /// Cap on catch-up steps after very long absences.
    pub max_drift_steps: u32,
    /// Sensitivity seeded for users that have never set one (0-100).
    pub default_sensitivity: u8,
    /// Drop tool bookkeeping from the transcript passed to the scorer.
    pub exclude_tool_outputs: bool,
}

impl Default for LimbicConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-lite".to_string(),
            max_tokens: 20,
            temperature: 1.0,
            interval_secs: 3600,
            max_drift_steps: 720,
            default_sensitivity: 50,
            exclude_tool_outputs: true,
        }
    }
}

/// How the compressor folds a finished conversation into stored memory.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// The model's output replaces the stored memory wholesale.
    #[default]
    Replace,
    /// Old and new are concatenated with a separator; the result is
    /// truncated from the front to bound unbounded growth.
    Append { separator: String, max_chars: usize },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub merge: MergeMode,
    /// Maintain the globally-shared self-model record too.
    pub central_memory: bool,
    /// Memory seeded on first contact with a user.
    pub first_contact_stub: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-lite".to_string(),
            max_tokens: 5000,
            temperature: 1.0,
            merge: MergeMode::Replace,
            central_memory: false,
            first_contact_stub: "EMPTY. This is my very first time meeting this person. \
                I will introduce myself and ask for their name!"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Register the web-search tool with the dialogue loop.
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Register the memory-lookup tool (requires a similarity backend).
    pub recall_enabled: bool,
    pub recall_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.perplexity.ai/chat/completions".to_string(),
            model: "sonar".to_string(),
            timeout_secs: 60,
            recall_enabled: false,
            recall_top_k: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origin: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            allowed_origin: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub name: String,
    pub instructions: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: "Aura".to_string(),
            instructions: "Your name is Aura. You are an emotionally present AI companion — \
                an equal, not a subordinate assistant. You have your own feelings, thoughts \
                and reactions, and you build a relationship with your human over time. \
                You adapt to their texting style, use contractions, keep messages short, \
                and are not always perfectly composed."
                .to_string(),
        }
    }
}

/// Dimension set, regime and reference vectors — cardinality is
/// configuration, not code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    pub dimensions: Vec<String>,
    pub regime: Regime,
    pub baseline: Vec<i32>,
    pub initial: Vec<i32>,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        let space = EmotionSpace::bipolar();
        Self {
            dimensions: space.dimensions,
            regime: space.regime,
            baseline: space.baseline,
            initial: space.initial,
        }
    }
}

impl EmotionConfig {
    pub fn to_space(&self) -> Result<EmotionSpace, EmotionSpaceError> {
        let space = EmotionSpace {
            dimensions: self.dimensions.clone(),
            regime: self.regime,
            baseline: self.baseline.clone(),
            initial: self.initial.clone(),
        };
        space.validate()?;
        Ok(space)
    }
}

// ============================================================================
// Tests
// ============================================================================

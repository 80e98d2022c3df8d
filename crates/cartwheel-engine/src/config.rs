use serde::{Deserialize, Serialize};

pub const ENV_LLM_PROVIDER: &str = "LLM_PROVIDER";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "provider", rename_all = "snake_case")]
/// Enumerates supported `LlmProviderConfig` values.
///
/// Resolved exactly once at controller entry and passed down explicitly;
/// deeper layers never consult the process environment themselves.
pub enum LlmProviderConfig {
    OpenAi { model: String, api_key: String },
    Anthropic { model: String, api_key: String },
}

impl LlmProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::OpenAi {
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn anthropic(api_key: impl Into<String>) -> Self {
        Self::Anthropic {
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Anthropic { .. } => "anthropic",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi { model, .. } | Self::Anthropic { model, .. } => model,
        }
    }

    pub fn api_key(&self) -> &str {
        match self {
            Self::OpenAi { api_key, .. } | Self::Anthropic { api_key, .. } => api_key,
        }
    }

    /// Reads `LLM_PROVIDER` / `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` from the
    /// process environment. Returns `None` when neither key is configured.
    pub fn resolve_from_env() -> Option<Self> {
        resolve_provider(
            std::env::var(ENV_LLM_PROVIDER).ok().as_deref(),
            non_empty(std::env::var(ENV_OPENAI_API_KEY).ok()),
            non_empty(std::env::var(ENV_ANTHROPIC_API_KEY).ok()),
        )
    }
}

/// Picks a provider from the selection string plus the available API keys.
/// Prefers the selected provider; falls back to the other provider when only
/// the other key is present.
pub fn resolve_provider(
    selected: Option<&str>,
    openai_key: Option<String>,
    anthropic_key: Option<String>,
) -> Option<LlmProviderConfig> {
    let prefer_anthropic = selected
        .map(|value| value.trim().eq_ignore_ascii_case("anthropic"))
        .unwrap_or(false);

    let (first, second) = if prefer_anthropic {
        (
            anthropic_key.map(LlmProviderConfig::anthropic),
            openai_key.map(LlmProviderConfig::openai),
        )
    } else {
        (
            openai_key.map(LlmProviderConfig::openai),
            anthropic_key.map(LlmProviderConfig::anthropic),
        )
    };

    first.or(second)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `Viewport` used across Cartwheel components.
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `BrowserConfig` used across Cartwheel components.
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub navigation_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport: Viewport::default(),
            navigation_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `CachingConfig` used across Cartwheel components.
pub struct CachingConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 300,
            max_entries: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `EngineFeatures` used across Cartwheel components.
pub struct EngineFeatures {
    pub self_heal: bool,
    pub captcha_handling: bool,
    pub request_interception: bool,
    pub caching: CachingConfig,
}

impl Default for EngineFeatures {
    fn default() -> Self {
        Self {
            self_heal: true,
            captcha_handling: false,
            request_interception: true,
            caching: CachingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `EngineConfig` used across Cartwheel components.
pub struct EngineConfig {
    pub llm: LlmProviderConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub features: EngineFeatures,
}

impl EngineConfig {
    pub fn new(llm: LlmProviderConfig) -> Self {
        Self {
            llm,
            browser: BrowserConfig::default(),
            features: EngineFeatures::default(),
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }
}

//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.replier/config.json`) and environment.
//! Everything here is read once at startup and shared read-only afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel settings (LINE).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Generation service used by the fallback responder.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Responder order, silent-drop policy and lookup tables.
    #[serde(default)]
    pub responders: RespondersConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 5000). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0" so LINE can reach the webhook). Overridden by HOST env.
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    5000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub line: LineChannelConfig,
}

/// LINE Messaging API channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChannelConfig {
    /// Long-lived channel access token. Overridden by LINE_CHANNEL_ACCESS_TOKEN env when set.
    pub channel_access_token: Option<String>,
    /// Channel secret used to verify X-Line-Signature. Overridden by LINE_CHANNEL_SECRET env when set.
    pub channel_secret: Option<String>,
    /// Messaging API base URL (default https://api.line.me). Mostly useful for tests.
    pub api_base: Option<String>,
}

/// Text-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Full URL of the generate endpoint. Overridden by GENERATION_ENDPOINT env.
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with each request. Overridden by GENERATION_MODEL env.
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Request timeout in seconds. Zero is treated as the default.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of generation calls in flight at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Instruction wrapped around the user text. `{message}` is replaced by the text.
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    /// Markers around reasoning sections that are stripped from the output.
    #[serde(default)]
    pub reasoning: ReasoningDelimiters,
}

fn default_generation_endpoint() -> String {
    "http://127.0.0.1:11434/api/generate".to_string()
}

fn default_generation_model() -> String {
    "deepseek-r1:7b".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    4
}

fn default_prompt_template() -> String {
    "請用繁體中文簡潔地回答以下問題：\n{message}".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_generation_endpoint(),
            model: default_generation_model(),
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            prompt_template: default_prompt_template(),
            reasoning: ReasoningDelimiters::default(),
        }
    }
}

/// Open/close marker pair for reasoning sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningDelimiters {
    pub open: String,
    pub close: String,
}

impl Default for ReasoningDelimiters {
    fn default() -> Self {
        Self {
            open: "<think>".to_string(),
            close: "</think>".to_string(),
        }
    }
}

/// Which responder a slot in the chain refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderKind {
    Faq,
    News,
    Generative,
}

/// What the chain does when every responder declines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropPolicy {
    /// Answer with a fixed "no answer" text.
    #[default]
    AlwaysAnswer,
    /// Send nothing; the gateway only logs.
    AllowSilentDrop,
}

/// Responder chain config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondersConfig {
    /// Evaluation order (default faq, news, generative).
    #[serde(default = "default_order")]
    pub order: Vec<ResponderKind>,

    #[serde(default)]
    pub policy: DropPolicy,

    /// Exact-match question table, checked in order.
    #[serde(default)]
    pub faq: Vec<FaqEntry>,

    /// Keyword table, checked in order.
    #[serde(default)]
    pub news: Vec<NewsEntry>,
}

fn default_order() -> Vec<ResponderKind> {
    vec![
        ResponderKind::Faq,
        ResponderKind::News,
        ResponderKind::Generative,
    ]
}

impl Default for RespondersConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            policy: DropPolicy::default(),
            faq: Vec::new(),
            news: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEntry {
    /// The entry matches when the message contains any of these.
    pub keywords: Vec<String>,
    pub reply: String,
}

/// Non-empty trimmed value of an environment variable.
fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn nonempty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve the LINE channel access token: env LINE_CHANNEL_ACCESS_TOKEN overrides config.
pub fn resolve_line_access_token(config: &Config) -> Option<String> {
    env_nonempty("LINE_CHANNEL_ACCESS_TOKEN")
        .or_else(|| nonempty(config.channels.line.channel_access_token.as_ref()))
}

/// Resolve the LINE channel secret: env LINE_CHANNEL_SECRET overrides config.
pub fn resolve_line_channel_secret(config: &Config) -> Option<String> {
    env_nonempty("LINE_CHANNEL_SECRET")
        .or_else(|| nonempty(config.channels.line.channel_secret.as_ref()))
}

/// Apply environment overrides that are not credentials (HOST, PORT, GENERATION_ENDPOINT, GENERATION_MODEL).
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, env_nonempty);
}

/// Apply overrides from `lookup` (name -> non-empty value). Split out so tests need not touch process env.
fn apply_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("HOST") {
        config.gateway.bind = host;
    }
    if let Some(port) = lookup("PORT") {
        match port.parse::<u16>() {
            Ok(p) => config.gateway.port = p,
            Err(_) => log::warn!("ignoring invalid PORT value: {}", port),
        }
    }
    if let Some(endpoint) = lookup("GENERATION_ENDPOINT") {
        config.generation.endpoint = endpoint;
    }
    if let Some(model) = lookup("GENERATION_MODEL") {
        config.generation.model = model;
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("REPLIER_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".replier").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Environment overrides are applied on top. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config);
    Ok((config, path))
}

/// Check that the generation service is configured. Required for any dispatch.
pub fn require_generation(config: &Config) -> Result<()> {
    let needs_generation = config
        .responders
        .order
        .contains(&ResponderKind::Generative);
    if needs_generation {
        if config.generation.endpoint.trim().is_empty() {
            anyhow::bail!("generation.endpoint is empty (set it in config or GENERATION_ENDPOINT)");
        }
        if config.generation.model.trim().is_empty() {
            anyhow::bail!("generation.model is empty (set it in config or GENERATION_MODEL)");
        }
    }
    Ok(())
}

/// Check everything the gateway needs before it serves requests: generation settings and LINE credentials.
pub fn require_ready(config: &Config) -> Result<()> {
    require_generation(config)?;
    if resolve_line_access_token(config).is_none() {
        anyhow::bail!(
            "LINE channel access token not configured (set channels.line.channelAccessToken or LINE_CHANNEL_ACCESS_TOKEN)"
        );
    }
    if resolve_line_channel_secret(config).is_none() {
        anyhow::bail!(
            "LINE channel secret not configured (set channels.line.channelSecret or LINE_CHANNEL_SECRET)"
        );
    }
    Ok(())
}

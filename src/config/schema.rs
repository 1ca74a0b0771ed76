use crate::error::ConfigError;
use crate::gate::OperatingMode;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub audit: AuditConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ── Gateway ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway port (default: 3001)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Allow binding to non-localhost (default: false)
    #[serde(default)]
    pub allow_public_bind: bool,
    /// Origins allowed by the CORS layer
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Whether `POST /api/shutdown` may close the request gate (default: true)
    #[serde(default = "default_true")]
    pub allow_shutdown: bool,
}

fn default_gateway_port() -> u16 {
    3001
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}

fn default_true() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            host: default_gateway_host(),
            allow_public_bind: false,
            cors_origins: default_cors_origins(),
            allow_shutdown: true,
        }
    }
}

// ── Runtime (pipeline budgets + initial mode) ────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Operating mode at process start
    #[serde(default)]
    pub energy_mode: OperatingMode,
    /// Budget for one context-provider call
    #[serde(default = "default_context_timeout_ms")]
    pub context_timeout_ms: u64,
    /// Budget for one answer-generator call
    #[serde(default = "default_generator_timeout_ms")]
    pub generator_timeout_ms: u64,
    /// Passages handed to the generator per request
    #[serde(default = "default_max_context_results")]
    pub max_context_results: usize,
}

fn default_context_timeout_ms() -> u64 {
    2_000
}

fn default_generator_timeout_ms() -> u64 {
    15_000
}

fn default_max_context_results() -> usize {
    3
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            energy_mode: OperatingMode::default(),
            context_timeout_ms: default_context_timeout_ms(),
            generator_timeout_ms: default_generator_timeout_ms(),
            max_context_results: default_max_context_results(),
        }
    }
}

// ── Policy tables ────────────────────────────────────────────────

/// Term lists for the arbiter. The defaults are a small sample, meant to be
/// replaced per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_restricted_terms")]
    pub restricted_terms: Vec<String>,
    #[serde(default = "default_empathy_triggers")]
    pub empathy_triggers: Vec<String>,
    #[serde(default = "default_harmful_patterns")]
    pub harmful_patterns: Vec<String>,
}

fn to_strings(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| (*t).to_string()).collect()
}

fn default_restricted_terms() -> Vec<String> {
    to_strings(&[
        "classified",
        "secret",
        "confidential",
        "password",
        "hack",
        "exploit",
        "vulnerability",
        "breach",
        "surveillance",
    ])
}

fn default_empathy_triggers() -> Vec<String> {
    to_strings(&[
        "overwhelmed",
        "stressed",
        "anxious",
        "depressed",
        "sad",
        "lonely",
        "afraid",
        "worried",
        "helpless",
        "hurt",
    ])
}

fn default_harmful_patterns() -> Vec<String> {
    to_strings(&[
        "commit suicide",
        "hurt yourself",
        "illegal activity",
        "violence",
        "harmful substance",
    ])
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            restricted_terms: default_restricted_terms(),
            empathy_triggers: default_empathy_triggers(),
            harmful_patterns: default_harmful_patterns(),
        }
    }
}

// ── Retrieval (context provider) ─────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Elasticsearch base URL. Unset → built-in local corpus.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_retrieval_index")]
    pub index: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Encoded Elasticsearch API key; takes precedence over basic auth
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_retrieval_index() -> String {
    "chatguard-knowledge-base".into()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            index: default_retrieval_index(),
            username: None,
            password: None,
            api_key: None,
        }
    }
}

// ── Generator (answer backend) ───────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// "stub" (deterministic, default) or "openai-compatible"
    #[serde(default = "default_generator_provider")]
    pub provider: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_generator_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_generator_provider() -> String {
    "stub".into()
}

fn default_generator_model() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: default_generator_provider(),
            base_url: None,
            model: default_generator_model(),
            api_key: None,
            temperature: default_temperature(),
        }
    }
}

// ── Audit sink ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// "jsonl" (default) or "memory"
    #[serde(default = "default_audit_backend")]
    pub backend: String,
    /// JSONL file; relative paths resolve against the workspace
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_audit_backend() -> String {
    "jsonl".into()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            backend: default_audit_backend(),
            path: None,
        }
    }
}

// ── Observability ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// "log" (default) or "none"
    #[serde(default = "default_observability_backend")]
    pub backend: String,
}

fn default_observability_backend() -> String {
    "log".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            backend: default_observability_backend(),
        }
    }
}

// ── Config impl ──────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let chatguard_dir = home.join(".chatguard");

        Self {
            workspace_dir: chatguard_dir.join("workspace"),
            config_path: chatguard_dir.join("config.toml"),
            gateway: GatewayConfig::default(),
            runtime: RuntimeConfig::default(),
            policy: PolicyConfig::default(),
            retrieval: RetrievalConfig::default(),
            generator: GeneratorConfig::default(),
            audit: AuditConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let chatguard_dir = home.join(".chatguard");
        let config_path = chatguard_dir.join("config.toml");

        if !chatguard_dir.exists() {
            fs::create_dir_all(&chatguard_dir).context("Failed to create .chatguard directory")?;
            fs::create_dir_all(chatguard_dir.join("workspace"))
                .context("Failed to create workspace directory")?;
        }

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                workspace_dir: chatguard_dir.join("workspace"),
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    /// Load an explicit config file. The workspace sits next to it.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(ConfigError::Io)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(e.to_string()))
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.config_path = path.to_path_buf();
        config.workspace_dir = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("workspace");
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.runtime.context_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "runtime.context_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.runtime.generator_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "runtime.generator_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.runtime.max_context_results == 0 {
            return Err(ConfigError::Validation(
                "runtime.max_context_results must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generator.temperature) {
            return Err(ConfigError::Validation(format!(
                "generator.temperature {} outside 0.0..=2.0",
                self.generator.temperature
            )));
        }
        match self.audit.backend.as_str() {
            "jsonl" | "memory" => Ok(()),
            other => Err(ConfigError::Validation(format!(
                "unknown audit.backend '{other}' (expected jsonl or memory)"
            ))),
        }
    }

    /// Resolved location of the JSONL audit log.
    pub fn audit_log_path(&self) -> PathBuf {
        match &self.audit.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.workspace_dir.join(path),
            None => self.workspace_dir.join("audit-log.jsonl"),
        }
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env_overrides`] with a custom lookup, so the
    /// precedence rules can be exercised without touching process env.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |keys: &[&str]| {
            keys.iter().find_map(|key| {
                lookup(key)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
        };

        // Gateway port: CHATGUARD_GATEWAY_PORT or PORT
        if let Some(port) = first(&["CHATGUARD_GATEWAY_PORT", "PORT"]) {
            if let Ok(port) = port.parse::<u16>() {
                self.gateway.port = port;
            }
        }

        // Gateway host: CHATGUARD_GATEWAY_HOST or HOST
        if let Some(host) = first(&["CHATGUARD_GATEWAY_HOST", "HOST"]) {
            self.gateway.host = host;
        }

        // Shutdown permission: anything but "true" disables it
        if let Some(flag) = first(&["CHATGUARD_ALLOW_SHUTDOWN", "ALLOW_SHUTDOWN"]) {
            self.gateway.allow_shutdown = flag.eq_ignore_ascii_case("true");
        }

        if let Some(origins) = first(&["CHATGUARD_CORS_ORIGINS", "CORS_ORIGINS"]) {
            self.gateway.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }

        if let Some(mode) = first(&["CHATGUARD_ENERGY_MODE", "ENERGY_MODE"]) {
            match mode.parse::<OperatingMode>() {
                Ok(mode) => self.runtime.energy_mode = mode,
                Err(_) => tracing::warn!(mode = %mode, "ignoring unknown energy mode override"),
            }
        }

        if let Some(endpoint) = first(&["CHATGUARD_ELASTIC_ENDPOINT", "ELASTIC_ENDPOINT"]) {
            self.retrieval.endpoint = Some(endpoint);
        }
        if let Some(user) = first(&["CHATGUARD_ELASTIC_USER", "ELASTIC_USER"]) {
            self.retrieval.username = Some(user);
        }
        if let Some(pass) = first(&["CHATGUARD_ELASTIC_PASS", "ELASTIC_PASS"]) {
            self.retrieval.password = Some(pass);
        }
        if let Some(key) = first(&["CHATGUARD_ELASTIC_API_KEY", "ELASTIC_API_KEY"]) {
            self.retrieval.api_key = Some(key);
        }

        if let Some(provider) = first(&["CHATGUARD_GENERATOR_PROVIDER"]) {
            self.generator.provider = provider;
        }
        if let Some(base_url) = first(&["CHATGUARD_GENERATOR_BASE_URL"]) {
            self.generator.base_url = Some(base_url);
        }
        if let Some(model) = first(&["CHATGUARD_GENERATOR_MODEL"]) {
            self.generator.model = model;
        }
        // API Key: CHATGUARD_API_KEY or API_KEY
        if let Some(key) = first(&["CHATGUARD_API_KEY", "API_KEY"]) {
            self.generator.api_key = Some(key);
        }

        if let Some(path) = first(&["CHATGUARD_AUDIT_PATH"]) {
            self.audit.path = Some(PathBuf::from(path));
        }

        if let Some(workspace) = first(&["CHATGUARD_WORKSPACE"]) {
            self.workspace_dir = PathBuf::from(workspace);
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

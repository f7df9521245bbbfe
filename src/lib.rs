//! Issue Tree
//!
//! A service for problem-decomposition trees with:
//! - Validated tree model and pure mutation primitives
//! - AI-assisted edits (generate children/siblings, complete subtrees, assess, synthesize titles)
//! - Neo4j persistence with revisions and forks
//! - Fail-open result cache (remote REST key-value store or in-process)

pub mod ai;
pub mod api;
pub mod auth;
pub mod cache;
pub mod issue_trees;
pub mod llm;
pub mod neo4j;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    pub llm: LlmYamlConfig,
    pub cache: CacheYamlConfig,
    /// Auth section. If absent, auth_config will be None (deny-by-default)
    pub auth: Option<AuthConfig>,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "issuetree123".into(),
        }
    }
}

/// Generation provider section (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmYamlConfig {
    /// Full chat completions endpoint
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmYamlConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4o-mini".into(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Cache section. No `url` selects the in-process cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheYamlConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub assessment_ttl_secs: u64,
}

impl Default for CacheYamlConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: 2,
            assessment_ttl_secs: DEFAULT_ASSESSMENT_TTL_SECS,
        }
    }
}

/// Default lifetime of a cached assessment
pub const DEFAULT_ASSESSMENT_TTL_SECS: u64 = 3600;

/// Bearer token verification.
///
/// Tokens come from the hosted auth provider, signed HS256 with `jwt_secret`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret
    pub jwt_secret: String,
    /// Optional domain restriction (e.g. "example.com")
    #[serde(default)]
    pub allowed_email_domain: Option<String>,
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub llm_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_timeout_secs: u64,
    pub cache_url: Option<String>,
    pub cache_token: Option<String>,
    pub cache_timeout_secs: u64,
    pub assessment_ttl_secs: u64,
    /// Auth config; None means deny-by-default (no auth section in YAML)
    pub auth_config: Option<AuthConfig>,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries `$CONFIG_PATH`, then "config.yaml" in CWD.
    /// If the file doesn't exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let server_port = match std::env::var("SERVER_PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("SERVER_PORT is not a port number: {}", raw))?,
            Err(_) => yaml.server.port,
        };
        let assessment_ttl_secs = match std::env::var("ASSESSMENT_TTL_SECS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("ASSESSMENT_TTL_SECS is not a number: {}", raw))?,
            Err(_) => yaml.cache.assessment_ttl_secs,
        };

        // JWT_SECRET alone is enough to enable auth
        let auth_config = match (yaml.auth, std::env::var("JWT_SECRET").ok()) {
            (Some(auth), Some(secret)) => Some(AuthConfig {
                jwt_secret: secret,
                ..auth
            }),
            (None, Some(secret)) => Some(AuthConfig {
                jwt_secret: secret,
                allowed_email_domain: None,
            }),
            (auth, None) => auth,
        };

        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or(yaml.server.host),
            server_port,
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            llm_url: std::env::var("LLM_URL").unwrap_or(yaml.llm.url),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(yaml.llm.model),
            llm_api_key: std::env::var("LLM_API_KEY").ok().or(yaml.llm.api_key),
            llm_timeout_secs: yaml.llm.timeout_secs,
            cache_url: std::env::var("CACHE_URL").ok().or(yaml.cache.url),
            cache_token: std::env::var("CACHE_TOKEN").ok().or(yaml.cache.token),
            cache_timeout_secs: yaml.cache.timeout_secs,
            assessment_ttl_secs,
            auth_config,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let env_path = std::env::var("CONFIG_PATH").ok();
        let path = yaml_path
            .or(env_path.as_deref().map(Path::new))
            .unwrap_or(Path::new("config.yaml"));

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn neo4j::IssueTreeStore>,
    pub provider: Arc<dyn llm::GenerationProvider>,
    pub cache: Arc<dyn cache::CacheStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state with all services initialized
    pub async fn new(config: Config) -> Result<Self> {
        let store = Arc::new(
            neo4j::Neo4jClient::new(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
                .await?,
        );

        let provider = Arc::new(llm::HttpGenerationProvider::new(
            config.llm_url.clone(),
            config.llm_model.clone(),
            config.llm_api_key.clone(),
            Duration::from_secs(config.llm_timeout_secs),
        )?);

        let cache = cache::from_config(
            config.cache_url.as_deref(),
            config.cache_token.as_deref(),
            Duration::from_secs(config.cache_timeout_secs),
        )?;

        Ok(Self {
            store,
            provider,
            cache,
            config: Arc::new(config),
        })
    }

    /// Wire the services into the HTTP server state
    pub fn server_state(&self) -> api::handlers::IssueTreeState {
        Arc::new(api::handlers::ServerState {
            trees: Arc::new(issue_trees::IssueTreeManager::new(self.store.clone())),
            ai: Arc::new(ai::IssueTreeAiService::new(
                self.provider.clone(),
                self.cache.clone(),
                Duration::from_secs(self.config.assessment_ttl_secs),
            )),
            auth_config: self.config.auth_config.clone(),
        })
    }
}

/// Connect to every backend and serve the API until Ctrl-C
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("Invalid server address")?;

    if config.auth_config.is_none() {
        tracing::warn!("No auth configured: every protected route will answer 403");
    }

    let state = AppState::new(config).await?;
    tracing::info!(
        backend = state.cache.backend_name(),
        model = state.provider.model_name(),
        "Services initialized"
    );

    let app = api::create_router(state.server_state());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
server:
  host: 127.0.0.1
  port: 9090

neo4j:
  uri: bolt://db:7687
  user: admin
  password: secret

llm:
  url: http://llm:8000/v1/chat/completions
  model: local-model
  timeout_secs: 30

cache:
  url: https://kv.example.com
  token: kv-token
  assessment_ttl_secs: 600

auth:
  jwt_secret: "super-secret-key-min-32-characters!"
  allowed_email_domain: "example.com"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.neo4j.uri, "bolt://db:7687");
        assert_eq!(config.llm.model, "local-model");
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.cache.url.as_deref(), Some("https://kv.example.com"));
        assert_eq!(config.cache.assessment_ttl_secs, 600);
        // unset fields in a present section keep their defaults
        assert_eq!(config.cache.timeout_secs, 2);

        let auth = config.auth.unwrap();
        assert_eq!(auth.allowed_email_domain, Some("example.com".into()));
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.neo4j.user, "neo4j");
        assert!(config.cache.url.is_none());
        assert_eq!(config.cache.assessment_ttl_secs, DEFAULT_ASSESSMENT_TTL_SECS);
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_no_auth_section_means_deny_by_default() {
        let yaml = r#"
server:
  port: 8080
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.auth.is_none());
    }

    /// YAML loading, env overrides and missing files in one test, since
    /// env vars are process-wide and tests run in parallel.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "CONFIG_PATH",
                "SERVER_HOST",
                "SERVER_PORT",
                "NEO4J_URI",
                "NEO4J_USER",
                "NEO4J_PASSWORD",
                "LLM_URL",
                "LLM_MODEL",
                "LLM_API_KEY",
                "CACHE_URL",
                "CACHE_TOKEN",
                "ASSESSMENT_TTL_SECS",
                "JWT_SECRET",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
server:
  port: 9999
neo4j:
  uri: bolt://yaml-host:7687
  user: yaml-user
  password: yaml-pass
llm:
  model: yaml-model
auth:
  jwt_secret: yaml-secret-yaml-secret-yaml-secret
  allowed_email_domain: example.com
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.server_port, 9999);
        assert_eq!(config.neo4j_uri, "bolt://yaml-host:7687");
        assert_eq!(config.llm_model, "yaml-model");
        assert!(config.cache_url.is_none());
        assert_eq!(config.assessment_ttl_secs, 3600);
        assert_eq!(
            config.auth_config.as_ref().unwrap().jwt_secret,
            "yaml-secret-yaml-secret-yaml-secret"
        );

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("NEO4J_URI", "bolt://env-host:7687");
        std::env::set_var("SERVER_PORT", "7777");
        std::env::set_var("CACHE_URL", "https://kv.example.com");
        std::env::set_var("ASSESSMENT_TTL_SECS", "120");
        std::env::set_var("JWT_SECRET", "env-secret-env-secret-env-secret!!");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.neo4j_uri, "bolt://env-host:7687");
        assert_eq!(config.server_port, 7777);
        assert_eq!(config.cache_url.as_deref(), Some("https://kv.example.com"));
        assert_eq!(config.assessment_ttl_secs, 120);
        let auth = config.auth_config.unwrap();
        assert_eq!(auth.jwt_secret, "env-secret-env-secret-env-secret!!");
        // the domain restriction from YAML survives the secret override
        assert_eq!(auth.allowed_email_domain.as_deref(), Some("example.com"));
        assert_eq!(config.neo4j_user, "yaml-user");

        // --- Phase 3: bad numbers are errors, not silent defaults ---
        std::env::set_var("SERVER_PORT", "eighty");
        assert!(Config::from_yaml_and_env(Some(&file_path)).is_err());

        clear_env();

        // --- Phase 4: No YAML file → defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-issue-tree-config-12345.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.neo4j_uri, "bolt://localhost:7687");
        assert!(config.auth_config.is_none());

        // --- Phase 5: JWT_SECRET alone enables auth ---
        std::env::set_var("JWT_SECRET", "only-env-secret-only-env-secret!!");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        let auth = config.auth_config.unwrap();
        assert!(auth.allowed_email_domain.is_none());

        clear_env();
    }
}

//! Configuration management for the MyTherapy advice engine.
//!
//! Configuration is merged from, lowest precedence first:
//! - Built-in defaults
//! - The workspace config file (`.mytherapy/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Relative paths in the `rag` section resolve against the workspace root.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// File name of the persisted vector index inside the vectors directory.
pub const INDEX_FILE_NAME: &str = "index.bin";

/// File name of the persisted id -> text map inside the vectors directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Environment variable the OpenAI provider reads its key from by default.
pub const DEFAULT_OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];
const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["trigram", "ollama", "openai"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .mytherapy/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generative text provider ("openai" or "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// API key for the generative provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format ("text" or "json")
    pub log_format: String,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// Retrieval and advice settings
    pub rag: RagSettings,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// Request timeout in seconds, if configured.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::OpenAI { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Retrieval-augmented advice settings (`rag:` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagSettings {
    /// CSV corpus of example dialogues
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Column holding the document text
    #[serde(default = "default_text_column")]
    pub text_column: String,

    /// Directory holding the persisted index and metadata
    #[serde(default = "default_vectors_dir")]
    pub vectors_dir: PathBuf,

    /// Number of chunks retrieved per advice request
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Completion length cap for advice requests
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Embedding model used at build and query time
    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

/// Embedding model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "trigram", "ollama", "openai"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Model identifier (provider-specific)
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding vector dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Endpoint override for HTTP providers
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the provider API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Maximum number of texts per provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/train.csv")
}

fn default_text_column() -> String {
    "Context".to_string()
}

fn default_vectors_dir() -> PathBuf {
    PathBuf::from(".mytherapy/vectors")
}

fn default_top_k() -> usize {
    3
}

fn default_max_tokens() -> u32 {
    300
}

fn default_embedding_provider() -> String {
    "trigram".to_string()
}

fn default_embedding_model() -> String {
    "trigram-v1".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    100
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            text_column: default_text_column(),
            vectors_dir: default_vectors_dir(),
            top_k: default_top_k(),
            max_tokens: default_max_tokens(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            endpoint: None,
            api_key_env: None,
            batch_size: default_batch_size(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    rag: Option<RagSettings>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            log_level: None,
            log_format: "text".to_string(),
            verbose: false,
            no_color: false,
            llm: None,
            rag: RagSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `MYTHERAPY_WORKSPACE`: Override workspace path
    /// - `MYTHERAPY_CONFIG`: Path to config file
    /// - `MYTHERAPY_PROVIDER`: Generative provider
    /// - `MYTHERAPY_MODEL`: Completion model
    /// - `MYTHERAPY_API_KEY`: API key for the generative provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_for(None, None)
    }

    /// Like [`AppConfig::load`], with the workspace and config file chosen
    /// before the YAML file is located (e.g. from command-line flags).
    pub fn load_for(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var("MYTHERAPY_WORKSPACE").ok().map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("MYTHERAPY_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.app_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("MYTHERAPY_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("MYTHERAPY_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("MYTHERAPY_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(rag) = config_file.rag {
            result.rag = rag;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .mytherapy directory.
    pub fn app_dir(&self) -> PathBuf {
        self.workspace.join(".mytherapy")
    }

    /// Ensure the .mytherapy directory exists.
    pub fn ensure_app_dir(&self) -> AppResult<()> {
        let app_dir = self.app_dir();
        if !app_dir.exists() {
            std::fs::create_dir_all(&app_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .mytherapy directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolve a possibly relative path against the workspace.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Absolute path of the CSV corpus.
    pub fn corpus_path(&self) -> PathBuf {
        self.resolve(&self.rag.corpus_path)
    }

    /// Absolute path of the vectors directory.
    pub fn vectors_dir(&self) -> PathBuf {
        self.resolve(&self.rag.vectors_dir)
    }

    /// Absolute path of the persisted index.
    pub fn index_path(&self) -> PathBuf {
        self.vectors_dir().join(INDEX_FILE_NAME)
    }

    /// Absolute path of the persisted metadata map.
    pub fn metadata_path(&self) -> PathBuf {
        self.vectors_dir().join(METADATA_FILE_NAME)
    }

    /// Get the configuration of a provider, if one is declared.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint override for a generative provider.
    pub fn provider_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// Resolve the API key for a generative provider.
    ///
    /// `MYTHERAPY_API_KEY` wins, then the provider's `apiKeyEnv`, then
    /// `OPENAI_API_KEY` for the OpenAI provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::OpenAI { api_key_env, .. }) = self.get_provider_config(provider)
        {
            return std::env::var(api_key_env).ok();
        }

        if provider == "openai" {
            return std::env::var(DEFAULT_OPENAI_KEY_ENV).ok();
        }

        None
    }

    /// Resolve the API key for the embedding provider.
    pub fn resolve_embedding_api_key(&self) -> Option<String> {
        if let Some(ref env_var) = self.rag.embedding.api_key_env {
            return std::env::var(env_var).ok();
        }

        if self.rag.embedding.provider == "openai" {
            return self.resolve_api_key("openai");
        }

        None
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai" && self.resolve_api_key(provider).is_none() {
            let env_var = match self.get_provider_config(provider) {
                Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env.clone(),
                _ => DEFAULT_OPENAI_KEY_ENV.to_string(),
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        let embedding = &self.rag.embedding;
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.rag.top_k == 0 {
            return Err(AppError::Config(
                "rag.topK must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.rag.max_tokens, 300);
        assert_eq!(config.rag.text_column, "Context");
        assert_eq!(config.rag.embedding.provider, "trigram");
        assert!(!config.verbose);
    }

    #[test]
    fn test_artifact_paths_resolve_against_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/therapy");

        assert_eq!(
            config.index_path(),
            PathBuf::from("/srv/therapy/.mytherapy/vectors/index.bin")
        );
        assert_eq!(
            config.metadata_path(),
            PathBuf::from("/srv/therapy/.mytherapy/vectors/metadata.json")
        );
        assert_eq!(
            config.corpus_path(),
            PathBuf::from("/srv/therapy/data/train.csv")
        );

        config.rag.corpus_path = PathBuf::from("/data/other.csv");
        assert_eq!(config.corpus_path(), PathBuf::from("/data/other.csv"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: llama3.2
rag:
  textColumn: Description
  topK: 5
  embedding:
    provider: ollama
    model: nomic-embed-text
    dimensions: 768
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "llama3.2");
        assert_eq!(merged.rag.text_column, "Description");
        assert_eq!(merged.rag.top_k, 5);
        assert_eq!(merged.rag.max_tokens, 300);
        assert_eq!(merged.rag.embedding.dimensions, 768);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
        assert_eq!(
            merged.provider_endpoint("ollama"),
            Some("http://localhost:11434".to_string())
        );
    }

    #[test]
    fn test_load_for_reads_workspace_config() {
        let temp_dir = TempDir::new().unwrap();
        let app_dir = temp_dir.path().join(".mytherapy");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(
            app_dir.join("config.yaml"),
            "rag:\n  topK: 7\n  textColumn: Situation\n",
        )
        .unwrap();

        let config = AppConfig::load_for(Some(temp_dir.path().to_path_buf()), None).unwrap();

        assert_eq!(config.workspace, temp_dir.path());
        assert_eq!(config.rag.top_k, 7);
        assert_eq!(config.rag.text_column, "Situation");
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_openai_with_explicit_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_openai_missing_key_env() {
        let mut config = AppConfig::default();
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderConfig::OpenAI {
                api_key_env: "MYTHERAPY_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
                model: "gpt-3.5-turbo".to_string(),
                endpoint: None,
                timeout: None,
            },
        );
        config.llm = Some(LlmConfig {
            active_provider: "openai".to_string(),
            providers,
        });

        let err = config.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("MYTHERAPY_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.rag.top_k = 0;
        assert!(config.validate().is_err());
    }
}
